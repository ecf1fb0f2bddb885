//! Telegram Bot Commands
//!
//! The command list registered with Telegram and the fixed replies for
//! `/start` and `/ayuda`.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Comandos disponibles:")]
pub enum Command {
    #[command(description = "Mensaje de bienvenida")]
    Start,
    #[command(description = "Ver los comandos disponibles")]
    Ayuda,
    #[command(description = "Ver los comandos disponibles")]
    Help,
    #[command(description = "Usar el asistente inteligente con OpenAI")]
    Ia,
    #[command(description = "Cancelar la conversación con el asistente")]
    Cancelar,
}

pub fn welcome_text(first_name: &str) -> String {
    format!(
        "¡Hola {first_name}! 👋\n\n\
         Bienvenido al Bot de Gestión de Café con IA ☕\n\n\
         Este bot te ayudará a gestionar tu negocio de café, desde la compra \
         de café en cereza hasta su venta final, con análisis inteligente de datos.\n\n\
         Usa /ayuda para ver los comandos disponibles."
    )
}

pub const HELP_TEXT: &str = "🤖 *Comandos disponibles* 🤖\n\n\
     */ia* - Usar asistente inteligente con OpenAI\n\
     */cancelar* - Cancelar la conversación con el asistente\n\
     */ayuda* - Ver esta ayuda\n\n\
     Para más información, consulta la documentación completa.";
