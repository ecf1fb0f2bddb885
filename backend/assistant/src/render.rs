//! Chat texts of the assistant conversation.

use cafetal_core::{Amount, AssistantError, Button, PricingRecommendation};

use crate::menu::MenuChoice;

pub const NOT_CONFIGURED: &str = "⚠️ La integración con OpenAI no está configurada. \
     Por favor configura OPENAI_API_KEY en las variables de entorno.";

pub const MENU: &str =
    "🤖 *Asistente de IA para café*\n\nSelecciona una opción para utilizar las capacidades de IA:";

pub const CANCELLED: &str = "Operación cancelada.";

pub const QUESTION_PROMPT: &str = "💬 *Consulta de IA*\n\n\
     Escribe tu pregunta sobre café, procesamiento, ventas o cualquier \
     tema relacionado con la industria del café:";

pub const ANALYSIS_IN_PROGRESS: &str = "📊 *Análisis de datos*\n\nEstoy analizando tus datos de café...";

pub const PREFERENCES_PROMPT: &str = "☕ *Recomendación de café*\n\n\
     Para ayudarte con una recomendación personalizada, por favor describe \
     tus preferencias de café. Puedes incluir:\n\
     - Nivel de acidez preferido\n\
     - Intensidad deseada\n\
     - Notas de sabor favoritas\n\
     - Método de preparación\n\
     - Cualquier otra preferencia relevante";

pub const PRICING_PROMPT: &str = "💰 *Optimización de precios*\n\n\
     Para ayudarte a optimizar tus precios, necesito información sobre \
     tus productos de café y sus precios actuales. Por favor, proporciona \
     los detalles en formato de lista:\n\n\
     Producto: [nombre]\n\
     Precio actual: [precio]\n\
     Costo: [costo]\n\
     Margen deseado: [porcentaje]\n\n\
     Repite este formato para cada producto.";

pub const QUESTION_PROCESSING: &str = "🤔 Procesando tu consulta...";
pub const PREFERENCES_PROCESSING: &str = "☕ Analizando tus preferencias...";
pub const PRICING_PROCESSING: &str = "💰 Analizando datos de precios...";

pub const FOLLOW_UP: &str = "¿Deseas hacer otra consulta?";

pub fn follow_up_buttons() -> Vec<Button> {
    vec![
        Button::new("Nueva consulta", MenuChoice::Consulta.callback_data()),
        Button::new("Terminar", MenuChoice::Cancelar.callback_data()),
    ]
}

pub fn answer(text: &str) -> String {
    format!("☕ *Respuesta:*\n\n{text}")
}

pub fn analysis(text: &str) -> String {
    format!("📊 *Análisis de datos*\n\n{text}")
}

pub fn recommendations(text: &str) -> String {
    format!("☕ *Recomendaciones personalizadas:*\n\n{text}")
}

pub fn analysis_error(err: &AssistantError) -> String {
    format!("Lo siento, ocurrió un error al analizar los datos: {err}")
}

pub fn pricing_error(err: &AssistantError) -> String {
    format!(
        "Lo siento, ocurrió un error al procesar los datos de precios: {err}\n\n\
         Por favor, asegúrate de seguir el formato especificado."
    )
}

/// One block per recommendation; absent fields show a placeholder.
pub fn pricing(recommendations: &[PricingRecommendation]) -> String {
    let mut out = String::from("💰 *Precios optimizados recomendados:*\n\n");
    for rec in recommendations {
        let or_na = |amount: &Option<Amount>| {
            amount
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "N/A".to_string())
        };
        out.push_str(&format!(
            "*{}*\n📈 Precio actual: ${}\n✅ Precio recomendado: ${}\n📝 Justificación: {}\n\n",
            rec.product.as_deref().unwrap_or("Producto"),
            or_na(&rec.current_price),
            or_na(&rec.recommended_price),
            rec.justification.as_deref().unwrap_or("No disponible"),
        ));
    }
    out.trim_end().to_string()
}
