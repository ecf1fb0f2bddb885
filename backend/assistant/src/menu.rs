//! Buttons of the `/ia` menu and their callback payloads.

use std::str::FromStr;

use cafetal_core::Button;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Consulta,
    Analisis,
    Recomendacion,
    Precios,
    Cancelar,
}

impl MenuChoice {
    /// Menu order, top to bottom.
    pub const ALL: [MenuChoice; 5] = [
        MenuChoice::Consulta,
        MenuChoice::Analisis,
        MenuChoice::Recomendacion,
        MenuChoice::Precios,
        MenuChoice::Cancelar,
    ];

    pub fn callback_data(&self) -> &'static str {
        match self {
            MenuChoice::Consulta => "ia_consulta",
            MenuChoice::Analisis => "ia_analisis",
            MenuChoice::Recomendacion => "ia_recomendacion",
            MenuChoice::Precios => "ia_precios",
            MenuChoice::Cancelar => "ia_cancelar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Consulta => "💬 Consulta IA",
            MenuChoice::Analisis => "📊 Análisis de datos",
            MenuChoice::Recomendacion => "☕ Recomendación de café",
            MenuChoice::Precios => "💰 Optimización de precios",
            MenuChoice::Cancelar => "❌ Cancelar",
        }
    }

    pub fn button(&self) -> Button {
        Button::new(self.label(), self.callback_data())
    }

    pub fn main_menu() -> Vec<Button> {
        Self::ALL.iter().map(MenuChoice::button).collect()
    }
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.callback_data() == data)
            .ok_or_else(|| format!("unknown menu callback: {data}"))
    }
}
