use thiserror::Error;

use crate::types::Dataset;

/// Failures the assistant can hit while serving one chat event.
///
/// The `Display` text is shown to the operator inside the chat reply, so it
/// always carries the underlying detail.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("el servicio de IA no está disponible: {0}")]
    ModelUnavailable(String),

    #[error("la respuesta del modelo no tiene un JSON válido ({reason})")]
    MalformedModelOutput { reason: String, raw: String },

    #[error("no se pudieron leer los datos de {dataset}: {message}")]
    DataUnavailable { dataset: Dataset, message: String },

    #[error("No se pudieron extraer datos de productos del texto proporcionado")]
    NoProductsFound,

    #[error("configuración faltante: {0}")]
    ConfigurationMissing(String),
}

impl AssistantError {
    /// Raw model text for `MalformedModelOutput`, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AssistantError::MalformedModelOutput { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
