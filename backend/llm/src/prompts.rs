//! Personas, temperatures, and prompt templates for each assistant use case.

use cafetal_core::{AnalysisPayload, PricingProduct};
use serde::Serialize;
use serde_json::json;

/// Business context attached to every coffee recommendation request.
pub const RECOMMENDATION_CONTEXT: &str =
    "Negocio de café buscando recomendaciones para ofrecer a clientes";

/// What the operator asked the assistant to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    /// Free question to a coffee-industry expert.
    Question,
    /// Trends and improvements over recent ledger rows.
    Analysis,
    /// Barista/taster recommendation from stated preferences.
    Recommendation,
    /// Price optimization returning structured JSON.
    Pricing,
}

impl UseCase {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            UseCase::Question => {
                "Eres un experto en la industria del café con conocimientos profundos sobre \
                 cultivo, procesamiento, tostado, preparación y comercialización de café. \
                 Proporciona respuestas detalladas, precisas y orientadas a la práctica. \
                 Incluye referencias a mejores prácticas de la industria cuando sea relevante."
            }
            UseCase::Analysis => {
                "Eres un experto en la industria del café que analiza datos de operaciones de café. \
                 Proporciona información valiosa y recomendaciones basadas en los datos proporcionados. \
                 Enfócate en identificar tendencias, áreas de mejora y oportunidades de optimización."
            }
            UseCase::Recommendation => {
                "Eres un barista experto y catador de café. Tu trabajo es recomendar tipos de café, \
                 métodos de procesamiento y preparación basados en las preferencias del usuario. \
                 Sé específico y detallado en tus recomendaciones."
            }
            UseCase::Pricing => {
                "Eres un analista de datos especializado en la optimización de precios para productos \
                 de café. Tu objetivo es maximizar la rentabilidad manteniendo precios competitivos. \
                 Proporciona recomendaciones específicas con valores numéricos precisos."
            }
        }
    }

    /// Sampling temperature; pricing runs coldest to keep the JSON stable.
    pub fn temperature(&self) -> f32 {
        match self {
            UseCase::Question => 0.7,
            UseCase::Analysis => 0.3,
            UseCase::Recommendation => 0.6,
            UseCase::Pricing => 0.2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UseCase::Question => "question",
            UseCase::Analysis => "analysis",
            UseCase::Recommendation => "recommendation",
            UseCase::Pricing => "pricing",
        }
    }
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn analysis_prompt(payload: &AnalysisPayload) -> String {
    format!(
        "Por favor, analiza los siguientes datos de operaciones de café:\n\
         {}\n\n\
         Proporciona:\n\
         1. Un resumen de los principales hallazgos\n\
         2. Tendencias identificadas\n\
         3. Áreas de mejora\n\
         4. Recomendaciones específicas",
        pretty_json(payload)
    )
}

pub fn recommendation_prompt(preferences: &str) -> String {
    let wrapped = json!({
        "preferencias_usuario": preferences,
        "contexto": RECOMMENDATION_CONTEXT,
    });
    format!(
        "Con base en las siguientes preferencias de café:\n\
         {}\n\n\
         Por favor, recomienda:\n\
         1. Los tipos de café más adecuados\n\
         2. Métodos de procesamiento recomendados\n\
         3. Sugerencias para la preparación\n\
         4. Posibles maridajes",
        pretty_json(&wrapped)
    )
}

pub fn pricing_prompt(products: &[PricingProduct]) -> String {
    let wrapped = json!({ "productos": products });
    format!(
        "Analiza los siguientes datos de precios y costos de café:\n\
         {}\n\n\
         Proporciona recomendaciones detalladas de precios optimizados para cada tipo de café \
         y presentación. Incluye el precio recomendado y la justificación para cada uno.\n\
         Devuelve tus recomendaciones en formato JSON con la estructura: \
         {{\"producto\": \"nombre\", \"precio_actual\": x, \"precio_recomendado\": y, \"justificacion\": \"razón\"}}",
        pretty_json(&wrapped)
    )
}
