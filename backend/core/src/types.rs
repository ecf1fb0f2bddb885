use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One ledger row: column name → cell value, in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The four ledgers the business keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Cherry/parchment purchases.
    Compras,
    /// Processing steps (drying, hulling, roasting).
    Procesos,
    Ventas,
    Gastos,
}

impl Dataset {
    /// Order in which datasets are fetched and presented to the model.
    pub const ALL: [Dataset; 4] = [
        Dataset::Compras,
        Dataset::Procesos,
        Dataset::Ventas,
        Dataset::Gastos,
    ];

    /// Key used in the analysis payload.
    pub fn key(&self) -> &'static str {
        match self {
            Dataset::Compras => "compras",
            Dataset::Procesos => "procesos",
            Dataset::Ventas => "ventas",
            Dataset::Gastos => "gastos",
        }
    }

    /// File name of the ledger inside the data directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Dataset::Compras => "compras.csv",
            Dataset::Procesos => "proceso.csv",
            Dataset::Ventas => "ventas.csv",
            Dataset::Gastos => "gastos.csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Bounded snapshot of recent ledger rows sent to the model for analysis.
///
/// Field order is the order the model sees the datasets in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisPayload {
    pub compras: Vec<Record>,
    pub procesos: Vec<Record>,
    pub ventas: Vec<Record>,
    pub gastos: Vec<Record>,
}

impl AnalysisPayload {
    pub fn get(&self, dataset: Dataset) -> &[Record] {
        match dataset {
            Dataset::Compras => &self.compras,
            Dataset::Procesos => &self.procesos,
            Dataset::Ventas => &self.ventas,
            Dataset::Gastos => &self.gastos,
        }
    }

    pub fn set(&mut self, dataset: Dataset, records: Vec<Record>) {
        match dataset {
            Dataset::Compras => self.compras = records,
            Dataset::Procesos => self.procesos = records,
            Dataset::Ventas => self.ventas = records,
            Dataset::Gastos => self.gastos = records,
        }
    }

    pub fn total_records(&self) -> usize {
        Dataset::ALL.iter().map(|d| self.get(*d).len()).sum()
    }
}

/// A product the operator wants priced, as parsed from chat text.
///
/// Serialized with the field names the pricing prompt uses; unset numbers are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingProduct {
    #[serde(rename = "producto")]
    pub name: String,
    #[serde(rename = "precio_actual", skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(rename = "costo", skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(rename = "margen", skip_serializing_if = "Option::is_none")]
    pub desired_margin_pct: Option<f64>,
}

/// A price the model suggests for one product.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PricingRecommendation {
    #[serde(rename = "producto", default, deserialize_with = "lenient_text")]
    pub product: Option<String>,
    #[serde(rename = "precio_actual", default)]
    pub current_price: Option<Amount>,
    #[serde(rename = "precio_recomendado", default)]
    pub recommended_price: Option<Amount>,
    #[serde(rename = "justificacion", default, deserialize_with = "lenient_text")]
    pub justification: Option<String>,
}

/// Text fields the model sometimes fills with a number or a list; kept as written.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A money value as the model wrote it: usually a number, sometimes a string like "125.50".
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{}", n),
            Amount::Text(s) => f.write_str(s),
        }
    }
}
