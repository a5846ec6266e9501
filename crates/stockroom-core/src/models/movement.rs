use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NamedRef;

/// A recorded stock movement (entry or exit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRow {
    pub id: i64,
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "produtos", default)]
    pub products: Vec<NamedRef>,
    /// Name of the user who recorded the movement
    #[serde(rename = "usuario")]
    pub user: String,
}

impl MovementRow {
    pub fn product_names(&self) -> String {
        self.products
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFilters {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateMovementRequest {
    #[serde(rename = "data")]
    pub date: DateTime<Utc>,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "produtoId")]
    pub product_id: i64,
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
}
