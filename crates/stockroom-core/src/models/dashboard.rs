use serde::{Deserialize, Serialize};

use super::NamedRef;

/// Expiring-batch lookahead used when none is given, in days
pub const DEFAULT_EXPIRING_LIMIT_DAYS: u32 = 15;

/// Low-stock cutoff used when none is given, in units
pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalProducts {
    pub total_products: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalAmount {
    /// Stock value in cents
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringBatches {
    pub total: i64,
    #[serde(default)]
    pub batches: Vec<ExpiringBatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringBatch {
    pub id: i64,
    #[serde(rename = "validade")]
    pub validity: String,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "produtos", default)]
    pub products: Vec<ExpiringProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringProduct {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
}

/// One product line of an expiring batch, flattened for display
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiringRow {
    pub product_id: i64,
    pub product_name: String,
    pub batch_id: i64,
    pub validity: String,
    pub quantity: i64,
    pub supplier: String,
}

impl ExpiringBatches {
    /// One row per product per batch, in batch order
    pub fn flatten(&self) -> Vec<ExpiringRow> {
        self.batches
            .iter()
            .flat_map(|batch| {
                batch.products.iter().map(move |product| ExpiringRow {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    batch_id: batch.id,
                    validity: batch.validity.clone(),
                    quantity: product.quantity,
                    supplier: batch.supplier.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStock {
    #[serde(default)]
    pub products: Vec<LowStockEntry>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LowStockEntry {
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "produto")]
    pub product: NamedRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSummary {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "totalQuantidade")]
    pub total_quantity: i64,
    #[serde(rename = "precoUnitarioCentavos")]
    pub unit_price_cents: i64,
    #[serde(rename = "totalValorCentavos")]
    pub total_value_cents: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_expiring_batches() {
        let json = r#"{"total":2,"batches":[
            {"id":1,"validade":"2026-10-20","fornecedor":"A","produtos":[{"id":10,"nome":"Leite","quantidade":4},{"id":11,"nome":"Queijo","quantidade":2}]},
            {"id":2,"validade":"2026-10-22","fornecedor":"B","produtos":[{"id":12,"nome":"Iogurte","quantidade":8}]}
        ]}"#;
        let expiring: ExpiringBatches = serde_json::from_str(json).unwrap();
        let rows = expiring.flatten();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].product_name, "Leite");
        assert_eq!(rows[1].batch_id, 1);
        assert_eq!(rows[2].supplier, "B");
        assert_eq!(rows[2].validity, "2026-10-22");
    }

    #[test]
    fn test_parse_low_stock() {
        let json = r#"{"products":[{"quantidade":3,"produto":{"id":5,"nome":"Café"}}],"total":1}"#;
        let low: LowStock = serde_json::from_str(json).unwrap();
        assert_eq!(low.products[0].product.name, "Café");
        assert_eq!(low.products[0].quantity, 3);
    }
}
