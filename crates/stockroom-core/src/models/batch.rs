use serde::{Deserialize, Serialize};

use super::NamedRef;

/// A row of the paginated batch listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    pub id: i64,
    /// Total price in cents
    #[serde(rename = "preco")]
    pub price: i64,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    /// ISO timestamp
    #[serde(rename = "validade")]
    pub validity: String,
    #[serde(rename = "fornecedor")]
    pub supplier: NamedRef,
}

/// A single batch with the products it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDetail {
    pub id: i64,
    #[serde(rename = "preco")]
    pub price: i64,
    #[serde(rename = "validade")]
    pub validity: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "produtos", default)]
    pub products: Vec<BatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFilters {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub validity: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    /// Total price in cents
    pub price: i64,
    pub quantity: i64,
    /// ISO timestamp
    pub validity: String,
    pub supplier_id: i64,
    pub products: Vec<BatchLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchLine {
    pub id: i64,
    #[serde(rename = "quantidade")]
    pub quantity: i64,
}

impl CreateBatchRequest {
    /// Build a batch from `(product id, quantity, unit price in cents)` lines,
    /// totalling quantity and price.
    pub fn from_lines(supplier_id: i64, validity: String, lines: &[(i64, i64, i64)]) -> Self {
        let quantity = lines.iter().map(|(_, qty, _)| qty).sum();
        let price = lines.iter().map(|(_, qty, unit)| qty * unit).sum();
        Self {
            price,
            quantity,
            validity,
            supplier_id,
            products: lines
                .iter()
                .map(|&(id, quantity, _)| BatchLine { id, quantity })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch_detail() {
        let json = r#"{"id":9,"preco":12000,"validade":"2026-12-01T00:00:00.000Z","quantidade":30,"fornecedor":"Atacado Sul","produtos":[{"nome":"Arroz","quantidade":20},{"nome":"Feijão","quantidade":10}]}"#;
        let batch: BatchDetail = serde_json::from_str(json).unwrap();
        assert_eq!(batch.supplier, "Atacado Sul");
        assert_eq!(batch.products.len(), 2);
        assert_eq!(batch.products[1].quantity, 10);
    }

    #[test]
    fn test_batch_from_lines_totals() {
        let req = CreateBatchRequest::from_lines(
            4,
            "2026-12-01T00:00:00.000Z".to_string(),
            &[(1, 10, 250), (2, 5, 1000)],
        );
        assert_eq!(req.quantity, 15);
        assert_eq!(req.price, 7500);

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["supplierId"], 4);
        assert_eq!(json["products"][1]["quantidade"], 5);
    }
}
