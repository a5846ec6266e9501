use serde::{Deserialize, Serialize};

use super::NamedRef;

/// Product category
pub type Category = NamedRef;

/// A product as returned by the detail and by-supplier endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    /// Unit price in cents
    #[serde(rename = "precoUnitario")]
    pub unit_price: i64,
    #[serde(rename = "categoriaId")]
    pub category_id: i64,
}

/// A row of the paginated product listing, with its category embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "precoUnitario")]
    pub unit_price: i64,
    #[serde(rename = "Categoria")]
    pub category: Option<Category>,
}

impl ProductRow {
    pub fn category_name(&self) -> &str {
        self.category.as_ref().map(|c| c.name.as_str()).unwrap_or("-")
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilters {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    /// Unit price in cents
    pub unit_price: i64,
    pub category_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateProductRequest {
    pub id: i64,
    #[serde(flatten)]
    pub product: CreateProductRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_row() {
        let json = r#"{"id":3,"nome":"Feijão","descricao":"1kg","precoUnitario":899,"Categoria":{"id":2,"nome":"Grãos"}}"#;
        let row: ProductRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.name, "Feijão");
        assert_eq!(row.unit_price, 899);
        assert_eq!(row.category_name(), "Grãos");
    }

    #[test]
    fn test_product_row_without_category() {
        let json = r#"{"id":3,"nome":"Sal","descricao":"","precoUnitario":199}"#;
        let row: ProductRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.category_name(), "-");
    }

    #[test]
    fn test_create_request_wire_names() {
        let req = CreateProductRequest {
            name: "Sal".to_string(),
            description: "1kg".to_string(),
            unit_price: 199,
            category_id: 5,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["unitPrice"], 199);
        assert_eq!(json["categoryId"], 5);
    }
}
