//! Data models for stockroom inventory entities.
//!
//! The remote API speaks a mix of Portuguese and English field names;
//! the serde renames here keep the Rust side in English:
//!
//! - `User`, `AccessType`: console accounts and their privilege tier
//! - `Product`, `ProductRow`, `Category`: catalog entries
//! - `Supplier`: vendors supplying batches
//! - `BatchRow`, `BatchDetail`: received stock with validity dates
//! - `MovementRow`: stock entering or leaving
//! - Dashboard aggregates: `TotalProducts`, `ExpiringBatches`, `LowStock`, ...

pub mod batch;
pub mod dashboard;
pub mod movement;
pub mod product;
pub mod supplier;
pub mod user;

use serde::{Deserialize, Serialize};

pub use batch::{BatchDetail, BatchFilters, BatchItem, BatchLine, BatchRow, CreateBatchRequest};
pub use dashboard::{
    ExpiringBatch, ExpiringBatches, ExpiringProduct, ExpiringRow, LowStock, LowStockEntry,
    StockSummary, TotalAmount, TotalProducts,
};
pub use movement::{CreateMovementRequest, MovementFilters, MovementRow};
pub use product::{
    Category, CreateProductRequest, Product, ProductFilters, ProductRow, UpdateProductRequest,
};
pub use supplier::{CreateSupplierRequest, Supplier, SupplierFilters, UpdateSupplierRequest};
pub use user::{AccessType, CreateUserRequest, Section, UpdateUserRequest, User, UserFilters};

/// One page of a paginated listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn is_last(&self) -> bool {
        self.current_page >= self.total_pages
    }

    /// "Page 2 of 5 (42 total)"
    pub fn summary(&self) -> String {
        format!(
            "Page {} of {} ({} total)",
            self.current_page,
            self.total_pages.max(1),
            self.total
        )
    }
}

/// A `{id, nome}` reference embedded in other records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let json = r#"{"data":[{"id":1,"nome":"Arroz"}],"total":11,"totalPages":2,"currentPage":1,"pageSize":10}"#;
        let page: Page<NamedRef> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data[0].name, "Arroz");
        assert!(!page.is_last());
        assert_eq!(page.summary(), "Page 1 of 2 (11 total)");
    }

    #[test]
    fn test_empty_page_summary() {
        let page: Page<NamedRef> = Page {
            data: vec![],
            total: 0,
            total_pages: 0,
            current_page: 1,
            page_size: 10,
        };
        assert!(page.is_last());
        assert_eq!(page.summary(), "Page 1 of 1 (0 total)");
    }
}
