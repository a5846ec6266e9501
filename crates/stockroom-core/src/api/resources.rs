//! Typed wrappers over the gateway, one per remote endpoint.

use serde::{Deserialize, Serialize};

use crate::models::dashboard::{DEFAULT_EXPIRING_LIMIT_DAYS, DEFAULT_LOW_STOCK_THRESHOLD};
use crate::models::{
    BatchDetail, BatchFilters, BatchRow, Category, CreateBatchRequest, CreateMovementRequest,
    CreateProductRequest, CreateSupplierRequest, CreateUserRequest, ExpiringBatches, LowStock,
    MovementFilters, MovementRow, Page, Product, ProductFilters, ProductRow, StockSummary,
    Supplier, SupplierFilters, TotalAmount, TotalProducts, UpdateProductRequest,
    UpdateSupplierRequest, UpdateUserRequest, User, UserFilters,
};
use crate::utils::build_query;

use super::{ApiClient, ApiError};

const USERS: &str = "users";
const PRODUCTS: &str = "products";
const SUPPLIERS: &str = "suppliers";
const BATCHES: &str = "batches";
const MOVEMENTS: &str = "movement";
const CATEGORIES: &str = "categories";
const DASHBOARD: &str = "dashboard";

/// Response of write endpoints whose body the console ignores.
/// Unknown fields are accepted, so any JSON object (or a 204) decodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

fn listing<F: Serialize>(route: &str, filters: &F) -> String {
    format!("{}?{}", route, build_query(filters))
}

impl ApiClient {
    // ===== Users =====

    pub async fn list_users(&self, filters: &UserFilters) -> Result<Page<User>, ApiError> {
        self.get(&listing(USERS, filters)).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.get(&format!("{}/{}", USERS, id)).await
    }

    pub async fn create_user(&self, user: &CreateUserRequest) -> Result<Empty, ApiError> {
        self.post(USERS, user).await
    }

    pub async fn update_user(&self, user: &UpdateUserRequest) -> Result<Empty, ApiError> {
        self.put(USERS, user).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<Empty, ApiError> {
        self.delete(&format!("{}/{}", USERS, id)).await
    }

    // ===== Products =====

    pub async fn list_products(&self, filters: &ProductFilters) -> Result<Page<ProductRow>, ApiError> {
        self.get(&listing(PRODUCTS, filters)).await
    }

    pub async fn products_by_supplier(&self, supplier_id: i64) -> Result<Vec<Product>, ApiError> {
        self.get(&format!("{}/supplier/{}", PRODUCTS, supplier_id)).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, ApiError> {
        self.get(&format!("{}/{}", PRODUCTS, id)).await
    }

    pub async fn create_product(&self, product: &CreateProductRequest) -> Result<Empty, ApiError> {
        self.post(PRODUCTS, product).await
    }

    pub async fn update_product(&self, product: &UpdateProductRequest) -> Result<Empty, ApiError> {
        self.put(PRODUCTS, product).await
    }

    pub async fn delete_product(&self, id: i64) -> Result<Empty, ApiError> {
        self.delete(&format!("{}/{}", PRODUCTS, id)).await
    }

    // ===== Suppliers =====

    pub async fn list_suppliers(&self, filters: &SupplierFilters) -> Result<Page<Supplier>, ApiError> {
        self.get(&listing(SUPPLIERS, filters)).await
    }

    pub async fn get_supplier(&self, id: i64) -> Result<Supplier, ApiError> {
        self.get(&format!("{}/{}", SUPPLIERS, id)).await
    }

    pub async fn create_supplier(&self, supplier: &CreateSupplierRequest) -> Result<Empty, ApiError> {
        self.post(SUPPLIERS, supplier).await
    }

    pub async fn update_supplier(&self, supplier: &UpdateSupplierRequest) -> Result<Empty, ApiError> {
        self.put(SUPPLIERS, supplier).await
    }

    pub async fn delete_supplier(&self, id: i64) -> Result<Empty, ApiError> {
        self.delete(&format!("{}/{}", SUPPLIERS, id)).await
    }

    // ===== Batches =====

    pub async fn list_batches(&self, filters: &BatchFilters) -> Result<Page<BatchRow>, ApiError> {
        self.get(&listing(BATCHES, filters)).await
    }

    pub async fn get_batch(&self, id: i64) -> Result<BatchDetail, ApiError> {
        self.get(&format!("{}/{}", BATCHES, id)).await
    }

    pub async fn create_batch(&self, batch: &CreateBatchRequest) -> Result<Empty, ApiError> {
        self.post(BATCHES, batch).await
    }

    // ===== Stock movements =====

    pub async fn list_movements(&self, filters: &MovementFilters) -> Result<Page<MovementRow>, ApiError> {
        self.get(&listing(MOVEMENTS, filters)).await
    }

    pub async fn create_movement(&self, movement: &CreateMovementRequest) -> Result<Empty, ApiError> {
        self.post(MOVEMENTS, movement).await
    }

    pub async fn delete_movement(&self, id: i64) -> Result<Empty, ApiError> {
        self.delete(&format!("{}/{}", MOVEMENTS, id)).await
    }

    // ===== Categories =====

    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get(CATEGORIES).await
    }

    // ===== Dashboard =====

    pub async fn total_products(&self) -> Result<TotalProducts, ApiError> {
        self.get(&format!("{}/total-products", DASHBOARD)).await
    }

    pub async fn total_amount(&self) -> Result<TotalAmount, ApiError> {
        self.get(&format!("{}/total-amount", DASHBOARD)).await
    }

    /// Batches expiring within `limit_days` (15 when `None`)
    pub async fn expiring_batches(&self, limit_days: Option<u32>) -> Result<ExpiringBatches, ApiError> {
        let limit = limit_days.unwrap_or(DEFAULT_EXPIRING_LIMIT_DAYS);
        self.get(&format!("{}/expiring-batches?limit={}", DASHBOARD, limit)).await
    }

    /// Products with fewer than `threshold` units (20 when `None`)
    pub async fn low_stock(&self, threshold: Option<u32>) -> Result<LowStock, ApiError> {
        let threshold = threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        self.get(&format!("{}/low-stock?threshold={}", DASHBOARD, threshold)).await
    }

    pub async fn stock_summary(&self) -> Result<Vec<StockSummary>, ApiError> {
        self.get(&format!("{}/stock-summary", DASHBOARD)).await
    }
}
