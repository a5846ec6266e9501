use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "telefone")]
    pub telephone: String,
    #[serde(rename = "endereco")]
    pub address: String,
    /// Brazilian company registration number
    pub cnpj: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierFilters {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub cnpj: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub telephone: String,
    pub address: String,
    pub cnpj: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSupplierRequest {
    pub id: i64,
    #[serde(flatten)]
    pub supplier: CreateSupplierRequest,
}
