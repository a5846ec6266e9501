use serde::{Deserialize, Serialize};

/// A console account, as issued at login and as listed under `users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Raw access level; see `AccessType`
    #[serde(rename = "accessType")]
    pub access_type: i64,
}

impl User {
    pub fn access(&self) -> Option<AccessType> {
        AccessType::from_level(self.access_type)
    }

    pub fn access_label(&self) -> &'static str {
        AccessType::label_for(self.access_type)
    }
}

/// Privilege tier. Lower levels are more privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessType {
    Admin = 1,
    Manager = 2,
    Employee = 3,
}

impl AccessType {
    pub const ALL: [AccessType; 3] = [AccessType::Admin, AccessType::Manager, AccessType::Employee];

    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(AccessType::Admin),
            2 => Some(AccessType::Manager),
            3 => Some(AccessType::Employee),
            _ => None,
        }
    }

    pub fn level(&self) -> i64 {
        *self as i64
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccessType::Admin => "Administrator",
            AccessType::Manager => "Manager",
            AccessType::Employee => "Employee",
        }
    }

    /// Label for a raw level, "Unknown" for anything unrecognized
    pub fn label_for(level: i64) -> &'static str {
        Self::from_level(level).map(|a| a.label()).unwrap_or("Unknown")
    }
}

/// Console sections and who may open them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Dashboard,
    Users,
    Products,
    Batches,
    Suppliers,
    Movements,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Dashboard,
        Section::Users,
        Section::Products,
        Section::Batches,
        Section::Suppliers,
        Section::Movements,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Users => "Users",
            Section::Products => "Products",
            Section::Batches => "Batches",
            Section::Suppliers => "Suppliers",
            Section::Movements => "Stock movements",
        }
    }

    pub fn allowed_access(&self) -> &'static [AccessType] {
        match self {
            Section::Users => &[AccessType::Admin],
            Section::Movements => &[AccessType::Admin, AccessType::Manager],
            Section::Dashboard | Section::Products | Section::Batches | Section::Suppliers => {
                &AccessType::ALL
            }
        }
    }

    pub fn allows(&self, access: AccessType) -> bool {
        self.allowed_access().contains(&access)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub access_type: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateUserRequest {
    pub id: i64,
    #[serde(flatten)]
    pub user: CreateUserRequest,
}
