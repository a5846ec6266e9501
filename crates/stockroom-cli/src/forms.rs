//! Request builders for the add and edit commands.
//!
//! Everything typed on the command line is checked here, before a request
//! goes out.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use stockroom_core::models::{
    AccessType, Category, CreateBatchRequest, CreateMovementRequest, CreateProductRequest,
    CreateSupplierRequest, CreateUserRequest, Product,
};
use stockroom_core::utils::{parse_date_br, to_cents};

/// Trimmed, non-empty text
pub fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{} is required", field);
    }
    Ok(value.to_string())
}

/// A typed amount such as `12,50` or `R$ 1.234,56`, in cents
pub fn price_cents(value: &str) -> Result<i64> {
    let cents = to_cents(value).with_context(|| format!("Invalid price '{}'", value))?;
    if cents < 0 {
        bail!("Price cannot be negative");
    }
    Ok(cents)
}

/// `dd/mm/yyyy` to midnight UTC
pub fn date_br(value: &str) -> Result<DateTime<Utc>> {
    let iso = parse_date_br(value)
        .with_context(|| format!("Invalid date '{}', expected dd/mm/yyyy", value))?;
    Ok(DateTime::parse_from_rfc3339(&iso)?.with_timezone(&Utc))
}

/// A batch line given as `product_id:quantity`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineArg {
    pub product_id: i64,
    pub quantity: i64,
}

pub fn parse_line(value: &str) -> std::result::Result<LineArg, String> {
    let (id, qty) = value
        .split_once(':')
        .ok_or_else(|| format!("expected product_id:quantity, got '{}'", value))?;
    let product_id = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid product id '{}'", id))?;
    let quantity: i64 = qty
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", qty))?;
    if quantity <= 0 {
        return Err(format!("quantity must be positive, got {}", quantity));
    }
    Ok(LineArg {
        product_id,
        quantity,
    })
}

pub fn user_request(
    name: &str,
    email: &str,
    password: &str,
    access: AccessType,
) -> Result<CreateUserRequest> {
    let email = required("Email", email)?;
    if !email.contains('@') {
        bail!("Invalid email '{}'", email);
    }
    if password.is_empty() {
        bail!("Password is required");
    }
    Ok(CreateUserRequest {
        name: required("Name", name)?,
        email,
        password: password.to_string(),
        access_type: access.level(),
    })
}

/// A product request whose category must be one of `categories`
pub fn product_request(
    name: &str,
    description: &str,
    unit_price: i64,
    category_id: i64,
    categories: &[Category],
) -> Result<CreateProductRequest> {
    if !categories.iter().any(|c| c.id == category_id) {
        let known: Vec<String> = categories
            .iter()
            .map(|c| format!("{} ({})", c.id, c.name))
            .collect();
        bail!(
            "Unknown category {}. Available: {}",
            category_id,
            if known.is_empty() { "none".to_string() } else { known.join(", ") }
        );
    }
    Ok(CreateProductRequest {
        name: required("Name", name)?,
        description: description.trim().to_string(),
        unit_price,
        category_id,
    })
}

pub fn supplier_request(
    name: &str,
    telephone: &str,
    address: &str,
    cnpj: &str,
) -> Result<CreateSupplierRequest> {
    let digits = cnpj.chars().filter(char::is_ascii_digit).count();
    if digits != 14 {
        bail!("CNPJ must have 14 digits, got {}", digits);
    }
    Ok(CreateSupplierRequest {
        name: required("Name", name)?,
        telephone: required("Telephone", telephone)?,
        address: required("Address", address)?,
        cnpj: cnpj.trim().to_string(),
    })
}

/// A batch priced from the supplier's catalog.
pub fn batch_request(
    supplier_id: i64,
    validity: &str,
    lines: &[LineArg],
    catalog: &[Product],
) -> Result<CreateBatchRequest> {
    if lines.is_empty() {
        bail!("Add at least one product");
    }
    let validity = parse_date_br(validity)
        .with_context(|| format!("Invalid date '{}', expected dd/mm/yyyy", validity))?;

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = catalog
            .iter()
            .find(|p| p.id == line.product_id)
            .with_context(|| {
                format!(
                    "Product {} is not supplied by supplier {}",
                    line.product_id, supplier_id
                )
            })?;
        priced.push((line.product_id, line.quantity, product.unit_price));
    }
    Ok(CreateBatchRequest::from_lines(supplier_id, validity, &priced))
}

pub fn movement_request(
    kind: &str,
    quantity: i64,
    product_id: i64,
    user_id: i64,
    date: DateTime<Utc>,
) -> Result<CreateMovementRequest> {
    if quantity <= 0 {
        bail!("Quantity must be positive");
    }
    Ok(CreateMovementRequest {
        date,
        kind: required("Type", kind)?,
        quantity,
        product_id,
        user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::models::NamedRef;

    fn product(id: i64, unit_price: i64) -> Product {
        Product {
            id,
            name: format!("P{}", id),
            description: String::new(),
            unit_price,
            category_id: 1,
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("3:10"),
            Ok(LineArg {
                product_id: 3,
                quantity: 10
            })
        );
        assert!(parse_line("3").is_err());
        assert!(parse_line("x:1").is_err());
        assert!(parse_line("3:0").is_err());
    }

    #[test]
    fn test_price_accepts_brazilian_amounts() {
        assert_eq!(price_cents("R$ 1.234,56").unwrap(), 123_456);
        assert_eq!(price_cents("12,5").unwrap(), 1250);
        assert!(price_cents("abc").is_err());
        assert!(price_cents("-1").is_err());
    }

    #[test]
    fn test_batch_is_priced_from_catalog() {
        let catalog = [product(1, 250), product(2, 1000)];
        let lines = [
            LineArg {
                product_id: 1,
                quantity: 10,
            },
            LineArg {
                product_id: 2,
                quantity: 5,
            },
        ];
        let batch = batch_request(4, "01/12/2026", &lines, &catalog).unwrap();
        assert_eq!(batch.price, 7500);
        assert_eq!(batch.quantity, 15);
        assert_eq!(batch.validity, "2026-12-01T00:00:00.000Z");
        assert_eq!(batch.supplier_id, 4);
    }

    #[test]
    fn test_batch_rejects_foreign_products_and_empty_lines() {
        let catalog = [product(1, 250)];
        let foreign = [LineArg {
            product_id: 9,
            quantity: 1,
        }];
        let err = batch_request(4, "01/12/2026", &foreign, &catalog).unwrap_err();
        assert!(err.to_string().contains("not supplied by supplier 4"));
        assert!(batch_request(4, "01/12/2026", &[], &catalog).is_err());
        assert!(batch_request(4, "2026-12-01", &foreign, &catalog).is_err());
    }

    #[test]
    fn test_product_category_must_exist() {
        let categories = [NamedRef {
            id: 2,
            name: "Grãos".to_string(),
        }];
        let req = product_request(" Arroz ", "5kg", 2599, 2, &categories).unwrap();
        assert_eq!(req.name, "Arroz");

        let err = product_request("Arroz", "", 2599, 7, &categories).unwrap_err();
        assert_eq!(err.to_string(), "Unknown category 7. Available: 2 (Grãos)");
    }

    #[test]
    fn test_user_and_supplier_validation() {
        assert!(user_request("Ana", "ana@x.com", "pw", AccessType::Manager).is_ok());
        assert!(user_request("Ana", "ana", "pw", AccessType::Manager).is_err());
        assert!(user_request(" ", "ana@x.com", "pw", AccessType::Manager).is_err());
        assert!(user_request("Ana", "ana@x.com", "", AccessType::Manager).is_err());

        assert!(supplier_request("Atacado", "51 9999", "Rua A", "12.345.678/0001-90").is_ok());
        assert!(supplier_request("Atacado", "51 9999", "Rua A", "123").is_err());
    }

    #[test]
    fn test_movement_request() {
        let date = date_br("02/03/2026").unwrap();
        let req = movement_request("saida", 3, 1, 5, date).unwrap();
        assert_eq!(req.date.to_rfc3339(), "2026-03-02T00:00:00+00:00");
        assert!(movement_request("saida", 0, 1, 5, date).is_err());
        assert!(movement_request(" ", 1, 1, 5, date).is_err());
    }
}
