//! # Supplier & Customer Repositories
//!
//! Both parties share the same shape: a generated business code, a name and
//! optional contact details. Purchase orders reference suppliers and
//! invoices reference customers by code, so deleting a party with documents
//! fails on the foreign key.

use chrono::Utc;
use shopfront_core::validation::{validate_email, validate_name};
use shopfront_core::{CodeType, Customer, PartyDetails, Supplier};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::code_format::generate_in;

fn validate_party(details: &PartyDetails) -> DbResult<()> {
    validate_name("name", &details.name, 150)?;
    validate_email(details.email.as_deref())?;
    Ok(())
}

/// Trims an optional text field, mapping blank to `None`.
fn clean(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Suppliers
// =============================================================================

const SUPPLIER_COLUMNS: &str =
    "id, supplier_code, name, contact_person, phone, email, address, created_at";

/// Repository for suppliers.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Inserts a supplier under a freshly generated code.
    pub async fn create(&self, details: &PartyDetails) -> DbResult<Supplier> {
        validate_party(details)?;

        let mut tx = self.pool.begin().await?;
        let code = generate_in(&mut tx, CodeType::Supplier).await?;

        let supplier = sqlx::query_as::<_, Supplier>(&format!(
            r#"
            INSERT INTO suppliers (
                supplier_code, name, contact_person, phone, email, address, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(&code)
        .bind(details.name.trim())
        .bind(clean(&details.contact_person))
        .bind(clean(&details.phone))
        .bind(clean(&details.email))
        .bind(clean(&details.address))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(supplier_code = %supplier.supplier_code, "Supplier created");
        Ok(supplier)
    }

    pub async fn get(&self, code: &str) -> DbResult<Supplier> {
        sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE supplier_code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", code))
    }

    /// Lists suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY name, supplier_code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Replaces the name and contact details of a supplier.
    pub async fn update(&self, code: &str, details: &PartyDetails) -> DbResult<Supplier> {
        validate_party(details)?;
        debug!(supplier_code = %code, "Updating supplier");

        sqlx::query_as::<_, Supplier>(&format!(
            r#"
            UPDATE suppliers SET
                name = ?1, contact_person = ?2, phone = ?3, email = ?4, address = ?5
            WHERE supplier_code = ?6
            RETURNING {SUPPLIER_COLUMNS}
            "#
        ))
        .bind(details.name.trim())
        .bind(clean(&details.contact_person))
        .bind(clean(&details.phone))
        .bind(clean(&details.email))
        .bind(clean(&details.address))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Supplier", code))
    }

    /// Deletes a supplier with no purchase orders.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        debug!(supplier_code = %code, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE supplier_code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", code));
        }
        Ok(())
    }
}

// =============================================================================
// Customers
// =============================================================================

const CUSTOMER_COLUMNS: &str = "id, customer_code, name, phone, email, address, created_at";

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer under a freshly generated code.
    ///
    /// `contact_person` is not stored for customers.
    pub async fn create(&self, details: &PartyDetails) -> DbResult<Customer> {
        validate_party(details)?;

        let mut tx = self.pool.begin().await?;
        let code = generate_in(&mut tx, CodeType::Customer).await?;

        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (customer_code, name, phone, email, address, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(&code)
        .bind(details.name.trim())
        .bind(clean(&details.phone))
        .bind(clean(&details.email))
        .bind(clean(&details.address))
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(customer_code = %customer.customer_code, "Customer created");
        Ok(customer)
    }

    pub async fn get(&self, code: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE customer_code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", code))
    }

    /// Lists customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name, customer_code"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    pub async fn update(&self, code: &str, details: &PartyDetails) -> DbResult<Customer> {
        validate_party(details)?;
        debug!(customer_code = %code, "Updating customer");

        sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers SET name = ?1, phone = ?2, email = ?3, address = ?4
            WHERE customer_code = ?5
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(details.name.trim())
        .bind(clean(&details.phone))
        .bind(clean(&details.email))
        .bind(clean(&details.address))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", code))
    }

    /// Deletes a customer with no invoices.
    pub async fn delete(&self, code: &str) -> DbResult<()> {
        debug!(customer_code = %code, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE customer_code = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", code));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
