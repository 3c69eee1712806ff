//! # Customer Repository
//!
//! Customers are identified at the counter by phone number. Checkout
//! finds the customer by phone or registers them on the spot.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use fancy_core::Customer;

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, address, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Phone number already registered
    pub async fn insert(&self, customer: &Customer) -> DbResult<Customer> {
        debug!(id = %customer.id, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone, email, address, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("phone", &customer.phone),
            other => other,
        })?;

        Ok(customer.clone())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1");

        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Customer::from))
    }

    /// Gets a customer by normalized phone number.
    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        get_by_phone_in(&mut conn, phone).await
    }

    /// Returns the customer with `phone`, registering them if new.
    ///
    /// An existing customer keeps their stored name.
    pub async fn find_or_create(
        &self,
        name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        find_or_create_in(&mut conn, name, phone, email).await
    }

    /// Lists customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name, phone");

        let rows: Vec<CustomerRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Counts registered customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn get_by_phone_in(
    conn: &mut SqliteConnection,
    phone: &str,
) -> DbResult<Option<Customer>> {
    let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE phone = ?1");

    let row: Option<CustomerRow> = sqlx::query_as(&sql)
        .bind(phone)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Customer::from))
}

/// Find-or-create on an existing connection, so checkout can run it
/// inside its transaction.
pub(crate) async fn find_or_create_in(
    conn: &mut SqliteConnection,
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> DbResult<Customer> {
    let inserted = sqlx::query(
        "INSERT INTO customers (id, name, phone, email, address, created_at) \
         VALUES (?1, ?2, ?3, ?4, NULL, ?5) \
         ON CONFLICT(phone) DO NOTHING",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(name)
    .bind(phone)
    .bind(email)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if inserted.rows_affected() > 0 {
        debug!(phone = %phone, "Registered new customer");
    }

    get_by_phone_in(conn, phone)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", phone))
}

// =============================================================================
// Unit Tests
// =============================================================================
