//! # Product Repository
//!
//! Database operations for the store catalog.
//!
//! ## Key Operations
//! - Search by name, code or category
//! - CRUD operations
//! - Stock adjustments and the low-stock list
//! - Product code generation (`Earrings` → `EA001`, `EA002`, ...)

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{like_pattern, tax_rate_from_column};
use fancy_core::{Money, Product};

const PRODUCT_COLUMNS: &str = "id, product_code, name, category, price_paise, gst_rate_bps, \
     stock_quantity, min_stock_level, description, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    product_code: String,
    name: String,
    category: String,
    price_paise: i64,
    gst_rate_bps: i64,
    stock_quantity: i64,
    min_stock_level: i64,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            id: row.id,
            product_code: row.product_code,
            name: row.name,
            category: row.category,
            price: Money::from_paise(row.price_paise),
            gst_rate: tax_rate_from_column(row.gst_rate_bps)?,
            stock_quantity: row.stock_quantity,
            min_stock_level: row.min_stock_level,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches products by name, code or category.
    ///
    /// ## How It Works
    /// Case-insensitive substring match (`LIKE %query%`) on the three
    /// columns, ordered by name. An empty query lists the catalog.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // Billing page search box, 10 suggestions
    /// let products = repo.search("hoop", 10).await?;
    /// ```
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(Some(limit)).await;
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR product_code LIKE ?1 ESCAPE '\\' \
                OR category LIKE ?1 ESCAPE '\\' \
             ORDER BY name \
             LIMIT ?2"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(like_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Lists products ordered by name, optionally capped.
    pub async fn list(&self, limit: Option<u32>) -> DbResult<Vec<Product>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, i64::from);
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");

        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Products at or below their minimum stock level, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock_quantity <= min_stock_level \
             ORDER BY stock_quantity, name"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Gets a product by its code (e.g. `ER001`).
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_code = ?1");

        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::try_from).transpose()
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - Product code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(code = %product.product_code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, product_code, name, category,
                price_paise, gst_rate_bps, stock_quantity, min_stock_level,
                description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.paise())
        .bind(product.gst_rate.bps())
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(&product.description)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("product_code", &product.product_code),
            other => other,
        })?;

        Ok(product.clone())
    }

    /// Updates an existing product.
    ///
    /// Past invoices are unaffected: they carry their own snapshot.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                product_code = ?2,
                name = ?3,
                category = ?4,
                price_paise = ?5,
                gst_rate_bps = ?6,
                stock_quantity = ?7,
                min_stock_level = ?8,
                description = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.product_code)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price.paise())
        .bind(product.gst_rate.bps())
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(&product.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("product_code", &product.product_code),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adjusts stock by `delta` (positive when restocking).
    ///
    /// Relative update, so it composes with concurrent checkouts.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET stock_quantity = stock_quantity + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product. Invoice lines keep their snapshot.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Proposes a code for a new product in `category`.
    ///
    /// First two letters of the category, upper-cased, followed by the
    /// category's product count + 1 padded to three digits. Skips ahead
    /// when that code is already taken (e.g. after a deletion).
    ///
    /// ```text
    /// "Earrings" with 2 products → EA003
    /// ```
    pub async fn next_code_for_category(&self, category: &str) -> DbResult<String> {
        let prefix: String = category
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(2)
            .collect::<String>()
            .to_uppercase();
        let prefix = if prefix.is_empty() { "PR".to_string() } else { prefix };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category = ?1")
            .bind(category.trim())
            .fetch_one(&self.pool)
            .await?;

        let mut n = count + 1;
        loop {
            let code = format!("{prefix}{n:03}");
            if self.get_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            n += 1;
        }
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
