//! Drink store abstraction and the PostgreSQL implementation.
//!
//! # Security
//!
//! - All queries use parameterized statements (SQL injection safe)
//! - Database error detail is logged, never returned to clients

use crate::models::{Drink, Ingredient, NewDrink};
use crate::observability::metrics;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

/// Store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another drink already has this title.
    #[error("Duplicate title: {0}")]
    DuplicateTitle(String),

    /// The backing store failed.
    #[error("Database error: {0}")]
    Database(String),
}

/// Persistence for the drinks catalog.
#[async_trait]
pub trait DrinkStore: Send + Sync {
    /// All drinks ordered by title.
    async fn list_ordered_by_title(&self) -> Result<Vec<Drink>, StoreError>;

    /// A single drink by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError>;

    /// Store a new drink and return it with its assigned id.
    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError>;

    /// Replace title and recipe of an existing drink.
    ///
    /// Returns `None` if no drink has `drink.id`.
    async fn update(&self, drink: Drink) -> Result<Option<Drink>, StoreError>;

    /// Delete a drink. Returns `false` if no drink has `id`.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Check that the store can serve queries.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// PostgreSQL-backed drink store.
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `drinks` table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the statement fails.
    #[instrument(skip_all, name = "drinks.repo.ensure_schema")]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS drinks (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL UNIQUE,
                recipe JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(target: "drinks.repo", "Schema ensured");
        Ok(())
    }
}

/// Time a query and record its outcome.
async fn timed<T, F>(operation: &'static str, query: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, sqlx::Error>>,
{
    let start = Instant::now();
    let result = query.await;
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::record_db_query(operation, status, start.elapsed());
    result.map_err(map_sqlx_error)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateTitle(db_err.message().to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

/// Map a database row to a Drink.
fn map_row_to_drink(row: &PgRow) -> Result<Drink, StoreError> {
    let recipe: Json<Vec<Ingredient>> = row
        .try_get("recipe")
        .map_err(|e| StoreError::Database(e.to_string()))?;

    Ok(Drink {
        id: row
            .try_get("id")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        title: row
            .try_get("title")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        recipe: recipe.0,
    })
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    #[instrument(skip_all, name = "drinks.repo.list")]
    async fn list_ordered_by_title(&self) -> Result<Vec<Drink>, StoreError> {
        let rows = timed(
            "list_drinks",
            sqlx::query("SELECT id, title, recipe FROM drinks ORDER BY title")
                .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(map_row_to_drink).collect()
    }

    #[instrument(skip_all, name = "drinks.repo.find", fields(drink_id = id))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        let row = timed(
            "find_drink",
            sqlx::query("SELECT id, title, recipe FROM drinks WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(map_row_to_drink).transpose()
    }

    #[instrument(skip_all, name = "drinks.repo.insert")]
    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        let row = timed(
            "insert_drink",
            sqlx::query(
                r#"
                INSERT INTO drinks (title, recipe)
                VALUES ($1, $2)
                RETURNING id, title, recipe
                "#,
            )
            .bind(&drink.title)
            .bind(Json(&drink.recipe))
            .fetch_one(&self.pool),
        )
        .await?;

        let stored = map_row_to_drink(&row)?;
        tracing::debug!(target: "drinks.repo", drink_id = stored.id, "Drink inserted");
        Ok(stored)
    }

    #[instrument(skip_all, name = "drinks.repo.update", fields(drink_id = drink.id))]
    async fn update(&self, drink: Drink) -> Result<Option<Drink>, StoreError> {
        let row = timed(
            "update_drink",
            sqlx::query(
                r#"
                UPDATE drinks
                SET title = $2, recipe = $3
                WHERE id = $1
                RETURNING id, title, recipe
                "#,
            )
            .bind(drink.id)
            .bind(&drink.title)
            .bind(Json(&drink.recipe))
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(map_row_to_drink).transpose()
    }

    #[instrument(skip_all, name = "drinks.repo.delete", fields(drink_id = id))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = timed(
            "delete_drink",
            sqlx::query("DELETE FROM drinks WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        timed("ping", sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}
