//! Repository layer for the drinks service.
//!
//! Handlers talk to a `DrinkStore`; the backend is chosen at startup.

pub mod drinks;
pub mod memory;

pub use drinks::{DrinkStore, PgDrinkStore, StoreError};
pub use memory::InMemoryDrinkStore;

use crate::models::{Ingredient, NewDrink};
use tracing::instrument;

/// The sample drink inserted by `SEED_CATALOG=true`.
pub fn sample_drink() -> NewDrink {
    NewDrink {
        title: "water".to_string(),
        recipe: vec![Ingredient {
            name: "water".to_string(),
            color: "blue".to_string(),
            parts: 1,
        }],
    }
}

/// Insert the sample drink if the catalog is empty.
///
/// Returns `true` if a drink was inserted.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be read or written.
#[instrument(skip_all, name = "drinks.repo.seed")]
pub async fn seed_sample_drink(store: &dyn DrinkStore) -> Result<bool, StoreError> {
    if !store.list_ordered_by_title().await?.is_empty() {
        tracing::debug!(target: "drinks.repo", "Catalog not empty, skipping seed");
        return Ok(false);
    }

    let drink = store.insert(sample_drink()).await?;
    tracing::info!(target: "drinks.repo", drink_id = drink.id, title = %drink.title, "Seeded sample drink");
    Ok(true)
}
