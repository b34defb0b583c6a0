//! Process-local drink store.
//!
//! Backs `STORE_BACKEND=memory` and the test harness. Enforces title
//! uniqueness the same way the `drinks.title` UNIQUE constraint does.

use crate::models::{Drink, NewDrink};
use crate::repositories::drinks::{DrinkStore, StoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    drinks: BTreeMap<i64, Drink>,
    next_id: i64,
}

/// In-memory drink store.
#[derive(Default)]
pub struct InMemoryDrinkStore {
    inner: RwLock<Inner>,

    /// When set, every operation fails with `StoreError::Database`.
    failing: AtomicBool,
}

impl InMemoryDrinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        Ok(())
    }
}

fn title_taken(drinks: &BTreeMap<i64, Drink>, title: &str, except: Option<i64>) -> bool {
    drinks
        .values()
        .any(|d| d.title == title && Some(d.id) != except)
}

#[async_trait]
impl DrinkStore for InMemoryDrinkStore {
    async fn list_ordered_by_title(&self) -> Result<Vec<Drink>, StoreError> {
        self.check_available()?;
        let inner = self.inner.read().await;
        let mut drinks: Vec<Drink> = inner.drinks.values().cloned().collect();
        drinks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(drinks)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Drink>, StoreError> {
        self.check_available()?;
        Ok(self.inner.read().await.drinks.get(&id).cloned())
    }

    async fn insert(&self, drink: NewDrink) -> Result<Drink, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;

        if title_taken(&inner.drinks, &drink.title, None) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        inner.next_id += 1;
        let stored = Drink {
            id: inner.next_id,
            title: drink.title,
            recipe: drink.recipe,
        };
        inner.drinks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, drink: Drink) -> Result<Option<Drink>, StoreError> {
        self.check_available()?;
        let mut inner = self.inner.write().await;

        if !inner.drinks.contains_key(&drink.id) {
            return Ok(None);
        }
        if title_taken(&inner.drinks, &drink.title, Some(drink.id)) {
            return Err(StoreError::DuplicateTitle(drink.title));
        }

        inner.drinks.insert(drink.id, drink.clone());
        Ok(Some(drink))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.inner.write().await.drinks.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
