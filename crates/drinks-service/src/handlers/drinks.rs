//! Drinks catalog handlers.
//!
//! Gated handlers run behind `require_permission`; by the time they execute
//! the caller's token has been verified and its permission checked.

use crate::errors::DrinksError;
use crate::models::{
    CreateDrinkRequest, DeleteResponse, Drink, DrinksResponse, ShortDrink, UpdateDrinkRequest,
};
use crate::repositories::StoreError;
use crate::routes::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use std::sync::Arc;
use tracing::instrument;

const NOT_FOUND_MESSAGE: &str = "resource not found";

/// Read failures are server faults.
fn read_error(err: StoreError) -> DrinksError {
    DrinksError::Internal(err.to_string())
}

/// Write failures (including duplicate titles) are unprocessable requests.
fn write_error(err: StoreError) -> DrinksError {
    DrinksError::Persistence(err.to_string())
}

/// A non-integer id cannot name a drink.
fn drink_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, DrinksError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(target: "drinks.handlers", error = %rejection, "Unparseable drink id");
        DrinksError::NotFound(NOT_FOUND_MESSAGE.to_string())
    })
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, DrinksError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(target: "drinks.handlers", error = %rejection, "Rejected request body");
        DrinksError::InvalidRequest("request body must be a JSON object".to_string())
    })
}

async fn all_drinks(state: &AppState) -> Result<Vec<Drink>, DrinksError> {
    let drinks = state
        .store
        .list_ordered_by_title()
        .await
        .map_err(read_error)?;

    if drinks.is_empty() {
        tracing::debug!(target: "drinks.handlers", "Catalog is empty");
        return Err(DrinksError::NotFound(NOT_FOUND_MESSAGE.to_string()));
    }
    Ok(drinks)
}

/// Handler for GET /drinks
///
/// Public. Returns the short representation of every drink, ordered by title.
///
/// # Response
///
/// - 200 OK: `{"success": true, "drinks": [...]}`
/// - 404 Not Found: catalog is empty
#[instrument(skip_all, name = "drinks.handlers.list")]
pub async fn list_drinks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrinksResponse<ShortDrink>>, DrinksError> {
    let drinks = all_drinks(&state).await?;
    Ok(Json(DrinksResponse::new(
        drinks.iter().map(Drink::short).collect(),
    )))
}

/// Handler for GET /drinks-detail
///
/// Requires `get:drinks-detail`. Returns the long representation.
#[instrument(skip_all, name = "drinks.handlers.list_detail")]
pub async fn list_drinks_detail(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DrinksResponse<Drink>>, DrinksError> {
    let drinks = all_drinks(&state).await?;
    Ok(Json(DrinksResponse::new(drinks)))
}

/// Handler for POST /drinks
///
/// Requires `post:drinks`.
///
/// # Response
///
/// - 200 OK: `{"success": true, "drinks": [<created drink>]}`
/// - 400 Bad Request: body not JSON, or title/recipe missing or empty
/// - 422 Unprocessable Entity: the store rejected the drink (e.g. duplicate title)
#[instrument(skip_all, name = "drinks.handlers.create")]
pub async fn create_drink(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, DrinksError> {
    let new_drink = json_body(body)?.into_new_drink().ok_or_else(|| {
        DrinksError::InvalidRequest("title and recipe are required".to_string())
    })?;

    let drink = state.store.insert(new_drink).await.map_err(write_error)?;

    tracing::info!(target: "drinks.handlers", drink_id = drink.id, "Drink created");
    Ok(Json(DrinksResponse::new(vec![drink])))
}

/// Handler for PATCH /drinks/{id}
///
/// Requires `patch:drinks`. `title` and `recipe` are independently optional;
/// only supplied, non-empty fields change.
///
/// # Response
///
/// - 200 OK: `{"success": true, "drinks": [<updated drink>]}`
/// - 400 Bad Request: body not JSON
/// - 404 Not Found: no drink with that id
/// - 422 Unprocessable Entity: the store rejected the change
#[instrument(skip_all, name = "drinks.handlers.update")]
pub async fn update_drink(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, DrinksError> {
    let id = drink_id(path)?;

    let mut drink = state
        .store
        .find_by_id(id)
        .await
        .map_err(read_error)?
        .ok_or_else(|| DrinksError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

    json_body(body)?.apply_to(&mut drink);

    let updated = state
        .store
        .update(drink)
        .await
        .map_err(write_error)?
        .ok_or_else(|| DrinksError::NotFound(NOT_FOUND_MESSAGE.to_string()))?;

    tracing::info!(target: "drinks.handlers", drink_id = updated.id, "Drink updated");
    Ok(Json(DrinksResponse::new(vec![updated])))
}

/// Handler for DELETE /drinks/{id}
///
/// Requires `delete:drinks`.
///
/// # Response
///
/// - 200 OK: `{"success": true, "delete": <id>}`
/// - 404 Not Found: no drink with that id
/// - 422 Unprocessable Entity: the store failed to delete
#[instrument(skip_all, name = "drinks.handlers.delete")]
pub async fn delete_drink(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, DrinksError> {
    let id = drink_id(path)?;

    let deleted = state.store.delete(id).await.map_err(write_error)?;
    if !deleted {
        return Err(DrinksError::NotFound(NOT_FOUND_MESSAGE.to_string()));
    }

    tracing::info!(target: "drinks.handlers", drink_id = id, "Drink deleted");
    Ok(Json(DeleteResponse {
        success: true,
        delete: id,
    }))
}
