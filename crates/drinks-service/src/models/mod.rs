//! Drinks service models.
//!
//! Drinks are exposed in two representations: the short form omits each
//! ingredient's name and is served publicly, the long form is complete.

use serde::{Deserialize, Serialize};

/// One recipe component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient name (e.g. "milk").
    pub name: String,

    /// Display color used to draw the drink.
    pub color: String,

    /// Relative proportion.
    pub parts: u32,
}

/// Ingredient as shown in the short representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

impl From<&Ingredient> for ShortIngredient {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            color: ingredient.color.clone(),
            parts: ingredient.parts,
        }
    }
}

/// A catalog entry (long representation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drink {
    /// Store-assigned identifier.
    pub id: i64,

    /// Unique title.
    pub title: String,

    /// Ordered list of ingredients.
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// Short representation without ingredient names.
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self.recipe.iter().map(ShortIngredient::from).collect(),
        }
    }
}

/// A catalog entry (short representation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortDrink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

/// A drink that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Request body for `POST /drinks`.
///
/// Both fields are optional at the wire level so that a missing field is a
/// 400 from the handler rather than an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub recipe: Option<Vec<Ingredient>>,
}

impl CreateDrinkRequest {
    /// Validate the request into a storable drink.
    ///
    /// Returns `None` if the title is blank or the recipe is missing or empty.
    pub fn into_new_drink(self) -> Option<NewDrink> {
        let title = non_blank(self.title)?;
        let recipe = self.recipe.filter(|r| !r.is_empty())?;
        Some(NewDrink { title, recipe })
    }
}

/// Request body for `PATCH /drinks/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub recipe: Option<Vec<Ingredient>>,
}

impl UpdateDrinkRequest {
    /// Apply supplied, non-empty fields to `drink`.
    ///
    /// Blank titles and empty recipes are treated as not supplied.
    pub fn apply_to(self, drink: &mut Drink) {
        if let Some(title) = non_blank(self.title) {
            drink.title = title;
        }
        if let Some(recipe) = self.recipe.filter(|r| !r.is_empty()) {
            drink.recipe = recipe;
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Success envelope for endpoints returning drinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

impl<T> DrinksResponse<T> {
    pub fn new(drinks: Vec<T>) -> Self {
        Self {
            success: true,
            drinks,
        }
    }
}

/// Success envelope for `DELETE /drinks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,

    /// Id of the deleted drink.
    pub delete: i64,
}

/// Readiness check response.
///
/// Returned by the `/ready` endpoint (readiness probe).
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: &'static str,

    /// Store health ("healthy" or "unhealthy").
    pub store: &'static str,

    /// Generic error message when not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
