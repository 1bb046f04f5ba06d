//! # Recipe Catalog Module
//!
//! Bakery recipes shown to customers, loaded from JSON.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::localization::{t_args_lang, t_lang, LocalizationManager};

const DEFAULT_RECIPES: &str = include_str!("../assets/recipes.json");

/// A single recipe of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub description: String,
    pub servings: u32,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Ordered, read-only collection of recipes
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
}

impl RecipeCatalog {
    /// Load the recipes bundled with the bot
    pub fn load_default() -> Result<Self> {
        Self::from_json(DEFAULT_RECIPES).context("Failed to load bundled recipes")
    }

    /// Parse a JSON array of recipes, rejecting duplicate or empty ids
    pub fn from_json(json: &str) -> Result<Self> {
        let recipes: Vec<Recipe> = serde_json::from_str(json).context("Invalid recipe JSON")?;

        let mut seen = HashSet::new();
        for recipe in &recipes {
            if recipe.id.trim().is_empty() {
                bail!("Recipe '{}' has an empty id", recipe.name);
            }
            if !seen.insert(recipe.id.as_str()) {
                bail!("Duplicate recipe id: {}", recipe.id);
            }
        }

        Ok(Self { recipes })
    }

    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

/// Format a recipe as a chat message
pub fn format_recipe(
    recipe: &Recipe,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let servings = recipe.servings.to_string();
    let mut message = format!(
        "🎂 {}\n{}\n{}\n\n{}\n",
        recipe.name,
        recipe.description,
        t_args_lang(localization, "recipe-servings", &[("servings", &servings)], language_code),
        t_lang(localization, "recipe-ingredients", language_code),
    );

    for ingredient in &recipe.ingredients {
        message.push_str(&format!("• {ingredient}\n"));
    }

    message.push_str(&format!("\n{}\n", t_lang(localization, "recipe-steps", language_code)));
    for (i, step) in recipe.steps.iter().enumerate() {
        message.push_str(&format!("{}. {}\n", i + 1, step));
    }

    message.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_loads() {
        let catalog = RecipeCatalog::load_default().unwrap();
        assert!(!catalog.is_empty());
        assert!(catalog.get("napoleon").is_some());
        assert!(catalog.get("croissant").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"[
            {"id": "a", "name": "A", "description": "", "servings": 1, "ingredients": [], "steps": []},
            {"id": "a", "name": "B", "description": "", "servings": 1, "ingredients": [], "steps": []}
        ]"#;
        assert!(RecipeCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let json = r#"[{"id": " ", "name": "A", "description": "", "servings": 1, "ingredients": [], "steps": []}]"#;
        assert!(RecipeCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_format_recipe() {
        let localization = LocalizationManager::new().unwrap();
        let recipe = Recipe {
            id: "tart".to_string(),
            name: "Lemon Tart".to_string(),
            description: "Sharp and sweet.".to_string(),
            servings: 6,
            ingredients: vec!["3 lemons".to_string(), "200 g sugar".to_string()],
            steps: vec!["Bake the shell.".to_string(), "Fill it.".to_string()],
        };

        let message = format_recipe(&recipe, &localization, Some("en"));
        assert!(message.starts_with("🎂 Lemon Tart"));
        assert!(message.contains("Serves 6"));
        assert!(message.contains("• 3 lemons"));
        assert!(message.contains("2. Fill it."));
    }
}
