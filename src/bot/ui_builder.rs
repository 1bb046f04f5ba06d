//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::localization::{t_lang, LocalizationManager};
use crate::recipes::RecipeCatalog;

use super::callback_data::CallbackAction;

/// One button per recipe
pub fn create_recipe_list_keyboard(catalog: &RecipeCatalog) -> InlineKeyboardMarkup {
    let buttons = catalog
        .list()
        .iter()
        .map(|recipe| {
            vec![InlineKeyboardButton::callback(
                format!("🍰 {}", recipe.name),
                CallbackAction::Recipe(recipe.id.clone()).to_data(),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// Single "back to recipes" button shown under a recipe
pub fn create_recipe_back_keyboard(
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        format!("⬅️ {}", t_lang(localization, "recipe-back", language_code)),
        CallbackAction::Recipes.to_data(),
    )]])
}

/// Order actions; the upload button is only offered to staff
pub fn create_order_keyboard(
    order_id: i64,
    is_staff: bool,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> InlineKeyboardMarkup {
    let mut buttons = Vec::new();

    if is_staff {
        buttons.push(vec![InlineKeyboardButton::callback(
            format!("📸 {}", t_lang(localization, "order-upload-button", language_code)),
            CallbackAction::OrderUpload(order_id).to_data(),
        )]);
    }

    buttons.push(vec![
        InlineKeyboardButton::callback(
            format!("🖼️ {}", t_lang(localization, "order-photos-button", language_code)),
            CallbackAction::OrderPhotos(order_id).to_data(),
        ),
        InlineKeyboardButton::callback(
            format!("❌ {}", t_lang(localization, "cancel", language_code)),
            CallbackAction::OrderCancel.to_data(),
        ),
    ]);

    InlineKeyboardMarkup::new(buttons)
}
