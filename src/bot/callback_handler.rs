//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, MaybeInaccessibleMessage};
use tracing::{debug, error, warn};

use crate::dialogue::{BotDialogue, BotDialogueState};
use crate::localization::{t_args_lang, t_lang};
use crate::recipes::format_recipe;

use super::callback_data::CallbackAction;
use super::media::with_file_manager;
use super::ui_builder::{create_recipe_back_keyboard, create_recipe_list_keyboard};
use super::BotContext;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: BotDialogue,
    ctx: Arc<BotContext>,
) -> Result<()> {
    let user_id = q.from.id.0 as i64;
    let language_code = q.from.language_code.as_deref();
    let action = q.data.as_deref().and_then(CallbackAction::parse);
    debug!(user_id, action = ?action, "Received callback query from user");

    if let (Some(action), Some(msg)) = (action, &q.message) {
        dispatch_action(&bot, msg, action, user_id, language_code, &dialogue, &ctx).await?;
    }

    // Answer the callback query to remove the loading state
    bot.answer_callback_query(q.id.clone()).await?;

    Ok(())
}

async fn dispatch_action(
    bot: &Bot,
    msg: &MaybeInaccessibleMessage,
    action: CallbackAction,
    user_id: i64,
    language_code: Option<&str>,
    dialogue: &BotDialogue,
    ctx: &BotContext,
) -> Result<()> {
    let l10n = &ctx.localization;
    let chat_id = msg.chat().id;

    match action {
        CallbackAction::Recipes => {
            if let Err(e) = bot
                .edit_message_text(chat_id, msg.id(), t_lang(l10n, "recipes-title", language_code))
                .reply_markup(create_recipe_list_keyboard(&ctx.catalog))
                .await
            {
                error!(user_id, error = %e, "Failed to edit message back to recipe list");
            }
        }
        CallbackAction::Recipe(recipe_id) => match ctx.catalog.get(&recipe_id) {
            Some(recipe) => {
                if let Err(e) = bot
                    .edit_message_text(chat_id, msg.id(), format_recipe(recipe, l10n, language_code))
                    .reply_markup(create_recipe_back_keyboard(l10n, language_code))
                    .await
                {
                    error!(user_id, recipe_id = %recipe_id, error = %e, "Failed to show recipe");
                }
            }
            None => {
                warn!(user_id, recipe_id = %recipe_id, "Unknown recipe requested");
                bot.send_message(chat_id, t_lang(l10n, "recipe-not-found", language_code))
                    .await?;
            }
        },
        CallbackAction::OrderUpload(order_id) => {
            let order_id_text = order_id.to_string();
            if !ctx.is_staff(user_id) {
                warn!(user_id, order_id, "Non-staff user tried to upload a status photo");
                bot.send_message(chat_id, t_lang(l10n, "order-upload-forbidden", language_code))
                    .await?;
                return Ok(());
            }

            dialogue
                .update(BotDialogueState::AwaitingStatusPhoto { order_id })
                .await?;
            bot.send_message(
                chat_id,
                t_args_lang(l10n, "order-upload-prompt", &[("order_id", &order_id_text)], language_code),
            )
            .await?;
        }
        CallbackAction::OrderPhotos(order_id) => {
            send_order_photos(bot, chat_id, order_id, language_code, ctx).await?;
        }
        CallbackAction::OrderCancel => {
            dialogue.reset().await?;
            bot.send_message(chat_id, t_lang(l10n, "order-cancelled", language_code))
                .await?;
        }
    }

    Ok(())
}

/// Send every stored status photo of an order that is still on disk
async fn send_order_photos(
    bot: &Bot,
    chat_id: ChatId,
    order_id: i64,
    language_code: Option<&str>,
    ctx: &BotContext,
) -> Result<()> {
    let l10n = &ctx.localization;
    let order_id_text = order_id.to_string();
    let stored = ctx.photo_index.status_photos(order_id).await;

    let available: Vec<PathBuf> = with_file_manager(&ctx.file_manager, move |fm| {
        Ok(stored
            .iter()
            .filter(|relative_path| fm.file_exists(relative_path))
            .filter_map(|relative_path| fm.get_order_status_photo_path(order_id, relative_path).ok())
            .collect())
    })
    .await
    .unwrap_or_default();

    if available.is_empty() {
        bot.send_message(
            chat_id,
            t_args_lang(l10n, "order-no-photos", &[("order_id", &order_id_text)], language_code),
        )
        .await?;
        return Ok(());
    }

    for (i, path) in available.into_iter().enumerate() {
        let index = (i + 1).to_string();
        let caption = t_args_lang(
            l10n,
            "order-photo-caption",
            &[("order_id", &order_id_text), ("index", &index)],
            language_code,
        );
        if let Err(e) = bot.send_photo(chat_id, InputFile::file(path)).caption(caption).await {
            error!(order_id, error = %e, "Failed to send order status photo");
        }
    }

    Ok(())
}
