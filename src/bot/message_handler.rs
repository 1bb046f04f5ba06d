//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{debug, error, info, warn};

use crate::dialogue::{parse_order_id, BotDialogue, BotDialogueState};
use crate::localization::{t_args_lang, t_lang};

use super::media::{fetch_photo, with_file_manager, IncomingPhoto};
use super::ui_builder::{create_order_keyboard, create_recipe_list_keyboard};
use super::BotContext;

/// Telegram id of the sender, falling back to the chat id for channel posts
fn sender_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .map(|user| user.id.0 as i64)
        .unwrap_or(msg.chat.id.0)
}

fn sender_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

/// Split `/command@botname args` into the bare command and its arguments
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    let (head, args) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let command = head.split('@').next().unwrap_or(head);
    Some((command, args.trim()))
}

/// Where an incoming photo is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoTarget {
    Profile,
    OrderStatus(i64),
}

/// Pick the destination of a photo from the chat state and the sender
///
/// Dialogue state is kept per chat, so in a group the pending upload may
/// have been started by someone else: only staff photos go to the order.
pub fn photo_target(state: Option<&BotDialogueState>, sender_is_staff: bool) -> PhotoTarget {
    match state {
        Some(BotDialogueState::AwaitingStatusPhoto { order_id }) if sender_is_staff => {
            PhotoTarget::OrderStatus(*order_id)
        }
        _ => PhotoTarget::Profile,
    }
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: &BotDialogue,
    ctx: &BotContext,
) -> Result<()> {
    let language_code = sender_language(msg);
    let l10n = &ctx.localization;
    debug!(user_id = %msg.chat.id, "Received text message from user");

    match split_command(text) {
        Some(("/start", _)) => {
            dialogue.reset().await?;
            let welcome_message = [
                t_lang(l10n, "welcome-title", language_code),
                t_lang(l10n, "welcome-description", language_code),
                t_lang(l10n, "welcome-commands", language_code),
            ]
            .join("\n\n");
            bot.send_message(msg.chat.id, welcome_message).await?;
        }
        Some(("/help", _)) => {
            let help_message = [
                t_lang(l10n, "help-title", language_code),
                t_lang(l10n, "help-recipes", language_code),
                t_lang(l10n, "help-photo", language_code),
                t_lang(l10n, "help-order", language_code),
            ]
            .join("\n\n");
            bot.send_message(msg.chat.id, help_message).await?;
        }
        Some(("/recipes", _)) => {
            if ctx.catalog.is_empty() {
                bot.send_message(msg.chat.id, t_lang(l10n, "recipes-empty", language_code))
                    .await?;
            } else {
                bot.send_message(msg.chat.id, t_lang(l10n, "recipes-title", language_code))
                    .reply_markup(create_recipe_list_keyboard(&ctx.catalog))
                    .await?;
            }
        }
        Some(("/myphoto", _)) => send_profile_photo(bot, msg, ctx).await?,
        Some(("/order", args)) => match parse_order_id(args) {
            Some(order_id) => {
                let user_id = sender_id(msg);
                let order_id_text = order_id.to_string();
                bot.send_message(
                    msg.chat.id,
                    t_args_lang(l10n, "order-title", &[("order_id", &order_id_text)], language_code),
                )
                .reply_markup(create_order_keyboard(
                    order_id,
                    ctx.is_staff(user_id),
                    l10n,
                    language_code,
                ))
                .await?;
            }
            None => {
                bot.send_message(msg.chat.id, t_lang(l10n, "order-usage", language_code))
                    .await?;
            }
        },
        Some(("/cancel", _)) => {
            dialogue.reset().await?;
            bot.send_message(msg.chat.id, t_lang(l10n, "order-cancelled", language_code))
                .await?;
        }
        _ => {
            let reply = match dialogue.get().await? {
                Some(BotDialogueState::AwaitingStatusPhoto { order_id }) => t_args_lang(
                    l10n,
                    "order-upload-waiting",
                    &[("order_id", &order_id.to_string())],
                    language_code,
                ),
                _ => t_lang(l10n, "text-response", language_code),
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
    }

    Ok(())
}

async fn send_profile_photo(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<()> {
    let language_code = sender_language(msg);
    let user_id = sender_id(msg);
    let stored = ctx.photo_index.profile_photo(user_id).await;

    let lookup = with_file_manager(&ctx.file_manager, move |fm| {
        fm.get_user_profile_photo_path(user_id, stored.as_deref())
    })
    .await;

    match lookup {
        Ok(path) => {
            bot.send_photo(msg.chat.id, InputFile::file(path))
                .caption(t_lang(&ctx.localization, "myphoto-caption", language_code))
                .await?;
        }
        Err(e) => {
            debug!(user_id, error = %e, "No profile photo available");
            bot.send_message(
                msg.chat.id,
                t_lang(&ctx.localization, "profile-photo-missing", language_code),
            )
            .await?;
        }
    }

    Ok(())
}

async fn handle_photo_message(
    bot: &Bot,
    msg: &Message,
    incoming: IncomingPhoto,
    dialogue: &BotDialogue,
    ctx: &BotContext,
) -> Result<()> {
    let language_code = sender_language(msg);
    let l10n = &ctx.localization;
    let user_id = sender_id(msg);

    bot.send_message(msg.chat.id, t_lang(l10n, "photo-processing", language_code))
        .await?;

    let photo = match fetch_photo(bot, incoming).await {
        Ok(Some(photo)) => photo,
        Ok(None) => {
            warn!(user_id, "Unsupported image format rejected");
            bot.send_message(msg.chat.id, t_lang(l10n, "error-unsupported-format", language_code))
                .await?;
            return Ok(());
        }
        Err(e) => {
            error!(user_id, error = %e, "Failed to download photo for user");
            bot.send_message(msg.chat.id, t_lang(l10n, "error-download-failed", language_code))
                .await?;
            return Ok(());
        }
    };

    let state = dialogue.get().await?;
    match photo_target(state.as_ref(), ctx.is_staff(user_id)) {
        PhotoTarget::OrderStatus(order_id) => {
            let order_id_text = order_id.to_string();
            let saved = with_file_manager(&ctx.file_manager, move |fm| {
                photo.save_as_status_photo(fm, order_id)
            })
            .await;

            match saved {
                Ok(relative_path) => {
                    ctx.photo_index.record_status_photo(order_id, relative_path).await;
                    dialogue.reset().await?;
                    info!(user_id, order_id, "Order status photo stored");
                    bot.send_message(
                        msg.chat.id,
                        t_args_lang(l10n, "order-photo-saved", &[("order_id", &order_id_text)], language_code),
                    )
                    .await?;
                }
                Err(_) => {
                    bot.send_message(
                        msg.chat.id,
                        t_args_lang(l10n, "order-photo-failed", &[("order_id", &order_id_text)], language_code),
                    )
                    .await?;
                }
            }
        }
        PhotoTarget::Profile => {
            if let Some(BotDialogueState::AwaitingStatusPhoto { order_id }) = state {
                debug!(user_id, order_id, "Photo from non-staff member kept as profile photo");
            }
            let saved = with_file_manager(&ctx.file_manager, move |fm| {
                photo.save_as_profile_photo(fm, user_id)
            })
            .await;

            match saved {
                Ok(relative_path) => {
                    ctx.photo_index.record_profile_photo(user_id, relative_path).await;
                    bot.send_message(msg.chat.id, t_lang(l10n, "profile-photo-saved", language_code))
                        .await?;
                }
                Err(_) => {
                    bot.send_message(msg.chat.id, t_lang(l10n, "profile-photo-failed", language_code))
                        .await?;
                }
            }
        }
    }

    Ok(())
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<()> {
    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");
    bot.send_message(
        msg.chat.id,
        t_lang(&ctx.localization, "unsupported-message", sender_language(msg)),
    )
    .await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: BotDialogue,
    ctx: Arc<BotContext>,
) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, text, &dialogue, &ctx).await?;
    } else if let Some(incoming) = IncomingPhoto::from_message(&msg) {
        handle_photo_message(&bot, &msg, incoming, &dialogue, &ctx).await?;
    } else {
        handle_unsupported_message(&bot, &msg, &ctx).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_target_requires_staff_for_orders() {
        let awaiting = BotDialogueState::AwaitingStatusPhoto { order_id: 7 };

        assert_eq!(photo_target(Some(&awaiting), true), PhotoTarget::OrderStatus(7));
        assert_eq!(photo_target(Some(&awaiting), false), PhotoTarget::Profile);
    }

    #[test]
    fn test_photo_target_defaults_to_profile() {
        assert_eq!(photo_target(None, true), PhotoTarget::Profile);
        assert_eq!(photo_target(Some(&BotDialogueState::Start), true), PhotoTarget::Profile);
        assert_eq!(photo_target(Some(&BotDialogueState::Start), false), PhotoTarget::Profile);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/start"), Some(("/start", "")));
        assert_eq!(split_command("/order 12"), Some(("/order", "12")));
        assert_eq!(split_command("/order@CakeShopBot  #12 "), Some(("/order", "#12")));
        assert_eq!(split_command("  /help"), Some(("/help", "")));
        assert_eq!(split_command("hello"), None);
    }
}
