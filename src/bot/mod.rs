//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: Handles commands, photos and image documents
//! - `callback_handler`: Dispatches inline keyboard callback queries
//! - `callback_data`: Typed callback tags shared by keyboards and the dispatcher
//! - `ui_builder`: Creates keyboards
//! - `media`: Downloads photos and runs file manager calls off the runtime

pub mod callback_data;
pub mod callback_handler;
pub mod media;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use crate::file_manager::FileManager;
use crate::localization::LocalizationManager;
use crate::photo_index::PhotoIndex;
use crate::recipes::RecipeCatalog;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared state injected into every handler
pub struct BotContext {
    pub file_manager: Arc<FileManager>,
    pub photo_index: PhotoIndex,
    pub catalog: RecipeCatalog,
    pub localization: LocalizationManager,
    pub staff_ids: Vec<i64>,
}

impl BotContext {
    pub fn is_staff(&self, user_id: i64) -> bool {
        self.staff_ids.contains(&user_id)
    }
}
