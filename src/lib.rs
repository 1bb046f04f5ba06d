//! # Confectionery Telegram Bot
//!
//! A Telegram bot for a cake shop: customers browse recipes and keep a
//! profile photo, staff attach status photos to orders as they progress.

pub mod bot;
pub mod config;
pub mod dialogue;
pub mod file_errors;
pub mod file_manager;
pub mod localization;
pub mod photo_index;
pub mod recipes;
