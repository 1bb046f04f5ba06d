//! Conversation state kept per chat.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Represents where a chat is in the conversation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDialogueState {
    #[default]
    Start,
    /// A staff member chose to attach the next photo to this order
    AwaitingStatusPhoto { order_id: i64 },
}

/// Type alias for our bot dialogue
pub type BotDialogue = Dialogue<BotDialogueState, InMemStorage<BotDialogueState>>;

/// Parse the argument of `/order <number>`, accepting an optional leading `#`
pub fn parse_order_id(input: &str) -> Option<i64> {
    input
        .trim()
        .trim_start_matches('#')
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
}
