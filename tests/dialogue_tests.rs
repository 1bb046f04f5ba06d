use anyhow::Result;

use confectionery::bot::callback_data::CallbackAction;
use confectionery::dialogue::{parse_order_id, BotDialogueState};

/// Order numbers typed after /order
#[tokio::test]
async fn test_order_number_parsing() -> Result<()> {
    assert_eq!(parse_order_id("42"), Some(42));
    assert_eq!(parse_order_id("#42"), Some(42));
    assert_eq!(parse_order_id("forty-two"), None);

    Ok(())
}

/// Test dialogue state serialization
#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let state = BotDialogueState::AwaitingStatusPhoto { order_id: 15 };

    let json = serde_json::to_string(&state)?;
    let restored: BotDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);

    Ok(())
}

/// Upload buttons lead into the awaiting-photo state for the same order
#[tokio::test]
async fn test_upload_callback_targets_order() -> Result<()> {
    let data = CallbackAction::OrderUpload(15).to_data();

    match CallbackAction::parse(&data) {
        Some(CallbackAction::OrderUpload(order_id)) => {
            let state = BotDialogueState::AwaitingStatusPhoto { order_id };
            assert_eq!(state, BotDialogueState::AwaitingStatusPhoto { order_id: 15 });
        }
        other => panic!("unexpected callback action: {other:?}"),
    }

    Ok(())
}
