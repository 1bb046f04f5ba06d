//! Typed inline keyboard callback tags

/// Action encoded in an inline button's callback data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Show the recipe list
    Recipes,
    /// Show one recipe by id
    Recipe(String),
    /// Start attaching a status photo to an order
    OrderUpload(i64),
    /// Send every stored status photo of an order
    OrderPhotos(i64),
    /// Leave the current order flow
    OrderCancel,
}

impl CallbackAction {
    /// Parse callback data, `None` for unknown or malformed tags
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "recipes" => return Some(Self::Recipes),
            "order_cancel" => return Some(Self::OrderCancel),
            _ => {}
        }

        let (tag, value) = data.split_once(':')?;
        match tag {
            "recipe" if !value.is_empty() => Some(Self::Recipe(value.to_string())),
            "order_upload" => value.parse().ok().map(Self::OrderUpload),
            "order_photos" => value.parse().ok().map(Self::OrderPhotos),
            _ => None,
        }
    }

    /// Render as callback data
    pub fn to_data(&self) -> String {
        match self {
            Self::Recipes => "recipes".to_string(),
            Self::Recipe(id) => format!("recipe:{id}"),
            Self::OrderUpload(order_id) => format!("order_upload:{order_id}"),
            Self::OrderPhotos(order_id) => format!("order_photos:{order_id}"),
            Self::OrderCancel => "order_cancel".to_string(),
        }
    }
}
