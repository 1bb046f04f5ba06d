//! In-process record of stored photo paths.
//!
//! Keeps the relative paths returned by the file manager so they can be
//! handed back on lookup: one profile photo per user, an ordered list of
//! status photos per order.

use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct PhotoIndex {
    profiles: RwLock<HashMap<i64, String>>,
    order_photos: RwLock<HashMap<i64, Vec<String>>>,
}

impl PhotoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the user's profile photo record
    pub async fn record_profile_photo(&self, user_id: i64, relative_path: String) {
        self.profiles.write().await.insert(user_id, relative_path);
    }

    pub async fn profile_photo(&self, user_id: i64) -> Option<String> {
        self.profiles.read().await.get(&user_id).cloned()
    }

    /// Append a status photo to the order's history
    pub async fn record_status_photo(&self, order_id: i64, relative_path: String) {
        self.order_photos
            .write()
            .await
            .entry(order_id)
            .or_default()
            .push(relative_path);
    }

    pub async fn status_photos(&self, order_id: i64) -> Vec<String> {
        self.order_photos
            .read()
            .await
            .get(&order_id)
            .cloned()
            .unwrap_or_default()
    }
}
