//! # Configuration Module
//!
//! Environment-driven application configuration and the storage layout used
//! for user and order photos.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::file_errors::FileManagerError;

// Constants for storage layout
pub const DEFAULT_DATA_DIR: &str = "data";
pub const USERS_DIR: &str = "users";
pub const ORDERS_DIR: &str = "orders";
pub const STATUS_PHOTOS_DIR: &str = "status_photos";

/// Translates user ids, order ids and stored relative paths into filesystem locations
pub trait PathResolver: Send + Sync {
    /// Directory every stored relative path is expressed against
    fn base_dir(&self) -> &Path;

    /// User directory, or a file inside it when `filename` is given
    fn user_path(&self, user_id: i64, filename: Option<&str>) -> Result<PathBuf, FileManagerError>;

    /// Location of a status photo file for an order
    fn order_status_photos_path(
        &self,
        order_id: i64,
        filename: &str,
    ) -> Result<PathBuf, FileManagerError>;

    /// Absolute location of a stored relative path, `None` if it would escape the base directory
    fn resolve_relative_path(&self, relative_path: &str) -> Option<PathBuf>;
}

/// Filesystem layout rooted at a base data directory
///
/// ```text
/// <base>/users/<user_id>/profile_<YYYYMMDD_HHMMSS>.jpg
/// <base>/orders/<order_id>/status_photos/status_photo_<YYYYMMDD_HHMMSS><ext>
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    base_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding all status photos of one order
    pub fn order_status_photos_dir(&self, order_id: i64) -> PathBuf {
        self.base_dir
            .join(ORDERS_DIR)
            .join(order_id.to_string())
            .join(STATUS_PHOTOS_DIR)
    }
}

/// A file name must be a single normal path component
fn validate_filename(filename: &str) -> Result<(), FileManagerError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(FileManagerError::ResolutionFailed(format!(
            "invalid file name: {filename}"
        ))),
    }
}

impl PathResolver for StorageConfig {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn user_path(&self, user_id: i64, filename: Option<&str>) -> Result<PathBuf, FileManagerError> {
        let dir = self.base_dir.join(USERS_DIR).join(user_id.to_string());
        match filename {
            Some(name) => {
                validate_filename(name)?;
                Ok(dir.join(name))
            }
            None => Ok(dir),
        }
    }

    fn order_status_photos_path(
        &self,
        order_id: i64,
        filename: &str,
    ) -> Result<PathBuf, FileManagerError> {
        validate_filename(filename)?;
        Ok(self.order_status_photos_dir(order_id).join(filename))
    }

    fn resolve_relative_path(&self, relative_path: &str) -> Option<PathBuf> {
        if relative_path.trim().is_empty() {
            return None;
        }

        let mut resolved = self.base_dir.clone();
        for component in Path::new(relative_path).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        if resolved == self.base_dir {
            return None;
        }
        Some(resolved)
    }
}

/// Runtime configuration validated at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub storage: StorageConfig,
    /// Telegram user ids allowed to attach status photos to orders
    pub staff_ids: Vec<i64>,
}

impl AppConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// The data directory is created when missing and canonicalized so that
    /// relative paths handed out later are stable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .context("TELEGRAM_BOT_TOKEN must be set")?;

        let data_dir = lookup("DATA_DIR")
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {data_dir}"))?;
        let base_dir = std::fs::canonicalize(&data_dir)
            .with_context(|| format!("Failed to resolve data directory {data_dir}"))?;

        let staff_ids = match lookup("STAFF_IDS") {
            Some(raw) => parse_staff_ids(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bot_token,
            storage: StorageConfig::new(base_dir),
            staff_ids,
        })
    }
}

/// Parse a comma-separated list of Telegram user ids
pub fn parse_staff_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .with_context(|| format!("Invalid staff id in STAFF_IDS: {part}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_path_layout() {
        let storage = StorageConfig::new("/srv/bakery");
        assert_eq!(
            storage.user_path(42, None).unwrap(),
            PathBuf::from("/srv/bakery/users/42")
        );
        assert_eq!(
            storage.user_path(42, Some("profile_20240101_100000.jpg")).unwrap(),
            PathBuf::from("/srv/bakery/users/42/profile_20240101_100000.jpg")
        );
    }

    #[test]
    fn test_order_path_layout() {
        let storage = StorageConfig::new("/srv/bakery");
        assert_eq!(
            storage
                .order_status_photos_path(7, "status_photo_20240101_100000.png")
                .unwrap(),
            PathBuf::from("/srv/bakery/orders/7/status_photos/status_photo_20240101_100000.png")
        );
    }

    #[test]
    fn test_filename_must_be_single_component() {
        let storage = StorageConfig::new("/srv/bakery");
        assert!(storage.user_path(1, Some("../x.jpg")).is_err());
        assert!(storage.user_path(1, Some("a/b.jpg")).is_err());
        assert!(storage.order_status_photos_path(1, "").is_err());
    }

    #[test]
    fn test_resolve_relative_path() {
        let storage = StorageConfig::new("/srv/bakery");
        assert_eq!(
            storage.resolve_relative_path("users/42/profile_20240101_100000.jpg"),
            Some(PathBuf::from("/srv/bakery/users/42/profile_20240101_100000.jpg"))
        );
        assert_eq!(
            storage.resolve_relative_path("./users/42"),
            Some(PathBuf::from("/srv/bakery/users/42"))
        );
    }

    #[test]
    fn test_resolve_rejects_escaping_paths() {
        let storage = StorageConfig::new("/srv/bakery");
        assert_eq!(storage.resolve_relative_path(""), None);
        assert_eq!(storage.resolve_relative_path("   "), None);
        assert_eq!(storage.resolve_relative_path("."), None);
        assert_eq!(storage.resolve_relative_path("../secrets"), None);
        assert_eq!(storage.resolve_relative_path("users/../../etc"), None);
        assert_eq!(storage.resolve_relative_path("/etc/passwd"), None);
    }

    #[test]
    fn test_parse_staff_ids() {
        assert_eq!(parse_staff_ids("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_staff_ids("").unwrap(), Vec::<i64>::new());
        assert!(parse_staff_ids("1,baker").is_err());
    }
}
