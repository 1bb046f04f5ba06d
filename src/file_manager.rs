//! # File Manager Module
//!
//! Stores and retrieves user profile photos and order status photos.
//!
//! Saved photos are reported back as paths relative to the resolver's base
//! directory; callers persist that string and hand it back on lookup.
//!
//! # Naming
//!
//! - Profile photos: `profile_<YYYYMMDD_HHMMSS>.jpg`, one live file per user
//! - Status photos: `status_photo_<YYYYMMDD_HHMMSS><ext>`, all kept
//!
//! Names are unique only per second: two saves for the same user or order
//! within one second write to the same file and the later one wins.
//!
//! # Concurrency
//!
//! All operations are blocking and take no locks. Concurrent saves for the
//! same user can race between write and cleanup, so callers must serialize
//! per-entity access themselves.

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

use crate::config::PathResolver;
use crate::file_errors::FileManagerError;

pub const PROFILE_PHOTO_PREFIX: &str = "profile_";
pub const STATUS_PHOTO_PREFIX: &str = "status_photo_";
pub const DEFAULT_PHOTO_EXTENSION: &str = ".jpg";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

static PROFILE_PHOTO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^profile_.*\.jpg$").expect("profile photo pattern is a valid regex")
});

/// Source of the current local time used in generated file names
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Photo payload handed over by the caller
pub enum ByteSource {
    /// Fully downloaded buffer
    Bytes(Vec<u8>),
    /// Readable handle, copied to disk as it is read
    Stream(Box<dyn Read + Send>),
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ByteSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ByteSource::Stream(_) => write!(f, "Stream"),
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(bytes: Vec<u8>) -> Self {
        ByteSource::Bytes(bytes)
    }
}

/// Whether a file name follows the `profile_*.jpg` pattern
pub fn is_profile_photo_name(name: &str) -> bool {
    PROFILE_PHOTO_PATTERN.is_match(name)
}

/// Extension (with leading dot) to use for a status photo
///
/// Falls back to `.jpg` when the original name is missing, has no extension,
/// or the extension is not plain ASCII alphanumerics.
pub fn status_photo_extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_PHOTO_EXTENSION.to_string())
}

/// Saves, cleans up and locates stored photos
pub struct FileManager {
    resolver: Arc<dyn PathResolver>,
    clock: Clock,
}

impl FileManager {
    /// Create a file manager that names files after the local wall clock
    pub fn new(resolver: Arc<dyn PathResolver>) -> Self {
        Self::with_clock(resolver, Arc::new(|| Local::now().naive_local()))
    }

    /// Create a file manager with an explicit time source
    pub fn with_clock(resolver: Arc<dyn PathResolver>, clock: Clock) -> Self {
        Self { resolver, clock }
    }

    fn timestamp(&self) -> String {
        (self.clock)().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Save a new profile photo and delete the user's previous ones
    ///
    /// `filename` is accepted for symmetry with status photos; profile photos
    /// are always stored as `.jpg`.
    ///
    /// # Returns
    ///
    /// The stored path relative to the base directory, e.g.
    /// `users/42/profile_20240101_100000.jpg`
    pub fn save_user_profile_photo(
        &self,
        user_id: i64,
        photo_data: ByteSource,
        filename: Option<&str>,
    ) -> Result<String, FileManagerError> {
        let photo_name = format!("{PROFILE_PHOTO_PREFIX}{}.jpg", self.timestamp());
        debug!(user_id, photo_name = %photo_name, original_name = ?filename, "Saving profile photo");

        let result = self
            .resolver
            .user_path(user_id, Some(&photo_name))
            .and_then(|path| {
                write_photo(&path, photo_data)?;
                self.relative_to_base(&path)
            });

        match result {
            Ok(relative) => {
                self.cleanup_old_profile_photos(user_id, &photo_name);
                info!(user_id, path = %relative, "Profile photo saved");
                Ok(relative)
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to save profile photo");
                Err(e)
            }
        }
    }

    /// Delete every `profile_*.jpg` of the user except `keep_current`
    ///
    /// Best effort: failures are logged and never fail the save.
    fn cleanup_old_profile_photos(&self, user_id: i64, keep_current: &str) {
        let dir = match self.resolver.user_path(user_id, None) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(user_id, error = %e, "Cannot resolve user directory for cleanup");
                return;
            }
        };

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id, error = %e, "Cannot list user directory for cleanup");
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name == keep_current || !is_profile_photo_name(name) {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => debug!(user_id, removed = %name, "Removed old profile photo"),
                Err(e) => warn!(user_id, file = %name, error = %e, "Failed to remove old profile photo"),
            }
        }
    }

    /// Locate the user's current profile photo
    ///
    /// A stored relative path that still points at a file wins. Otherwise the
    /// user directory is scanned and the greatest `profile_*.jpg` name, which
    /// is the newest given the fixed-width timestamp, is returned.
    pub fn get_user_profile_photo_path(
        &self,
        user_id: i64,
        relative_path: Option<&str>,
    ) -> Result<PathBuf, FileManagerError> {
        if let Some(stored) = relative_path.and_then(|rel| self.resolver.resolve_relative_path(rel)) {
            if stored.is_file() {
                return Ok(stored);
            }
            debug!(user_id, path = %stored.display(), "Stored profile photo missing, scanning directory");
        }

        let dir = self
            .resolver
            .user_path(user_id, None)
            .inspect_err(|e| error!(user_id, error = %e, "Cannot resolve user photo directory"))?;
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FileManagerError::NotFound(format!(
                    "no photo directory for user {user_id}"
                )));
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to list user photo directory");
                return Err(e.into());
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| is_profile_photo_name(name))
            .max()
            .map(|name| dir.join(name))
            .ok_or_else(|| FileManagerError::NotFound(format!("no profile photo for user {user_id}")))
    }

    /// Save a status photo for an order; earlier status photos are kept
    ///
    /// `filename` only contributes its extension, see [`status_photo_extension`].
    pub fn save_order_status_photo(
        &self,
        order_id: i64,
        photo_data: ByteSource,
        filename: Option<&str>,
    ) -> Result<String, FileManagerError> {
        let photo_name = format!(
            "{STATUS_PHOTO_PREFIX}{}{}",
            self.timestamp(),
            status_photo_extension(filename)
        );
        debug!(order_id, photo_name = %photo_name, "Saving order status photo");

        let result = self
            .resolver
            .order_status_photos_path(order_id, &photo_name)
            .and_then(|path| {
                write_photo(&path, photo_data)?;
                self.relative_to_base(&path)
            });

        match result {
            Ok(relative) => {
                info!(order_id, path = %relative, "Order status photo saved");
                Ok(relative)
            }
            Err(e) => {
                error!(order_id, error = %e, "Failed to save order status photo");
                Err(e)
            }
        }
    }

    /// Resolve a stored status photo path without touching the filesystem
    pub fn get_order_status_photo_path(
        &self,
        order_id: i64,
        relative_path: &str,
    ) -> Result<PathBuf, FileManagerError> {
        self.resolver
            .resolve_relative_path(relative_path)
            .ok_or_else(|| {
                error!(order_id, path = %relative_path, "Cannot resolve order status photo path");
                FileManagerError::ResolutionFailed(relative_path.to_string())
            })
    }

    /// Whether a stored relative path points at an existing regular file
    pub fn file_exists(&self, relative_path: &str) -> bool {
        self.resolver
            .resolve_relative_path(relative_path)
            .is_some_and(|path| path.is_file())
    }

    /// Express an absolute location relative to the base directory with `/` separators
    fn relative_to_base(&self, path: &Path) -> Result<String, FileManagerError> {
        let relative = path.strip_prefix(self.resolver.base_dir()).map_err(|_| {
            FileManagerError::ResolutionFailed(format!(
                "{} is outside the base directory",
                path.display()
            ))
        })?;

        let parts = relative
            .components()
            .map(|component| {
                component.as_os_str().to_str().ok_or_else(|| {
                    FileManagerError::ResolutionFailed(format!(
                        "non UTF-8 path: {}",
                        path.display()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(parts.join("/"))
    }
}

/// Write a photo to `path`, replacing any existing file of that name
///
/// Bytes land in a temporary file next to `path` that is renamed into place
/// only once fully written, so a failed write never leaves a partial photo
/// under its final name.
fn write_photo(path: &Path, photo_data: ByteSource) -> Result<(), FileManagerError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .map_err(|e| FileManagerError::Io(format!("cannot create {}: {e}", parent.display())))?;

    let io_error = |e: io::Error| FileManagerError::Io(format!("cannot write {}: {e}", path.display()));
    let mut staged = NamedTempFile::new_in(parent).map_err(io_error)?;
    match photo_data {
        ByteSource::Bytes(bytes) => staged.write_all(&bytes).map_err(io_error)?,
        ByteSource::Stream(mut reader) => {
            io::copy(&mut reader, &mut staged).map_err(io_error)?;
        }
    }
    staged.flush().map_err(io_error)?;

    staged
        .persist(path)
        .map(|_| ())
        .map_err(|e| io_error(e.error))
}
