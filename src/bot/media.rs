//! Downloading Telegram photos and handing them to the file manager

use anyhow::{Context, Result};
use std::io::Read;
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::file_errors::FileManagerError;
use crate::file_manager::{ByteSource, FileManager};

// Constants for upload validation
pub const FORMAT_DETECTION_BUFFER_SIZE: usize = 32;
pub const MIN_FORMAT_BYTES: usize = 8;

/// Photo attached to a message, either as a compressed photo or as an image document
#[derive(Debug, Clone)]
pub struct IncomingPhoto {
    pub file_id: FileId,
    pub file_name: Option<String>,
    pub is_document: bool,
}

impl IncomingPhoto {
    /// Largest size of a photo message, or an `image/*` document
    pub fn from_message(msg: &Message) -> Option<Self> {
        if let Some(largest_photo) = msg.photo().and_then(|photos| photos.last()) {
            return Some(Self {
                file_id: largest_photo.file.id.clone(),
                file_name: None,
                is_document: false,
            });
        }

        msg.document()
            .filter(|doc| {
                doc.mime_type
                    .as_ref()
                    .is_some_and(|mime_type| mime_type.to_string().starts_with("image/"))
            })
            .map(|doc| Self {
                file_id: doc.file.id.clone(),
                file_name: doc.file_name.clone(),
                is_document: true,
            })
    }
}

/// Check leading bytes against the image formats the bakery accepts
pub fn is_supported_image(header: &[u8]) -> bool {
    if header.len() < MIN_FORMAT_BYTES {
        return false;
    }

    match image::guess_format(header) {
        Ok(format) => matches!(
            format,
            image::ImageFormat::Jpeg
                | image::ImageFormat::Png
                | image::ImageFormat::WebP
                | image::ImageFormat::Bmp
        ),
        Err(_) => false,
    }
}

/// A validated download ready to be stored
pub struct DownloadedPhoto {
    source: ByteSource,
    file_name: Option<String>,
    // Streamed downloads stay on disk until they have been copied
    temp_file: Option<NamedTempFile>,
}

impl DownloadedPhoto {
    /// Wrap an in-memory download, `None` if it is not a supported image
    pub fn from_bytes(bytes: Vec<u8>, file_name: Option<String>) -> Option<Self> {
        let header_len = bytes.len().min(FORMAT_DETECTION_BUFFER_SIZE);
        is_supported_image(&bytes[..header_len]).then(|| Self {
            source: ByteSource::Bytes(bytes),
            file_name,
            temp_file: None,
        })
    }

    /// Wrap a download spooled to a temporary file, `None` if it is not a supported image
    pub fn from_temp_file(temp_file: NamedTempFile, file_name: Option<String>) -> Result<Option<Self>> {
        let mut header = vec![0; FORMAT_DETECTION_BUFFER_SIZE];
        let mut header_reader = temp_file.reopen().context("Failed to reopen downloaded file")?;
        let bytes_read = header_reader.read(&mut header)?;
        header.truncate(bytes_read);

        if !is_supported_image(&header) {
            return Ok(None);
        }

        let reader = temp_file.reopen().context("Failed to reopen downloaded file")?;
        Ok(Some(Self {
            source: ByteSource::Stream(Box::new(reader)),
            file_name,
            temp_file: Some(temp_file),
        }))
    }

    pub fn save_as_profile_photo(
        self,
        file_manager: &FileManager,
        user_id: i64,
    ) -> Result<String, FileManagerError> {
        let result = file_manager.save_user_profile_photo(user_id, self.source, self.file_name.as_deref());
        drop(self.temp_file);
        result
    }

    pub fn save_as_status_photo(
        self,
        file_manager: &FileManager,
        order_id: i64,
    ) -> Result<String, FileManagerError> {
        let result = file_manager.save_order_status_photo(order_id, self.source, self.file_name.as_deref());
        drop(self.temp_file);
        result
    }
}

/// Download a Telegram file fully into memory
pub async fn download_to_memory(bot: &Bot, file_id: FileId) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id).await?;
    let mut buffer = Vec::new();
    bot.download_file(&file.path, &mut buffer)
        .await
        .context("Failed to download photo")?;
    Ok(buffer)
}

/// Async write handle onto a temporary file, sharing its underlying file
pub fn temp_file_writer(temp_file: &NamedTempFile) -> Result<tokio::fs::File> {
    let file = temp_file.reopen().context("Failed to reopen temporary file")?;
    Ok(tokio::fs::File::from_std(file))
}

/// Download a Telegram file into a temporary file
pub async fn download_to_temp_file(bot: &Bot, file_id: FileId) -> Result<NamedTempFile> {
    let file = bot.get_file(file_id).await?;
    let temp_file = NamedTempFile::new()?;
    let mut dst = temp_file_writer(&temp_file)?;

    bot.download_file(&file.path, &mut dst)
        .await
        .context("Failed to download image document")?;
    dst.flush().await?;

    Ok(temp_file)
}

/// Download an incoming photo and validate its format
///
/// Returns `Ok(None)` when the file is not a supported image.
pub async fn fetch_photo(bot: &Bot, incoming: IncomingPhoto) -> Result<Option<DownloadedPhoto>> {
    if incoming.is_document {
        let temp_file = download_to_temp_file(bot, incoming.file_id).await?;
        debug!(temp_path = %temp_file.path().display(), "Image document downloaded");
        DownloadedPhoto::from_temp_file(temp_file, incoming.file_name)
    } else {
        let bytes = download_to_memory(bot, incoming.file_id).await?;
        debug!(bytes = bytes.len(), "Photo downloaded");
        Ok(DownloadedPhoto::from_bytes(bytes, incoming.file_name))
    }
}

/// Run a blocking file manager call off the async runtime
pub async fn with_file_manager<T, F>(file_manager: &Arc<FileManager>, f: F) -> Result<T, FileManagerError>
where
    F: FnOnce(&FileManager) -> Result<T, FileManagerError> + Send + 'static,
    T: Send + 'static,
{
    let file_manager = Arc::clone(file_manager);
    tokio::task::spawn_blocking(move || f(&file_manager))
        .await
        .map_err(|e| FileManagerError::Io(format!("storage task failed: {e}")))?
}
