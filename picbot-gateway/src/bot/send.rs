//! Image upload and m.image message assembly.

use std::path::Path;

use image::ImageReader;
use tracing::warn;

use super::{Bot, BotError};
use crate::matrix::RoomApi;

/// What the homeserver wants to know about an image before display.
pub(crate) struct ImageInfo {
    pub mime: String,
    pub width: u32,
    pub height: u32,
    pub size: u64,
}

/// Probe a file's format and dimensions from its content, not its
/// extension. Returns None for files that are not images.
pub(crate) fn inspect(path: &Path) -> Result<Option<ImageInfo>, BotError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let Some(format) = reader.format() else {
        return Ok(None);
    };
    let mime = format.to_mime_type().to_string();
    let (width, height) = reader.into_dimensions()?;
    let size = std::fs::metadata(path)?.len();

    Ok(Some(ImageInfo {
        mime,
        width,
        height,
        size,
    }))
}

impl<A: RoomApi> Bot<A> {
    /// Upload a pool file and send it as an m.image message.
    ///
    /// Non-image files and failed uploads abort with a warning instead
    /// of an error, so one bad pool entry can't break a handler.
    pub(crate) async fn send_image(&self, room_id: &str, path: &Path) -> Result<(), BotError> {
        let Some(info) = inspect(path)? else {
            warn!("{} is not a recognized image, not sending", path.display());
            return Ok(());
        };

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("image")
            .to_string();

        let bytes = tokio::fs::read(path).await?;
        let uri = match self.api.upload(bytes, &info.mime, &filename).await {
            Ok(uri) => uri,
            Err(err) => {
                warn!("upload of {} failed: {err}", path.display());
                return Ok(());
            }
        };

        let content = serde_json::json!({
            "msgtype": "m.image",
            "body": filename,
            "url": uri,
            "info": {
                "size": info.size,
                "mimetype": info.mime,
                "w": info.width,
                "h": info.height,
            },
        });
        self.api.send_message(room_id, &content).await?;
        Ok(())
    }
}
