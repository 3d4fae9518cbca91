use std::path::Path;

use base64::Engine;

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// Encode image bytes as a JPEG data URL.
pub fn encode_data_url(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))
}

/// Strip a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(text: &str) -> &str {
    let text = text.trim();
    if text.starts_with("data:") {
        if let Some((_, encoded)) = text.split_once(',') {
            return encoded;
        }
    }
    text
}

/// Decode base64 text, with or without a data URL prefix.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, DecodeError> {
    BASE64
        .decode(strip_data_url(text).trim())
        .map_err(DecodeError::Base64)
}

/// Decode image bytes and save them to `path`, re-encoding for the path's extension.
///
/// Parent directories are created as needed.
pub fn save_decoded_image(bytes: &[u8], path: &Path) -> Result<(), DecodeError> {
    let image = image::load_from_memory(bytes).map_err(DecodeError::Image)?;
    ensure_parent_dir(path)?;
    image.save(path).map_err(DecodeError::Image)?;
    tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "Image saved");
    Ok(())
}

/// Write bytes verbatim to `path`, creating parent directories.
pub fn write_bytes(bytes: &[u8], path: &Path) -> Result<(), std::io::Error> {
    ensure_parent_dir(path)?;
    std::fs::write(path, bytes)
}

fn ensure_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image could not be decoded or written: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unexpected response payload: {0}")]
    UnexpectedShape(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
