use serde::{Deserialize, Serialize};

use crate::services::image_data::{self, DecodeError};

/// Request body for the text-to-image endpoint.
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
}

/// JSON bodies the endpoint is known to return.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EncodedBody {
    Text(String),
    Object { image: String },
}

/// Image payload returned by the text-to-image endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum InferencePayload {
    /// Base64 text, optionally wrapped in a data URL.
    Encoded(String),
    /// Image bytes sent as the response body.
    Raw(Vec<u8>),
}

impl InferencePayload {
    /// Classify a response body.
    ///
    /// `image/*` and `application/octet-stream` content, and bodies that are
    /// not UTF-8, are raw bytes. JSON must be a string or an object with an
    /// `image` string; other shapes fail. Any other text is base64.
    pub fn from_body(content_type: Option<&str>, body: Vec<u8>) -> Result<Self, DecodeError> {
        if content_type.is_some_and(is_binary_content) {
            return Ok(Self::Raw(body));
        }

        let text = match String::from_utf8(body) {
            Ok(text) => text,
            Err(err) => return Ok(Self::Raw(err.into_bytes())),
        };

        let value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => return Ok(Self::Encoded(text.trim().to_string())),
        };

        match serde_json::from_value::<EncodedBody>(value) {
            Ok(EncodedBody::Text(encoded)) | Ok(EncodedBody::Object { image: encoded }) => {
                Ok(Self::Encoded(encoded))
            }
            Err(_) => Err(DecodeError::UnexpectedShape(text.chars().take(200).collect())),
        }
    }

    /// Normalize to image bytes.
    pub fn into_bytes(self) -> Result<Vec<u8>, DecodeError> {
        match self {
            Self::Encoded(text) => image_data::decode_base64(&text),
            Self::Raw(bytes) => Ok(bytes),
        }
    }
}

fn is_binary_content(content_type: &str) -> bool {
    let mime = content_type.trim().to_ascii_lowercase();
    mime.starts_with("image/") || mime.starts_with("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_body() {
        let payload = InferencePayload::from_body(
            Some("application/json"),
            br#""data:image/png;base64,aGVsbG8=""#.to_vec(),
        )
        .unwrap();

        assert_eq!(payload.into_bytes().unwrap(), b"hello");
    }

    #[test]
    fn test_object_body() {
        let payload =
            InferencePayload::from_body(None, br#"{"image": "aGVsbG8="}"#.to_vec()).unwrap();
        assert_eq!(payload, InferencePayload::Encoded("aGVsbG8=".to_string()));
    }

    #[test]
    fn test_raw_body() {
        let png_magic = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let payload = InferencePayload::from_body(Some("image/png"), png_magic.clone()).unwrap();
        assert_eq!(payload.into_bytes().unwrap(), png_magic);

        let payload = InferencePayload::from_body(None, png_magic.clone()).unwrap();
        assert_eq!(payload, InferencePayload::Raw(png_magic));
    }

    #[test]
    fn test_plain_text_body_is_base64() {
        let payload = InferencePayload::from_body(
            Some("text/plain; charset=utf-8"),
            b"data:image/png;base64,aGVsbG8=\n".to_vec(),
        )
        .unwrap();
        assert_eq!(payload, InferencePayload::Encoded("data:image/png;base64,aGVsbG8=".to_string()));
        assert_eq!(payload.into_bytes().unwrap(), b"hello");

        let err = InferencePayload::from_body(Some("text/plain"), b"not an image".to_vec())
            .unwrap()
            .into_bytes()
            .unwrap_err();
        assert!(matches!(err, DecodeError::Base64(_)));
    }

    #[test]
    fn test_octet_stream_body_is_raw() {
        let payload =
            InferencePayload::from_body(Some("application/octet-stream"), b"aGVsbG8=".to_vec())
                .unwrap();
        assert_eq!(payload, InferencePayload::Raw(b"aGVsbG8=".to_vec()));
    }

    #[test]
    fn test_unexpected_json_shape() {
        let err = InferencePayload::from_body(None, br#"{"images": []}"#.to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedShape(_)));

        let err = InferencePayload::from_body(None, b"[1, 2, 3]".to_vec()).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedShape(_)));
    }
}
