//! Inline image storage helpers.
//!
//! Uploaded photos are persisted as base64 text next to their mime type, so a
//! student record is self-contained and delete/update paths never have to
//! clean up files on disk.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::utils::errors::AppError;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(encoded: &str) -> Result<Vec<u8>, AppError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| AppError::internal(anyhow::anyhow!("Corrupt stored image: {}", e)))
}

/// Builds a directly embeddable `data:` URL from a stored image.
pub fn to_data_url(mime_type: &str, encoded: &str) -> String {
    format!("data:{};base64,{}", mime_type, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_preserves_bytes() {
        let bytes = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a];
        let encoded = encode(&bytes);
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("not base64 at all!!!").is_err());
    }

    #[test]
    fn data_url_shape() {
        let url = to_data_url("image/png", "iVBORw0KGgo=");
        assert_eq!(url, "data:image/png;base64,iVBORw0KGgo=");
    }
}
