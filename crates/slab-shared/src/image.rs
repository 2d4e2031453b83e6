//! Inline image encoding for editor uploads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ValidationError;

/// Encode uploaded bytes as a `data:` URI suitable for an entity's `image`
/// field.  Only `image/*` content is accepted, up to `max_size` bytes.
pub fn to_data_uri(mime: &str, bytes: &[u8], max_size: usize) -> Result<String, ValidationError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err(ValidationError::invalid(
            "image",
            format!("unsupported content type '{mime}'"),
        ));
    }
    if bytes.is_empty() {
        return Err(ValidationError::invalid("image", "file is empty"));
    }
    if bytes.len() > max_size {
        return Err(ValidationError::invalid(
            "image",
            format!("file is {} bytes, limit is {max_size}", bytes.len()),
        ));
    }
    Ok(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_IMAGE_SIZE;

    #[test]
    fn png_becomes_data_uri() {
        let uri = to_data_uri("image/png", b"\x89PNG", MAX_IMAGE_SIZE).unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn non_images_and_oversized_files_are_refused() {
        assert!(to_data_uri("text/plain", b"hi", MAX_IMAGE_SIZE).is_err());
        assert!(to_data_uri("image/", b"hi", MAX_IMAGE_SIZE).is_err());
        assert!(to_data_uri("image/jpeg", &[0u8; 11], 10).is_err());
        assert!(to_data_uri("image/gif", b"", MAX_IMAGE_SIZE).is_err());
    }
}
