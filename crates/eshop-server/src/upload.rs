use std::path::Path;

use crate::error::{AppError, AppResult};

/// Writes an uploaded image to the upload directory and returns the
/// relative path stored on the user row (`images/<file>`). The filename
/// mixes the uploader's email-local-part, the form field name and a
/// millisecond timestamp.
pub fn store_image(
    upload_dir: &str,
    email: &str,
    field_name: &str,
    original_name: &str,
    data: &[u8],
) -> AppResult<String> {
    let user_prefix = email.split('@').next().unwrap_or_default();
    // A dotless name serves as its own extension
    let ext = original_name.rsplit('.').next().unwrap_or_default();
    let timestamp = chrono::Utc::now().timestamp_millis();
    let filename = format!("{user_prefix}-{field_name}-{timestamp}.{ext}");

    std::fs::create_dir_all(upload_dir)
        .map_err(|e| AppError::Internal(format!("upload dir: {e}")))?;
    let path = Path::new(upload_dir).join(&filename);
    std::fs::write(&path, data).map_err(|e| AppError::Internal(format!("upload write: {e}")))?;

    Ok(format!("images/{filename}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_file_and_returns_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        let rel = store_image(
            dir.path().to_str().unwrap(),
            "jonas@shop.lt",
            "img",
            "avatar.png",
            b"png-bytes",
        )
        .unwrap();

        assert!(rel.starts_with("images/jonas-img-"));
        assert!(rel.ends_with(".png"));

        let filename = rel.strip_prefix("images/").unwrap();
        let written = std::fs::read(dir.path().join(filename)).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[test]
    fn dotless_name_becomes_the_extension() {
        let dir = tempfile::tempdir().unwrap();
        let rel = store_image(dir.path().to_str().unwrap(), "a@b.lt", "img", "avatar", b"x")
            .unwrap();
        assert!(rel.starts_with("images/a-img-"));
        assert!(rel.ends_with(".avatar"));
    }
}
