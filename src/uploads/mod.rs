// Image upload storage: multipart image parts land in the configured
// upload directory and are referenced by their public path.

use std::path::Path;

use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

/// File extension for an accepted image content type; anything else is
/// refused.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Write an uploaded image under the upload directory and return its
/// public path (`/uploads/<uuid>.<ext>`).
pub async fn save_image(bytes: &[u8], content_type: &str) -> Result<String, ApiError> {
    let ext = extension_for(content_type)
        .ok_or_else(|| ApiError::bad_request("Unsupported image type."))?;

    let dir = &config::config().uploads.dir;
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        tracing::error!("failed to create upload directory {}: {}", dir, e);
        ApiError::internal("Failed to store the uploaded image.")
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = Path::new(dir).join(&file_name);
    tokio::fs::write(&path, bytes).await.map_err(|e| {
        tracing::error!("failed to write upload {}: {}", path.display(), e);
        ApiError::internal("Failed to store the uploaded image.")
    })?;

    Ok(format!("/uploads/{}", file_name))
}

/// Absolute URL for a stored public path.
pub fn public_url(path: &str) -> String {
    let base = config::config()
        .uploads
        .public_base_url
        .trim_end_matches('/');
    format!("{}{}", base, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_image_content_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/webp"), Some("webp"));
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn public_url_joins_base_and_path() {
        let url = public_url("/uploads/abc.png");
        assert!(url.ends_with("/uploads/abc.png"));
        assert!(!url.contains("//uploads"));
    }
}
