//! Loading files as message attachments.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use questro_types::Attachment;

/// MIME type for a file, from its extension.
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("txt" | "md") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Read a file and encode it as an [`Attachment`].
pub async fn load_attachment(path: &Path) -> std::io::Result<Attachment> {
    let bytes = tokio::fs::read(path).await?;
    Ok(Attachment::new(STANDARD.encode(bytes), mime_type(path)))
}
