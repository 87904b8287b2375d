//! Bulk import/export of employee records. Everything here consumes the
//! rows produced by the export query or feeds attribute sets into the
//! generic record handler; the formats themselves carry no business logic.

pub mod csv;
pub mod excel;
pub mod pdf;

use axum::http::HeaderMap;
use bytes::Bytes;

/// Pull the uploaded `file` part out of a multipart request body.
pub async fn extract_upload(headers: &HeaderMap, body: Bytes) -> Result<Bytes, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        if field.name() == Some("file") {
            return field
                .bytes()
                .await
                .map_err(|e| format!("File read error: {e}"));
        }
    }

    Err("Please upload a file".to_string())
}
