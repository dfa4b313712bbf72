use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::db;
use crate::error::ApiError;
use crate::models::{Attachment, AuthUser};
use crate::AppState;

/// POST /api/upload — store the blob on disk keyed by attachment id plus
/// the original extension, and record it. The returned id is what message
/// create accepts as `image`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let field = multipart
        .next_field()
        .await
        .ok()
        .flatten()
        .ok_or_else(|| ApiError::BadRequest("No file provided".into()))?;

    let original_filename = field.file_name().unwrap_or("file").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|_| ApiError::BadRequest("Failed to read file".into()))?;

    let size = data.len() as u64;
    if size > state.config.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "File too large. Max size: {} MB",
            state.config.max_upload_bytes / 1_048_576
        )));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let stored_filename = stored_name(&id, &original_filename);
    let file_path = std::path::Path::new(&state.config.upload_dir).join(&stored_filename);

    if let Some(parent) = file_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }
    tokio::fs::write(&file_path, &data)
        .await
        .map_err(|_| ApiError::BadRequest("Failed to save file".into()))?;

    let result = sqlx::query(
        "INSERT INTO attachments (id, uploader_id, filename, content_type, size, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&original_filename)
    .bind(&content_type)
    .bind(size as i64)
    .bind(db::now_millis())
    .execute(&state.db)
    .await;

    if let Err(err) = result {
        // Clean up the blob on a failed insert
        let _ = tokio::fs::remove_file(&file_path).await;
        return Err(err.into());
    }

    Ok(Json(serde_json::json!({
        "id": id,
        "filename": original_filename,
        "contentType": content_type,
        "size": size,
    })))
}

/// GET /api/files/:id/:filename — the URL shape media references resolve
/// to during feed assembly.
pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path((id, _filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::NotFound("File not found"))?;

    let stored_filename = stored_name(&id, &attachment.filename);
    let file_path = std::path::Path::new(&state.config.upload_dir).join(&stored_filename);

    let file = tokio::fs::File::open(&file_path)
        .await
        .map_err(|_| ApiError::NotFound("File not found on disk"))?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let disposition = if attachment.content_type.starts_with("image/") {
        "inline".to_string()
    } else {
        format!("attachment; filename=\"{}\"", attachment.filename)
    };

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, attachment.content_type),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        body,
    ))
}

fn stored_name(id: &str, original_filename: &str) -> String {
    let ext = original_filename
        .rsplit('.')
        .next()
        .filter(|e| e.len() <= 10 && e.chars().all(|c| c.is_alphanumeric()))
        .unwrap_or("bin");
    format!("{}.{}", id, ext)
}
