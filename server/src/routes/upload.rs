//! Training image upload endpoint.

use crate::routes::error_response;
use crate::state::SharedState;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use ecosort_core::{Category, Error};
use rand::Rng;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub category: Category,
    pub stored_count: usize,
    pub paths: Vec<String>,
}

/// POST /upload
///
/// Accepts an optional `category` text field (defaults to Recyclable) and
/// one or more image files under `files`. Uploads land in the pending
/// store and only reach the curated dataset on the next retrain.
pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    let mut category = Category::Recyclable;
    let mut pending: Vec<(Option<String>, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid multipart payload: {}", e),
        )
    })? {
        match field.name() {
            Some("category") => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read category field: {}", e),
                    )
                })?;
                category = text
                    .parse()
                    .map_err(|e: Error| error_response(e))?;
            }
            Some("files") | Some("file") => {
                let filename = field.file_name().map(|s| s.to_string());
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read upload: {}", e),
                    )
                })?;
                pending.push((filename, bytes.to_vec()));
            }
            _ => continue,
        }
    }

    if pending.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No files in upload request".to_string(),
        ));
    }

    let mut paths = Vec::with_capacity(pending.len());
    for (filename, bytes) in pending {
        let path = store_upload(
            &state.config.paths.uploads_dir,
            category,
            filename.as_deref(),
            &bytes,
        )
        .map_err(error_response)?;
        paths.push(path.display().to_string());
    }

    info!("Stored {} upload(s) as {}", paths.len(), category);
    Ok(Json(UploadResponse {
        category,
        stored_count: paths.len(),
        paths,
    }))
}

/// Writes one uploaded image into the pending store under its category,
/// rejecting payloads that do not decode as images.
pub fn store_upload(
    uploads_dir: &Path,
    category: Category,
    filename: Option<&str>,
    bytes: &[u8],
) -> ecosort_core::Result<PathBuf> {
    image::load_from_memory(bytes)
        .map_err(|e| Error::Image(format!("Upload is not a decodable image: {}", e)))?;

    let (stem, ext) = split_filename(filename);
    let dir = uploads_dir.join(category.to_string());
    fs::create_dir_all(&dir)?;

    let tag: u32 = rand::thread_rng().gen();
    let path = dir.join(format!("upload_{}_{:08x}.{}", stem, tag, ext));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Sanitizes a client filename into a safe stem and extension.
fn split_filename(filename: Option<&str>) -> (String, String) {
    let name = filename.unwrap_or("image");
    let path = Path::new(name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(64)
        .collect::<String>();
    let stem = if stem.is_empty() {
        "image".to_string()
    } else {
        stem
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| matches!(e.as_str(), "jpg" | "jpeg" | "png" | "bmp" | "gif"))
        .unwrap_or_else(|| "jpg".to_string());
    (stem, ext)
}
