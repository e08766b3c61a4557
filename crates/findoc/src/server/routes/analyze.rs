//! Document submission endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::SubmitResponse;

/// POST /analyze - Upload a document with a query for background analysis
pub async fn analyze_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut query = String::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        Error::validation(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "upload.pdf".to_string());
                let data = field.bytes().await.map_err(|e| {
                    Error::validation(format!("Failed to read file: {}", e))
                })?;
                file = Some((file_name, data.to_vec()));
            }
            "query" => {
                query = field.text().await.map_err(|e| {
                    Error::validation(format!("Failed to read query: {}", e))
                })?;
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let (file_name, data) = file.ok_or_else(|| Error::validation("Missing 'file' field"))?;

    tracing::info!("Received '{}' ({} bytes) for analysis", file_name, data.len());

    let response = state.submissions().submit(&file_name, &data, &query).await?;
    Ok(Json(response))
}
