//! Handlers for `/documents` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/documents` | Body: `{"content":"<base64>"}`; returns 201 + document and version 1 |
//! | `GET`  | `/documents/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use folio_core::{
  content::ContentBackend,
  document::{Document, DocumentVersion},
  permission::Permissions,
  store::VersionStore,
};
use folio_service::VersionService;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

/// Decode a base64 `content` field from a request body.
pub(crate) fn decode_content(encoded: &str) -> Result<Bytes, ApiError> {
  B64
    .decode(encoded)
    .map(Bytes::from)
    .map_err(|e| ApiError::BadRequest(format!("content is not valid base64: {e}")))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Base64-encoded initial content.
  pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub document: Document,
  pub version:  DocumentVersion,
}

/// `POST /documents`. The caller becomes the owner.
pub async fn create<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Actor(owner): Actor,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let content = decode_content(&body.content)?;
  let (document, version) = service.create_document(owner, content).await?;
  Ok((StatusCode::CREATED, Json(Created { document, version })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /documents/:id`
pub async fn get_one<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  Ok(Json(service.get_document(id).await?))
}
