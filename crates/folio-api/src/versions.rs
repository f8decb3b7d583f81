//! Handlers for `/documents/:id/versions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents/:id/versions` | Optional `page`, `page_size`, `as_of`; newest first |
//! | `POST` | `/documents/:id/versions` | Body: [`CommitBody`]; returns 201 + new version |
//! | `GET`  | `/documents/:id/versions/:n` | Version metadata |
//! | `GET`  | `/documents/:id/versions/:n/content` | Raw snapshot bytes |
//! | `POST` | `/documents/:id/versions/:n/restore` | Returns 201 + new version |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use folio_core::{
  content::ContentBackend,
  document::DocumentVersion,
  page::{DEFAULT_PAGE_SIZE, Page, VersionQuery},
  permission::Permissions,
  store::VersionStore,
};
use folio_service::VersionService;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Actor, documents::decode_content, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// 1-based; defaults to the first page.
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
  /// Head version the walk is pinned to, echoed back by the first page.
  pub as_of:     Option<u64>,
}

impl From<ListParams> for VersionQuery {
  fn from(p: ListParams) -> Self {
    VersionQuery {
      page:      p.page.unwrap_or(1),
      page_size: p.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
      as_of:     p.as_of,
    }
  }
}

/// `GET /documents/:id/versions[?page=..][&page_size=..][&as_of=..]`
pub async fn list<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<DocumentVersion>>, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  Ok(Json(service.list_versions(id, params.into()).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /documents/:id/versions/:n`
pub async fn get_one<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path((id, number)): Path<(Uuid, u64)>,
) -> Result<Json<DocumentVersion>, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  Ok(Json(service.get_version(id, number).await?))
}

/// `GET /documents/:id/versions/:n/content`
pub async fn content<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path((id, number)): Path<(Uuid, u64)>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let bytes = service.read_content(id, number).await?;
  Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

// ─── Commit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommitBody {
  /// Base64-encoded snapshot.
  pub content:        String,
  pub change_summary: String,
}

/// `POST /documents/:id/versions`
pub async fn commit<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path(id): Path<Uuid>,
  Actor(author): Actor,
  Json(body): Json<CommitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let content = decode_content(&body.content)?;
  let version = service
    .commit(id, content, author, &body.change_summary)
    .await?;
  Ok((StatusCode::CREATED, Json(version)))
}

// ─── Restore ──────────────────────────────────────────────────────────────────

/// `POST /documents/:id/versions/:n/restore`
pub async fn restore<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path((id, number)): Path<(Uuid, u64)>,
  Actor(author): Actor,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let version = service.restore(id, number, author).await?;
  Ok((StatusCode::CREATED, Json(version)))
}
