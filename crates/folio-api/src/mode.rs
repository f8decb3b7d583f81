//! `POST /documents/:id/mode` with body `{"mode":"beta"}`.
//!
//! Returns 201 + the transition version, 422 if the document is already in
//! that mode.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  content::ContentBackend, mode::Mode, permission::Permissions,
  store::VersionStore,
};
use folio_service::VersionService;
use serde::Deserialize;
use uuid::Uuid;

use crate::{actor::Actor, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
  /// Parsed by [`Mode::parse`] so an unknown name maps to a domain error.
  pub mode: String,
}

pub async fn transition<S, C, P>(
  State(service): State<Arc<VersionService<S, C, P>>>,
  Path(id): Path<Uuid>,
  Actor(author): Actor,
  Json(body): Json<TransitionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: VersionStore,
  C: ContentBackend,
  P: Permissions,
{
  let target = Mode::parse(&body.mode)?;
  let version = service.transition_mode(id, target, author).await?;
  Ok((StatusCode::CREATED, Json(version)))
}
