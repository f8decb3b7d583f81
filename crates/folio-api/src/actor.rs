//! The acting user, taken from the `X-Author-Id` header.
//!
//! Authentication happens upstream; this layer only requires that someone
//! is named.

use axum::{extract::FromRequestParts, http::request::Parts};
use folio_core::document::AuthorId;

use crate::error::ApiError;

pub const AUTHOR_HEADER: &str = "x-author-id";

/// Present in a handler means the request named a non-empty author.
#[derive(Debug, Clone)]
pub struct Actor(pub AuthorId);

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let raw = parts
      .headers
      .get(AUTHOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthenticated)?;

    AuthorId::new(raw.trim())
      .map(Actor)
      .map_err(|_| ApiError::Unauthenticated)
  }
}
