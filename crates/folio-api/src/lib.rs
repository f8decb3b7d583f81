//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by a [`VersionService`]. The acting user
//! is named by the `X-Author-Id` header; authentication, TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", folio_api::api_router(service.clone()))
//! ```

pub mod actor;
pub mod documents;
pub mod error;
pub mod mode;
pub mod versions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use folio_core::{
  content::ContentBackend, permission::Permissions, store::VersionStore,
};
use folio_service::VersionService;

pub use actor::{AUTHOR_HEADER, Actor};
pub use error::ApiError;

/// Build a fully-materialised API router for `service`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C, P>(service: Arc<VersionService<S, C, P>>) -> Router<()>
where
  S: VersionStore + 'static,
  C: ContentBackend + 'static,
  P: Permissions + 'static,
{
  Router::new()
    // Documents
    .route("/documents", post(documents::create::<S, C, P>))
    .route("/documents/{id}", get(documents::get_one::<S, C, P>))
    // Versions
    .route(
      "/documents/{id}/versions",
      get(versions::list::<S, C, P>).post(versions::commit::<S, C, P>),
    )
    .route("/documents/{id}/versions/{n}", get(versions::get_one::<S, C, P>))
    .route(
      "/documents/{id}/versions/{n}/content",
      get(versions::content::<S, C, P>),
    )
    .route(
      "/documents/{id}/versions/{n}/restore",
      post(versions::restore::<S, C, P>),
    )
    // Mode
    .route("/documents/{id}/mode", post(mode::transition::<S, C, P>))
    .with_state(service)
}
