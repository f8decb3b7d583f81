//! Folio HTTP server: configuration, role permissions and the top-level
//! router.

pub mod permissions;

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use folio_core::{content::ContentBackend, store::VersionStore};
use folio_service::{ServiceConfig, VersionService};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use permissions::{PermissionsConfig, RolePermissions};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FOLIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  #[serde(default)]
  pub versioning:  ServiceConfig,
  #[serde(default)]
  pub permissions: PermissionsConfig,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn router<S, C>(service: Arc<VersionService<S, C, RolePermissions>>) -> Router
where
  S: VersionStore + 'static,
  C: ContentBackend + 'static,
{
  folio_api::api_router(service).layer(TraceLayer::new_for_http())
}
