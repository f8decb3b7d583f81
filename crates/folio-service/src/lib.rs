//! The Folio version service: the public façade over a
//! [`VersionStore`](folio_core::store::VersionStore), a
//! [`ContentBackend`](folio_core::content::ContentBackend) and a
//! [`Permissions`](folio_core::permission::Permissions) collaborator.
//!
//! Every mutating operation runs its read-compute-append cycle under a
//! per-document lock and hands the store the version number it read, so two
//! writers can never be assigned the same version.

pub mod config;
pub mod lock;
pub mod pager;
pub mod service;

pub use config::{ConflictPolicy, ServiceConfig};
pub use pager::VersionPager;
pub use service::VersionService;

#[cfg(test)]
mod tests;
