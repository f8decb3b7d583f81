//! The permission collaborator.
//!
//! Capability evaluation lives outside this subsystem; it is consulted as a
//! yes/no answer before any write.

use std::future::Future;

use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::document::AuthorId;

/// A capability checked before a mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
  /// Commit new content or restore an earlier version.
  #[strum(serialize = "write to")]
  Write,
  #[strum(serialize = "change the mode of")]
  ChangeMode,
}

/// Answers capability questions for an acting user.
pub trait Permissions: Send + Sync {
  fn can_write<'a>(
    &'a self,
    document_id: Uuid,
    author_id: &'a AuthorId,
  ) -> impl Future<Output = bool> + Send + 'a;

  fn can_change_mode<'a>(
    &'a self,
    document_id: Uuid,
    author_id: &'a AuthorId,
  ) -> impl Future<Output = bool> + Send + 'a;

  /// Dispatch on a [`Capability`].
  fn allows<'a>(
    &'a self,
    capability: Capability,
    document_id: Uuid,
    author_id: &'a AuthorId,
  ) -> impl Future<Output = bool> + Send + 'a {
    async move {
      match capability {
        Capability::Write => self.can_write(document_id, author_id).await,
        Capability::ChangeMode => {
          self.can_change_mode(document_id, author_id).await
        }
      }
    }
  }
}

/// Grants every capability to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
  async fn can_write<'a>(&'a self, _: Uuid, _: &'a AuthorId) -> bool { true }

  async fn can_change_mode<'a>(&'a self, _: Uuid, _: &'a AuthorId) -> bool {
    true
  }
}
