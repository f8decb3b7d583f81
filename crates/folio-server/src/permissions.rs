//! Role lists from the config file, answering capability checks.

use std::collections::HashSet;

use folio_core::{document::AuthorId, permission::Permissions};
use serde::Deserialize;
use uuid::Uuid;

/// Matches every author in a role list.
pub const WILDCARD: &str = "*";

/// `[permissions]` table. Both lists default to `["*"]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
  pub writers:       Vec<String>,
  pub mode_changers: Vec<String>,
}

impl Default for PermissionsConfig {
  fn default() -> Self {
    Self {
      writers:       vec![WILDCARD.to_owned()],
      mode_changers: vec![WILDCARD.to_owned()],
    }
  }
}

#[derive(Debug, Clone)]
enum Role {
  Anyone,
  Only(HashSet<String>),
}

impl Role {
  fn from_list(list: &[String]) -> Self {
    if list.iter().any(|a| a == WILDCARD) {
      Role::Anyone
    } else {
      Role::Only(list.iter().map(|a| a.trim().to_owned()).collect())
    }
  }

  fn admits(&self, author_id: &AuthorId) -> bool {
    match self {
      Role::Anyone => true,
      Role::Only(members) => members.contains(author_id.as_str()),
    }
  }
}

/// Same answer for every document: membership in the configured role.
#[derive(Debug, Clone)]
pub struct RolePermissions {
  writers:       Role,
  mode_changers: Role,
}

impl From<&PermissionsConfig> for RolePermissions {
  fn from(cfg: &PermissionsConfig) -> Self {
    Self {
      writers:       Role::from_list(&cfg.writers),
      mode_changers: Role::from_list(&cfg.mode_changers),
    }
  }
}

impl Permissions for RolePermissions {
  async fn can_write<'a>(&'a self, _: Uuid, author_id: &'a AuthorId) -> bool {
    self.writers.admits(author_id)
  }

  async fn can_change_mode<'a>(
    &'a self,
    _: Uuid,
    author_id: &'a AuthorId,
  ) -> bool {
    self.mode_changers.admits(author_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn author(s: &str) -> AuthorId { AuthorId::new(s).unwrap() }

  #[tokio::test]
  async fn default_admits_everyone() {
    let p = RolePermissions::from(&PermissionsConfig::default());
    assert!(p.can_write(Uuid::nil(), &author("anyone")).await);
    assert!(p.can_change_mode(Uuid::nil(), &author("anyone")).await);
  }

  #[tokio::test]
  async fn lists_are_independent() {
    let p = RolePermissions::from(&PermissionsConfig {
      writers:       vec!["alice".into(), "bob".into()],
      mode_changers: vec!["alice".into()],
    });
    let id = Uuid::nil();

    assert!(p.can_write(id, &author("bob")).await);
    assert!(!p.can_change_mode(id, &author("bob")).await);
    assert!(p.can_change_mode(id, &author("alice")).await);
    assert!(!p.can_write(id, &author("carol")).await);
  }

  #[tokio::test]
  async fn empty_list_admits_nobody() {
    let p = RolePermissions::from(&PermissionsConfig {
      writers:       vec![],
      mode_changers: vec![WILDCARD.into()],
    });
    assert!(!p.can_write(Uuid::nil(), &author("alice")).await);
    assert!(p.can_change_mode(Uuid::nil(), &author("alice")).await);
  }
}
