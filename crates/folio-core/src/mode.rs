//! The document workflow mode and its transition rules.
//!
//! Any mode may move to any other mode. The workflow is advisory: published
//! drafts get reopened. The only rejected transition is a self-transition,
//! which would add a version recording no change.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// The workflow stage a document occupies.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  AsRefStr,
  IntoStaticStr,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
  #[default]
  Alpha,
  Beta,
  Publish,
  Read,
}

impl Mode {
  /// Parse the lowercase form stored in the database and used on the wire.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownMode(s.to_owned()))
  }

  /// Validate a move from `self` to `target`.
  pub fn transition_to(self, target: Mode) -> Result<Transition> {
    if self == target {
      return Err(Error::NoOpTransition(self));
    }
    Ok(Transition { from: self, to: target })
  }
}

/// A validated change of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub from: Mode,
  pub to:   Mode,
}

impl Transition {
  /// The auto-generated change summary recorded on the transition version.
  pub fn summary(&self) -> String {
    format!("Transitioned {} → {}", self.from, self.to)
  }
}
