//! Screen navigation derived from a dex number.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NavError {
  #[error("invalid dex range {first}..={last}")]
  InvalidRange { first: u32, last: u32 },

  #[error("'{0}' is not a dex number")]
  InvalidId(String),
}

/// Inclusive range of dex numbers that can be browsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DexRange {
  pub first: u32,
  pub last: u32,
}

impl Default for DexRange {
  fn default() -> Self {
    Self { first: 1, last: 151 }
  }
}

impl DexRange {
  pub fn new(first: u32, last: u32) -> Result<Self, NavError> {
    let range = Self { first, last };
    range.validate()?;
    Ok(range)
  }

  pub fn validate(&self) -> Result<(), NavError> {
    if self.first == 0 || self.first > self.last {
      return Err(NavError::InvalidRange {
        first: self.first,
        last: self.last,
      });
    }
    Ok(())
  }

  pub fn clamp(&self, id: u32) -> u32 {
    id.clamp(self.first, self.last)
  }
}

/// Current screen parameter plus prev/next moves within a [`DexRange`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
  range: DexRange,
  current: u32,
}

impl Navigator {
  /// Start at `id`, clamped into `range`.
  pub fn new(range: DexRange, id: u32) -> Self {
    Self {
      range,
      current: range.clamp(id),
    }
  }

  /// Parse a route parameter such as `"25"` or `"025"`.
  pub fn parse_id(param: &str) -> Result<u32, NavError> {
    param
      .trim()
      .parse()
      .map_err(|_| NavError::InvalidId(param.to_string()))
  }

  pub fn current(&self) -> u32 {
    self.current
  }

  pub fn previous(&self) -> u32 {
    self.current.saturating_sub(1).max(self.range.first)
  }

  pub fn next(&self) -> u32 {
    self.current.saturating_add(1).min(self.range.last)
  }

  pub fn is_first(&self) -> bool {
    self.current == self.range.first
  }

  pub fn is_last(&self) -> bool {
    self.current == self.range.last
  }

  /// Replace the current id with the previous one. Returns false at the
  /// start of the range.
  pub fn go_previous(&mut self) -> bool {
    self.replace(self.previous())
  }

  pub fn go_next(&mut self) -> bool {
    self.replace(self.next())
  }

  fn replace(&mut self, id: u32) -> bool {
    let changed = id != self.current;
    self.current = id;
    changed
  }

  /// `#001` style label.
  pub fn label(&self) -> String {
    format!("#{:03}", self.current)
  }
}
