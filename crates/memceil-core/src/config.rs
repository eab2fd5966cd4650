//! Allocator configuration that the CLI and tests can serialize/deserialize.
//!
//! The ceiling is read once at process start. Nothing here can change the
//! limit of a policy that has already been built.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ceiling used when nothing else is configured.
pub const DEFAULT_BYTE_LIMIT: i64 = 30_000;

/// Which policy variant to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Refuse anything that would push usage past `byte_limit`.
    #[default]
    Bounded,
    /// Count usage but never refuse.
    Unbounded,
}

impl std::str::FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bounded" => Ok(PolicyKind::Bounded),
            "unbounded" => Ok(PolicyKind::Unbounded),
            other => Err(Error::Config(format!("unknown policy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Hard ceiling (in bytes). The bounded policy must *never* exceed this.
    pub byte_limit: i64,

    /// Policy variant selected at runtime-construction time.
    pub policy: PolicyKind,

    /// Wrap the policy so every call is emitted as a `tracing` event.
    pub trace_calls: bool,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            byte_limit: DEFAULT_BYTE_LIMIT,
            policy: PolicyKind::Bounded,
            trace_calls: false,
        }
    }
}

impl AllocatorConfig {
    /// Defaults overridden by `MEMCEIL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = lookup("MEMCEIL_BYTE_LIMIT") {
            self.byte_limit = s
                .trim()
                .parse::<i64>()
                .map_err(|e| Error::Config(format!("MEMCEIL_BYTE_LIMIT='{s}': {e}")))?;
        }

        if let Some(s) = lookup("MEMCEIL_POLICY") {
            self.policy = s.parse()?;
        }

        if let Some(s) = lookup("MEMCEIL_TRACE") {
            self.trace_calls = matches!(s.trim(), "1" | "true" | "yes" | "on");
        }

        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if self.byte_limit < 0 {
            return Err(Error::Config(format!(
                "byte limit must be non-negative, got {}",
                self.byte_limit
            )));
        }
        Ok(())
    }
}
