use crate::app::models::ExcludeConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid exclude pattern {pattern:?} in {layer}: {reason}")]
    InvalidInLayer {
        pattern: String,
        layer: String,
        #[source]
        reason: globset::Error,
    },
    #[error("invalid exclude pattern {pattern:?}: {reason}")]
    Invalid {
        pattern: String,
        #[source]
        reason: globset::Error,
    },
}

/// Compiles a single table-name glob. Used to reject bad patterns when a layer is loaded.
pub fn validate_pattern(pattern: &str) -> Result<Glob, globset::Error> {
    Glob::new(pattern)
}

/// Anchored match of one glob against one table name.
pub fn glob_matches(pattern: &str, name: &str) -> Result<bool, PatternError> {
    let glob = validate_pattern(pattern).map_err(|reason| PatternError::Invalid {
        pattern: pattern.to_string(),
        reason,
    })?;
    Ok(glob.compile_matcher().is_match(name))
}

/// Exact table names plus compiled glob patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    exact: HashSet<String>,
    glob_set: GlobSet,
}

impl PatternSet {
    pub fn new(config: &ExcludeConfig) -> Result<Self, PatternError> {
        Ok(Self {
            exact: config.exact.iter().cloned().collect(),
            glob_set: build_globset(&config.patterns)?,
        })
    }

    pub fn matches_exact(&self, name: &str) -> bool {
        self.exact.contains(name)
    }

    /// True if any glob pattern matches the whole name.
    pub fn matches_pattern(&self, name: &str) -> bool {
        self.glob_set.is_match(name)
    }

    pub fn matches(&self, name: &str) -> bool {
        self.matches_exact(name) || self.matches_pattern(name)
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.glob_set.is_empty()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, PatternError> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = validate_pattern(pat).map_err(|reason| PatternError::Invalid {
            pattern: pat.clone(),
            reason,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|reason| PatternError::Invalid {
        pattern: patterns.join(", "),
        reason,
    })
}
