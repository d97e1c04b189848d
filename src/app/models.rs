use crate::app::matcher::{validate_pattern, PatternError};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Table names whose data should be skipped: verbatim names plus glob patterns.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExcludeConfig {
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl ExcludeConfig {
    pub fn new<E, P>(exact: E, patterns: P) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            exact: exact.into_iter().map(Into::into).collect(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }
}

/// Where a configuration layer came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSource {
    Defaults,
    Global(PathBuf),
    Project(PathBuf),
    Cli,
}

impl LayerSource {
    /// Position in the fixed merge order.
    pub fn rank(&self) -> u8 {
        match self {
            LayerSource::Defaults => 0,
            LayerSource::Global(_) => 1,
            LayerSource::Project(_) => 2,
            LayerSource::Cli => 3,
        }
    }
}

impl fmt::Display for LayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerSource::Defaults => write!(f, "built-in defaults"),
            LayerSource::Global(path) => write!(f, "global config {}", path.display()),
            LayerSource::Project(path) => write!(f, "project config {}", path.display()),
            LayerSource::Cli => write!(f, "command-line flags"),
        }
    }
}

/// One loaded source of exclusion rules. Patterns are checked on construction,
/// so a layer that exists always compiles.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    source: LayerSource,
    name: Option<String>,
    config: ExcludeConfig,
}

impl ConfigLayer {
    pub fn new(source: LayerSource, config: ExcludeConfig) -> Result<Self, PatternError> {
        for pattern in &config.patterns {
            validate_pattern(pattern).map_err(|reason| PatternError::InvalidInLayer {
                pattern: pattern.clone(),
                layer: source.to_string(),
                reason,
            })?;
        }
        Ok(Self {
            source,
            name: None,
            config,
        })
    }

    /// Attaches the optional `name` a config file gives itself.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn config(&self) -> &ExcludeConfig {
        &self.config
    }
}

/// Partition of a table list into tables whose data is skipped and tables that are dumped in full.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub excluded: Vec<String>,
    pub included: Vec<String>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.excluded.len() + self.included.len()
    }
}

/// A table as reported by `information_schema.tables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub row_count: u64,
    pub data_size: u64,
    pub index_size: u64,
    pub total_size: u64,
}

/// A saved set of connection parameters from `profiles.toml`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_rejects_invalid_pattern_and_names_source() {
        let source = LayerSource::Project(PathBuf::from("/srv/app/.dbdump.toml"));
        let err = ConfigLayer::new(source, ExcludeConfig::new(["audits"], ["ok_*", "bad_[x"]))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("bad_[x"), "{message}");
        assert!(message.contains("/srv/app/.dbdump.toml"), "{message}");
    }

    #[test]
    fn layer_accepts_plain_and_wildcard_patterns() {
        let layer = ConfigLayer::new(
            LayerSource::Cli,
            ExcludeConfig::new(Vec::<String>::new(), ["telescope_*", "log_?", "_cache"]),
        )
        .unwrap();

        assert_eq!(layer.source(), &LayerSource::Cli);
        assert_eq!(layer.name(), None);
        assert_eq!(layer.config().patterns.len(), 3);
    }

    #[test]
    fn source_rank_follows_merge_order() {
        let ordered = [
            LayerSource::Defaults,
            LayerSource::Global(PathBuf::from("g.toml")),
            LayerSource::Project(PathBuf::from("p.toml")),
            LayerSource::Cli,
        ];
        assert!(ordered.windows(2).all(|w| w[0].rank() < w[1].rank()));
    }

    #[test]
    fn exclude_config_decodes_strictly() {
        let parsed: ExcludeConfig = toml::from_str("exact = [\"a\"]").unwrap();
        assert_eq!(parsed, ExcludeConfig::new(["a"], Vec::<String>::new()));

        assert!(toml::from_str::<ExcludeConfig>("exact = \"a\"").is_err());
        assert!(toml::from_str::<ExcludeConfig>("tables = [\"a\"]").is_err());
    }
}
