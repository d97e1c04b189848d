use crate::app::models::{ConfigLayer, ConnectionProfile, ExcludeConfig, LayerSource};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Project config picked up from the working directory when `--config` is not given.
pub const PROJECT_CONFIG_FILE: &str = ".dbdump.toml";

/// Shape of both the global and the project config file.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    /// Label shown next to the layer in `config show`.
    name: Option<String>,
    #[serde(default)]
    exclude: ExcludeConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct ProfilesFile {
    #[serde(default)]
    profiles: Vec<ConnectionProfile>,
}

/// Everything the caller gathered before the layers are built.
#[derive(Debug, Default)]
pub struct LayerInputs {
    pub use_defaults: bool,
    pub global_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
    /// True when the project path was given explicitly and must exist.
    pub project_required: bool,
    pub cli_exact: Vec<String>,
    pub cli_patterns: Vec<String>,
}

/// Noisy tables skipped out of the box.
pub fn default_excludes() -> ExcludeConfig {
    ExcludeConfig::new(
        [
            "audits",
            "sessions",
            "cache",
            "cache_locks",
            "failed_jobs",
            "telescope_entries",
            "telescope_entries_tags",
            "telescope_monitoring",
            "pulse_entries",
            "pulse_aggregates",
        ],
        ["telescope_*", "pulse_*", "_cache"],
    )
}

fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("dbdump"))
}

pub fn global_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn profiles_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("profiles.toml"))
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Reads an optional config file. A missing file contributes no layer.
fn load_file_layer(path: &Path, source: LayerSource) -> Result<Option<ConfigLayer>> {
    if !path.exists() {
        log::debug!("No config at {}, skipping", path.display());
        return Ok(None);
    }
    let file = load_config_file(path)?;
    Ok(Some(ConfigLayer::new(source, file.exclude)?.with_name(file.name)))
}

fn cli_layer(exact: &[String], patterns: &[String]) -> Result<Option<ConfigLayer>> {
    if exact.is_empty() && patterns.is_empty() {
        return Ok(None);
    }
    let config = ExcludeConfig::new(exact.iter().cloned(), patterns.iter().cloned());
    Ok(Some(ConfigLayer::new(LayerSource::Cli, config)?))
}

/// Builds the layers in merge order: defaults, global, project, CLI.
pub fn resolve_layers(inputs: &LayerInputs) -> Result<Vec<ConfigLayer>> {
    let mut layers = Vec::new();

    if inputs.use_defaults {
        layers.push(ConfigLayer::new(LayerSource::Defaults, default_excludes())?);
    }

    if let Some(path) = &inputs.global_path {
        layers.extend(load_file_layer(path, LayerSource::Global(path.clone()))?);
    }

    if let Some(path) = &inputs.project_path {
        if inputs.project_required && !path.exists() {
            bail!("Config file {} does not exist", path.display());
        }
        layers.extend(load_file_layer(path, LayerSource::Project(path.clone()))?);
    }

    layers.extend(cli_layer(&inputs.cli_exact, &inputs.cli_patterns)?);
    debug_assert!(layers
        .windows(2)
        .all(|w| w[0].source().rank() < w[1].source().rank()));

    for layer in &layers {
        log::debug!(
            "Loaded {}: {} exact, {} patterns",
            layer.source(),
            layer.config().exact.len(),
            layer.config().patterns.len()
        );
    }
    Ok(layers)
}

/// Union of two lists, first-seen order, byte-identical duplicates dropped.
fn merge_vecs(acc: &[String], next: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    acc.iter()
        .chain(next)
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

pub fn merge_two(acc: &ExcludeConfig, next: &ExcludeConfig) -> ExcludeConfig {
    ExcludeConfig {
        exact: merge_vecs(&acc.exact, &next.exact),
        patterns: merge_vecs(&acc.patterns, &next.patterns),
    }
}

/// Folds layers left to right. Later layers only ever add entries.
pub fn merge_layers(layers: &[ConfigLayer]) -> ExcludeConfig {
    layers
        .iter()
        .fold(ExcludeConfig::default(), |acc, layer| merge_two(&acc, layer.config()))
}

pub fn load_profiles_from(path: &Path) -> Result<Vec<ConnectionProfile>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profiles at {}", path.display()))?;
    let parsed: ProfilesFile =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(parsed.profiles)
}

pub fn load_profiles() -> Result<Vec<ConnectionProfile>> {
    load_profiles_from(&profiles_path()?)
}

pub fn find_profile<'a>(profiles: &'a [ConnectionProfile], name: &str) -> Result<&'a ConnectionProfile> {
    profiles
        .iter()
        .find(|p| p.name == name)
        .with_context(|| format!("Profile '{}' not found", name))
}
