use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

use crate::file_source::SourceFormat;

/// Project settings, read from `.w3sink/config.toml` in the working directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Source id stamped on every replayed event.
    #[serde(default = "default_source_id")]
    pub source_id: String,
    /// Route events through the in-memory graph before printing them.
    #[serde(default)]
    pub normalize: bool,
    /// Input format used when neither the extension nor the content tells.
    #[serde(default)]
    pub input_format: Option<SourceFormat>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            source_id: default_source_id(),
            normalize: false,
            input_format: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Stream name written in the DGS header.
    #[serde(default = "default_stream_name")]
    pub stream_name: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            stream_name: default_stream_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".w3sink/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    load_user_config_from(&config_dir.join("w3sink/config.toml"))
}

pub fn load_user_config_from(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn resolve_config(project_root: &Path, cli_json: bool) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.as_deref(), env_format.as_deref());

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

/// Output mode precedence: `--json`, `FORMAT` env, user config, then
/// `pretty` on a terminal and `text` otherwise.
#[must_use]
pub fn resolve_output(
    cli_json: bool,
    user_output: Option<&str>,
    env_format: Option<&str>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_source_id() -> String {
    "w3sink".to_string()
}

fn default_stream_name() -> String {
    "w3sink".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_project_config_uses_defaults() {
        let root = TempDir::new().expect("tempdir");
        let cfg = load_project_config(root.path()).expect("load should succeed");
        assert_eq!(cfg.replay.source_id, "w3sink");
        assert!(!cfg.replay.normalize);
        assert_eq!(cfg.replay.input_format, None);
        assert_eq!(cfg.convert.stream_name, "w3sink");
    }

    #[test]
    fn project_config_overrides() {
        let root = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".w3sink")).expect("mkdir");
        std::fs::write(
            root.path().join(".w3sink/config.toml"),
            "[replay]\nsource_id = \"lab\"\nnormalize = true\ninput_format = \"json\"\n",
        )
        .expect("write");

        let cfg = load_project_config(root.path()).expect("load");
        assert_eq!(cfg.replay.source_id, "lab");
        assert!(cfg.replay.normalize);
        assert_eq!(cfg.replay.input_format, Some(SourceFormat::Json));
        assert_eq!(cfg.convert.stream_name, "w3sink");
    }

    #[test]
    fn broken_project_config_names_the_file() {
        let root = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(root.path().join(".w3sink")).expect("mkdir");
        std::fs::write(root.path().join(".w3sink/config.toml"), "[replay\n").expect("write");
        let err = load_project_config(root.path()).unwrap_err();
        assert!(format!("{err}").contains("config.toml"));
    }

    #[test]
    fn user_config_reads_output() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "output = \"json\"\n").expect("write");
        let cfg = load_user_config_from(&path).expect("load");
        assert_eq!(cfg.output.as_deref(), Some("json"));

        let missing = load_user_config_from(&dir.path().join("nope.toml")).expect("default");
        assert_eq!(missing.output, None);
    }

    #[test]
    fn cli_json_overrides_env_and_config() {
        assert_eq!(resolve_output(true, Some("pretty"), Some("text")), "json");
    }

    #[test]
    fn env_beats_user_config() {
        assert_eq!(resolve_output(false, Some("json"), Some("TEXT")), "text");
        assert_eq!(resolve_output(false, Some("human"), Some("bogus")), "pretty");
    }
}
