use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use phenomatch_core::{ranking::DEFAULT_LIMIT, CutoffPolicy, LinkLayout, RankOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub static CONFIG_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = option_env!("PHENOMATCH_CONFIG_PATH") {
        return PathBuf::from(path);
    }
    ProjectDirs::from("net", "humanphenotypes", "phenomatch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("phenomatch.toml"))
});

/// External face analysis command. Receives a PNG on stdin, answers JSON on stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub program: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: PathBuf,
    pub auto_accept_confidence: f32,
    pub top_n: usize,
    pub cutoff: CutoffPolicy,
    pub analyzer: AnalyzerConfig,
    pub links: LinkLayout,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("list.json"),
            auto_accept_confidence: 0.5,
            top_n: DEFAULT_LIMIT,
            cutoff: CutoffPolicy::Items,
            analyzer: AnalyzerConfig::default(),
            links: LinkLayout::default(),
        }
    }
}

impl Config {
    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            limit: self.top_n,
            cutoff: self.cutoff,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "top_n = 5\ncutoff = \"groups\"\n\n[analyzer]\nprogram = \"face-model\"\n\n[links]\nprimary_dir = \"core\"\n",
        )
        .unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.top_n, 5);
        assert_eq!(cfg.cutoff, CutoffPolicy::Groups);
        assert_eq!(cfg.analyzer.program, "face-model");
        assert!(cfg.analyzer.args.is_empty());
        assert_eq!(cfg.links.primary_dir, "core");
        assert_eq!(cfg.links.image_root, "faces_lowres");
        assert_eq!(cfg.auto_accept_confidence, 0.5);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut cfg = Config::default();
        cfg.catalog = PathBuf::from("/srv/phenotypes/list.json");
        cfg.analyzer.args = vec!["--model".into(), "ssd".into()];
        save_config(&cfg, Some(&path)).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), cfg);
    }
}
