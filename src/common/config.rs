use std::path::{Path, PathBuf};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::sys::geometry::Rect;

const MAX_DEFAULT_URLS: usize = 16;

/// The configuration used when no file exists; also what `wingroups init` writes.
pub const DEFAULT_CONFIG: &str = include_str!("../../wingroups.default.toml");

pub fn data_dir() -> PathBuf { dirs::home_dir().unwrap_or_default().join(".wingroups") }
pub fn storage_file() -> PathBuf { data_dir().join("storage.json") }
pub fn config_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".config")
        .join("wingroups")
        .join("config.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub layout: LayoutSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub host: HostSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    #[serde(default = "default_min_column_width")]
    pub min_column_width: i32,
    #[serde(default = "default_min_row_height")]
    pub min_row_height: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct StorageSettings {
    /// Location of the JSON store. `~/` is expanded to the home directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// URLs of the group synthesized on first run when there is nothing to
    /// migrate.
    #[serde(default = "default_urls")]
    pub default_urls: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct HostSettings {
    /// Rectangle windows are tiled into. Without one, groups cannot be opened.
    #[serde(default)]
    pub frame: Option<Rect>,
    #[serde(default = "default_launch_command")]
    pub launch_command: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_column_width: default_min_column_width(),
            min_row_height: default_min_row_height(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: None,
            default_urls: default_urls(),
        }
    }
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            frame: None,
            launch_command: default_launch_command(),
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.min_column_width < 1 {
            issues.push(format!(
                "min_column_width must be at least 1, got {}",
                self.min_column_width
            ));
        }
        if self.min_row_height < 1 {
            issues.push(format!(
                "min_row_height must be at least 1, got {}",
                self.min_row_height
            ));
        }
        issues
    }
}

impl StorageSettings {
    pub fn path(&self) -> PathBuf {
        match &self.path {
            Some(path) => expand_home(path),
            None => storage_file(),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.default_urls.is_empty() {
            issues.push("default_urls must contain at least one URL".to_string());
        }
        if self.default_urls.len() > MAX_DEFAULT_URLS {
            issues.push(format!(
                "default_urls should not contain more than {} URLs",
                MAX_DEFAULT_URLS
            ));
        }
        for (index, url) in self.default_urls.iter().enumerate() {
            if url.trim().is_empty() {
                issues.push(format!("default_urls entry {} is blank", index));
            }
        }
        issues
    }
}

impl HostSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if let Some(frame) = &self.frame
            && frame.is_empty()
        {
            issues.push(format!("host frame {} must have a positive width and height", frame));
        }
        if self.launch_command.trim().is_empty() {
            issues.push("launch_command must not be empty".to_string());
        } else if !self.launch_command.contains("{url}") {
            issues.push("launch_command does not contain the {url} placeholder".to_string());
        }
        issues
    }
}

fn default_min_column_width() -> i32 { 400 }
fn default_min_row_height() -> i32 { 300 }
fn default_launch_command() -> String {
    "chromium --new-window --window-position={left},{top} --window-size={width},{height} {url}"
        .to_string()
}
fn default_urls() -> Vec<String> {
    vec![
        "https://mail.google.com".to_string(),
        "https://outlook.office.com".to_string(),
    ]
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path` if it exists, otherwise falls back to [`DEFAULT_CONFIG`].
    pub fn read_or_default(path: &Path) -> anyhow::Result<Config> {
        if path.exists() { Self::read(path) } else { Self::built_in() }
    }

    pub fn built_in() -> anyhow::Result<Config> { Self::parse(DEFAULT_CONFIG) }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.settings.layout.validate());
        issues.extend(self.settings.storage.validate());
        issues.extend(self.settings.host.validate());
        issues
    }

    fn parse(buf: &str) -> anyhow::Result<Config> {
        match toml::from_str::<Config>(buf) {
            Ok(config) => Ok(config),
            Err(e) => bail!("{e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn built_in_config_adds_a_frame_to_field_defaults() {
        let cfg = Config::built_in().unwrap();
        assert_eq!(cfg.settings.host.frame, Some(Rect::new(0, 0, 1920, 1080)));
        let mut expected = Config::default();
        expected.settings.host.frame = cfg.settings.host.frame;
        assert_eq!(cfg, expected);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.settings.host.frame, None);
    }

    #[test]
    fn omitted_frame_means_no_host_frame() {
        let cfg = Config::parse("[settings.host]\nlaunch_command = \"browser {url}\"\n").unwrap();
        assert_eq!(cfg.settings.host.frame, None);
    }

    #[test]
    fn missing_file_falls_back_to_built_in() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::read_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::built_in().unwrap());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::parse(
            r#"
            [settings.layout]
            min_column_width = 320

            [settings.host]
            frame = { left = 0, top = 25, width = 1440, height = 875 }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.settings.layout.min_column_width, 320);
        assert_eq!(cfg.settings.layout.min_row_height, 300);
        assert_eq!(cfg.settings.host.frame, Some(Rect::new(0, 25, 1440, 875)));
        assert_eq!(cfg.settings.host.launch_command, default_launch_command());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::parse("[settings.layout]\nmin_colum_width = 3\n").unwrap_err();
        assert!(err.to_string().contains("min_colum_width"));
    }

    #[test]
    fn validation_reports_bad_limits() {
        let mut cfg = Config::default();
        cfg.settings.layout.min_column_width = 0;
        cfg.settings.layout.min_row_height = -5;
        let issues = cfg.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.contains("min_column_width")));
    }

    #[test]
    fn validation_reports_host_problems() {
        let mut cfg = Config::default();
        cfg.settings.host.frame = Some(Rect::new(0, 0, 0, 900));
        cfg.settings.host.launch_command = "firefox --new-window".to_string();
        let issues = cfg.validate();
        assert!(issues.iter().any(|i| i.contains("positive width")));
        assert!(issues.iter().any(|i| i.contains("{url}")));
    }

    #[test]
    fn validation_reports_missing_default_urls() {
        let mut cfg = Config::default();
        cfg.settings.storage.default_urls = vec![" ".to_string()];
        assert!(cfg.validate().iter().any(|i| i.contains("blank")));
        cfg.settings.storage.default_urls.clear();
        assert!(cfg.validate().iter().any(|i| i.contains("at least one URL")));
    }

    #[test]
    fn storage_path_expands_home() {
        let settings = StorageSettings {
            path: Some(PathBuf::from("~/groups.json")),
            ..Default::default()
        };
        assert_eq!(settings.path(), dirs::home_dir().unwrap_or_default().join("groups.json"));
        assert_eq!(StorageSettings::default().path(), storage_file());
    }

    #[test]
    fn save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.settings.host.frame = Some(Rect::new(-1280, 0, 1280, 1024));
        cfg.settings.layout.min_row_height = 250;
        cfg.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), cfg);

        cfg.settings.host.frame = None;
        cfg.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap().settings.host.frame, None);
    }
}
