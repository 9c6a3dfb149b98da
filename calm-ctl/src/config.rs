//! Settings layers: file, environment, and command line flags

use std::fs;
use std::io;
use std::path::Path;

use calm::{CalmError, Result, Settings};
use log::debug;
use serde::Deserialize;

/// Settings file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/calm.json";

/// Prefix of the environment overlay (`CALM_MEMORY`, `CALM_CPU`, ...)
pub const ENV_PREFIX: &str = "CALM_";

/// One source of settings; unset fields defer to lower layers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Layer {
    pub memory: Option<String>,
    pub cpu: Option<u32>,
    pub user: Option<String>,
    pub group: Option<String>,
}

impl Layer {
    /// Read the settings file. A missing file is only an error when it was
    /// asked for explicitly.
    pub fn from_file(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file_at(path, true),
            None => Self::from_file_at(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    pub fn from_file_at(path: &Path, explicit: bool) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                debug!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CalmError::InvalidConfig(format!(
                    "could not read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        Self::parse(&content, path)
    }

    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            CalmError::InvalidConfig(format!("could not parse {}: {}", origin.display(), e))
        })
    }

    /// Environment overlay, read through `lookup` so tests need not touch the real environment
    pub fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{}{}", ENV_PREFIX, key));

        let cpu = match var("CPU") {
            Some(value) => Some(value.trim().parse::<u32>().map_err(|e| {
                CalmError::InvalidConfig(format!(
                    "{}CPU must be a non-negative integer, got {:?}: {}",
                    ENV_PREFIX, value, e
                ))
            })?),
            None => None,
        };

        Ok(Self {
            memory: var("MEMORY"),
            cpu,
            user: var("USER"),
            group: var("GROUP"),
        })
    }

    /// Fill unset fields from `lower`
    fn over(self, lower: Layer) -> Layer {
        Layer {
            memory: self.memory.or(lower.memory),
            cpu: self.cpu.or(lower.cpu),
            user: self.user.or(lower.user),
            group: self.group.or(lower.group),
        }
    }
}

/// Merge layers, lowest precedence first, on top of the defaults.
pub fn resolve(layers: impl IntoIterator<Item = Layer>) -> Settings {
    let merged = layers
        .into_iter()
        .fold(Layer::default(), |lower, upper| upper.over(lower));

    let defaults = Settings::default();
    Settings {
        memory: merged.memory.unwrap_or(defaults.memory),
        cpu_percent: merged.cpu.unwrap_or(defaults.cpu_percent),
        user: merged.user.unwrap_or(defaults.user),
        group: merged.group.unwrap_or(defaults.group),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = resolve(Vec::new());
        assert_eq!(settings.memory, "0");
        assert_eq!(settings.cpu_percent, 0);
        assert_eq!(settings.user, "root");
        assert_eq!(settings.group, "calm");
    }

    #[test]
    fn test_parse_file() {
        let layer = Layer::parse(
            r#"{"memory": "2G", "cpu": 50, "user": "nobody"}"#,
            Path::new("calm.json"),
        )
        .unwrap();
        assert_eq!(layer.memory.as_deref(), Some("2G"));
        assert_eq!(layer.cpu, Some(50));
        assert_eq!(layer.user.as_deref(), Some("nobody"));
        assert!(layer.group.is_none());
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = Layer::parse(r#"{"memroy": "2G"}"#, Path::new("calm.json")).unwrap_err();
        assert!(matches!(err, CalmError::InvalidConfig(_)));
    }

    #[test]
    fn test_parse_rejects_negative_cpu() {
        assert!(Layer::parse(r#"{"cpu": -5}"#, Path::new("calm.json")).is_err());
    }

    #[test]
    fn test_from_file_explicit_missing_is_error() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("missing.json");
        let err = Layer::from_file(Some(missing.as_path())).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_from_file_missing_default_uses_defaults() {
        let tmp = tempdir().unwrap();
        let missing = tmp.path().join("calm.json");
        let layer = Layer::from_file_at(&missing, false).unwrap();
        assert_eq!(layer, Layer::default());
        assert_eq!(resolve([layer]), Settings::default());
    }

    #[test]
    fn test_from_file_malformed_default_is_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("calm.json");
        fs::write(&path, "memory: 2G").unwrap();
        let err = Layer::from_file_at(&path, false).unwrap_err();
        assert!(matches!(err, CalmError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_file_reads_json() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("calm.json");
        fs::write(&path, r#"{"memory": "512M", "group": "batch"}"#).unwrap();

        let layer = Layer::from_file(Some(path.as_path())).unwrap();
        assert_eq!(layer.memory.as_deref(), Some("512M"));
        assert_eq!(layer.group.as_deref(), Some("batch"));
    }

    #[test]
    fn test_from_env() {
        let layer = Layer::from_env(env(&[("CALM_MEMORY", "1G"), ("CALM_CPU", "25")])).unwrap();
        assert_eq!(layer.memory.as_deref(), Some("1G"));
        assert_eq!(layer.cpu, Some(25));
        assert!(layer.user.is_none());
    }

    #[test]
    fn test_from_env_group() {
        let layer = Layer::from_env(env(&[("CALM_GROUP", "batch")])).unwrap();
        assert_eq!(resolve([layer]).group, "batch");
    }

    #[test]
    fn test_from_env_bad_cpu() {
        let err = Layer::from_env(env(&[("CALM_CPU", "half")])).unwrap_err();
        assert!(err.to_string().contains("CALM_CPU"));
    }

    #[test]
    fn test_precedence_flags_over_env_over_file() {
        let file = Layer {
            memory: Some("4G".to_string()),
            cpu: Some(10),
            user: Some("daemon".to_string()),
            group: Some("file-group".to_string()),
        };
        let env_layer = Layer {
            memory: Some("2G".to_string()),
            cpu: Some(20),
            ..Default::default()
        };
        let flags = Layer {
            memory: Some("1G".to_string()),
            ..Default::default()
        };

        let settings = resolve([file, env_layer, flags]);
        assert_eq!(settings.memory, "1G");
        assert_eq!(settings.cpu_percent, 20);
        assert_eq!(settings.user, "daemon");
        assert_eq!(settings.group, "file-group");
    }
}
