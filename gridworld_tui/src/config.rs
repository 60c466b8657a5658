use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridworld_core::SimConfig;
use serde::{Deserialize, Serialize};

/// Host settings, read from a TOML file and then overridden by CLI flags.
///
/// ```toml
/// tick_ms = 100
///
/// [simulation]
/// width = 15
/// height = 15
/// seed = 3
/// memo_policy = "keep_for_run"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Milliseconds between simulation ticks in interactive mode.
    pub tick_ms: u64,
    pub simulation: SimConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            tick_ms: 250,
            simulation: SimConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridworld_core::{MemoPolicy, Position};
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nseed = 9").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_ms, 250);
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.simulation.width, 12);
        assert_eq!(config.simulation.memo_policy, MemoPolicy::ResetOnPickup);
    }

    #[test]
    fn full_file_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
tick_ms = 40

[simulation]
width = 21
height = 17
start = {{ x = 2, y = 3 }}
seed = 4
memo_policy = "keep_for_run"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.tick_ms, 40);
        assert_eq!(
            config.simulation,
            SimConfig {
                width: 21,
                height: 17,
                start: Position::new(2, 3),
                seed: 4,
                memo_policy: MemoPolicy::KeepForRun,
            }
        );
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn bad_policy_is_rejected() {
        assert!(AppConfig::parse("[simulation]\nmemo_policy = \"sometimes\"").is_err());
    }
}
