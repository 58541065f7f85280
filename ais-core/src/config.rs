//! Configuration file management for ais-decode.
//!
//! Reads/writes `~/.ais-decode/config.yaml` with the own-ship identity,
//! safety thresholds and the talker used for generated sentences.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use uom::si::f64::Length;
use uom::si::length::nautical_mile;

use crate::collision::TrackEstimationParameters;
use crate::sentence::SentenceKind;
use crate::types::{AisError, Mmsi, Result};

/// Full configuration structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub own_ship: OwnShipConfig,
    pub safety: SafetyConfig,
    pub talker: SentenceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OwnShipConfig {
    pub mmsi: Option<Mmsi>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyConfig {
    pub warning_distance_nm: f64,
    pub warning_time_s: i64,
    pub warning_repeat_s: i64,
    pub max_position_age_s: i64,
    pub target_lost_timeout_s: i64,
    /// Zero disables the periodic check.
    pub check_interval_s: i64,
    pub warn_if_gnss_missing: bool,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            warning_distance_nm: 1.0,
            warning_time_s: 600,
            warning_repeat_s: 600,
            max_position_age_s: 20,
            target_lost_timeout_s: 600,
            check_interval_s: 5,
            warn_if_gnss_missing: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            own_ship: OwnShipConfig {
                mmsi: None,
                name: None,
            },
            safety: SafetyConfig::default(),
            talker: SentenceKind::Vdo,
        }
    }
}

impl Config {
    /// Safety thresholds as extrapolation parameters. Step sizes and
    /// evaluation window keep their defaults.
    pub fn track_parameters(&self) -> TrackEstimationParameters {
        let s = &self.safety;
        let defaults = TrackEstimationParameters::default();
        TrackEstimationParameters {
            warning_distance: Length::new::<nautical_mile>(s.warning_distance_nm),
            warning_time: seconds_or(s.warning_time_s, defaults.warning_time),
            warning_repeat_timeout: seconds_or(s.warning_repeat_s, defaults.warning_repeat_timeout),
            maximum_position_age: seconds_or(s.max_position_age_s, defaults.maximum_position_age),
            target_lost_timeout: seconds_or(s.target_lost_timeout_s, defaults.target_lost_timeout),
            ais_safety_check_interval: seconds_or(s.check_interval_s.max(0), defaults.ais_safety_check_interval),
            warn_if_gnss_missing: s.warn_if_gnss_missing,
            ..defaults
        }
    }
}

/// Out-of-range durations fall back to `fallback`.
fn seconds_or(value: i64, fallback: TimeDelta) -> TimeDelta {
    TimeDelta::try_seconds(value).unwrap_or(fallback)
}

/// Get the config directory path (`~/.ais-decode/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".ais-decode")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `~/.ais-decode/config.yaml`.
///
/// Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    load_config_from(&config_file())
}

/// Load config from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("cannot read {}: {e}", path.display());
            return Config::default();
        }
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.ais-decode/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = config_file();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| AisError::Config(e.to_string()))?;
    }
    std::fs::write(path, serialize_config(config)).map_err(|e| AisError::Config(e.to_string()))?;
    Ok(())
}

/// Parse simple YAML-like config text.
pub fn parse_config(text: &str) -> Option<Config> {
    let mut config = Config::default();
    let mut current_section: Option<String> = None;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let is_indented = line.starts_with("  ") || line.starts_with('\t');

        let Some((key, val)) = stripped.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let val = val.trim();

        if !is_indented {
            if val.is_empty() {
                current_section = Some(key.to_string());
            } else {
                current_section = None;
                if key == "talker" {
                    match parse_string_value(val).as_deref() {
                        Some("VDM") | Some("vdm") => config.talker = SentenceKind::Vdm,
                        Some("VDO") | Some("vdo") => config.talker = SentenceKind::Vdo,
                        _ => {}
                    }
                }
            }
            continue;
        }

        let Some(section) = current_section.as_deref() else {
            continue;
        };
        let safety = &mut config.safety;
        match (section, key) {
            ("own_ship", "mmsi") => config.own_ship.mmsi = parse_string_value(val).and_then(|v| v.parse().ok()),
            ("own_ship", "name") => config.own_ship.name = parse_string_value(val),
            ("safety", "warning_distance_nm") => set(&mut safety.warning_distance_nm, val),
            ("safety", "warning_time_s") => set(&mut safety.warning_time_s, val),
            ("safety", "warning_repeat_s") => set(&mut safety.warning_repeat_s, val),
            ("safety", "max_position_age_s") => set(&mut safety.max_position_age_s, val),
            ("safety", "target_lost_timeout_s") => set(&mut safety.target_lost_timeout_s, val),
            ("safety", "check_interval_s") => set(&mut safety.check_interval_s, val),
            ("safety", "warn_if_gnss_missing") => set(&mut safety.warn_if_gnss_missing, val),
            _ => {}
        }
    }

    Some(config)
}

/// Overwrite `field` only if `val` parses; bad values keep the default.
fn set<T: std::str::FromStr>(field: &mut T, val: &str) {
    if let Some(v) = parse_string_value(val).and_then(|v| v.parse().ok()) {
        *field = v;
    }
}

fn parse_string_value(val: &str) -> Option<String> {
    if val == "null" || val == "~" || val.is_empty() {
        return None;
    }
    // Strip quotes
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return Some(val[1..val.len() - 1].to_string());
    }
    Some(val.to_string())
}

/// Serialize config to YAML-like text.
pub fn serialize_config(config: &Config) -> String {
    let mut lines = vec!["# ais-decode configuration".to_string(), String::new()];

    lines.push("own_ship:".into());
    match config.own_ship.mmsi {
        Some(v) => lines.push(format!("  mmsi: {v}")),
        None => lines.push("  mmsi: null".into()),
    }
    match &config.own_ship.name {
        Some(v) => lines.push(format!("  name: \"{v}\"")),
        None => lines.push("  name: null".into()),
    }
    lines.push(String::new());

    let s = &config.safety;
    lines.push("safety:".into());
    lines.push(format!("  warning_distance_nm: {}", s.warning_distance_nm));
    lines.push(format!("  warning_time_s: {}", s.warning_time_s));
    lines.push(format!("  warning_repeat_s: {}", s.warning_repeat_s));
    lines.push(format!("  max_position_age_s: {}", s.max_position_age_s));
    lines.push(format!("  target_lost_timeout_s: {}", s.target_lost_timeout_s));
    lines.push(format!("  check_interval_s: {}", s.check_interval_s));
    lines.push(format!("  warn_if_gnss_missing: {}", s.warn_if_gnss_missing));
    lines.push(String::new());

    lines.push(format!("talker: {}", config.talker.as_str()));

    lines.join("\n") + "\n"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.own_ship.mmsi.is_none());
        assert_eq!(config.safety.check_interval_s, 5);
        assert_eq!(config.talker, SentenceKind::Vdo);
        assert_eq!(config.track_parameters(), TrackEstimationParameters::default());
    }

    #[test]
    fn test_parse_config() {
        let text = r#"
own_ship:
  mmsi: 269110660
  name: "CIRRUS"

safety:
  warning_distance_nm: 0.5
  warning_time_s: 300
  warning_repeat_s: 120
  max_position_age_s: 30
  target_lost_timeout_s: 900
  check_interval_s: 0
  warn_if_gnss_missing: false

talker: VDM
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.own_ship.mmsi, Some(269110660));
        assert_eq!(config.own_ship.name.as_deref(), Some("CIRRUS"));
        assert_eq!(config.safety.warning_distance_nm, 0.5);
        assert_eq!(config.safety.check_interval_s, 0);
        assert!(!config.safety.warn_if_gnss_missing);
        assert_eq!(config.talker, SentenceKind::Vdm);

        let params = config.track_parameters();
        assert_abs_diff_eq!(params.warning_distance.get::<nautical_mile>(), 0.5, epsilon = 1e-12);
        assert_eq!(params.warning_time, TimeDelta::minutes(5));
        assert_eq!(params.warning_repeat_timeout, TimeDelta::minutes(2));
        assert_eq!(params.maximum_position_age, TimeDelta::seconds(30));
        assert_eq!(params.target_lost_timeout, TimeDelta::minutes(15));
        assert_eq!(params.ais_safety_check_interval, TimeDelta::zero());
        assert_eq!(params.normal_step_size, TimeDelta::seconds(10));
    }

    #[test]
    fn test_parse_config_null_values() {
        let text = r#"
own_ship:
  mmsi: null
  name: ~

safety:
  warning_time_s: soon
"#;
        let config = parse_config(text).unwrap();
        assert!(config.own_ship.mmsi.is_none());
        assert!(config.own_ship.name.is_none());
        // Unparseable value keeps the default.
        assert_eq!(config.safety.warning_time_s, 600);
    }

    #[test]
    fn test_huge_durations_fall_back() {
        let text = r#"
safety:
  warning_time_s: 9223372036854775807
  warning_repeat_s: -9223372036854775808
  check_interval_s: 9223372036854775807
  max_position_age_s: 30
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.safety.warning_time_s, i64::MAX);
        let params = config.track_parameters();
        let defaults = TrackEstimationParameters::default();
        assert_eq!(params.warning_time, defaults.warning_time);
        assert_eq!(params.warning_repeat_timeout, defaults.warning_repeat_timeout);
        assert_eq!(params.ais_safety_check_interval, defaults.ais_safety_check_interval);
        assert_eq!(params.maximum_position_age, TimeDelta::seconds(30));
    }

    #[test]
    fn test_roundtrip() {
        let config = Config {
            own_ship: OwnShipConfig {
                mmsi: Some(211234567),
                name: Some("SEA HAWK".into()),
            },
            safety: SafetyConfig {
                warning_distance_nm: 2.5,
                check_interval_s: 10,
                ..SafetyConfig::default()
            },
            talker: SentenceKind::Vdm,
        };
        let text = serialize_config(&config);
        assert!(text.starts_with("# ais-decode configuration"));
        assert_eq!(parse_config(&text).unwrap(), config);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        assert_eq!(load_config_from(&path), Config::default());

        let mut config = Config::default();
        config.own_ship.mmsi = Some(269110660);
        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path), config);
    }
}
