//! Configuration loading for Trellis.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. User config (`~/.trellis/config.toml`)
//! 3. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FailOpen, Result, TrellisError};

/// Main configuration struct for Trellis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Review scheduling configuration.
    pub review: ReviewConfig,
}

/// Review scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReviewConfig {
    /// Failing reviews before a card is flagged as a leech.
    pub leech_threshold: u32,
}

/// Minimum valid leech threshold (a card must lapse at least once).
pub const MIN_LEECH_THRESHOLD: u32 = 1;

impl ReviewConfig {
    /// Check if a leech threshold is valid (must be >= 1).
    ///
    /// A threshold of 0 would flag every card before its first lapse.
    pub fn is_valid_leech_threshold(value: u32) -> bool {
        value >= MIN_LEECH_THRESHOLD
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            leech_threshold: crate::srs::DEFAULT_LEECH_THRESHOLD,
        }
    }
}

impl Config {
    /// Load configuration with the full precedence chain.
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        config.apply_env_overrides();
        config
    }

    /// Load user config from `~/.trellis/config.toml`.
    ///
    /// A missing file is normal and yields `None`; a present but unreadable
    /// or invalid file fails open to defaults with a warning.
    fn load_user_config() -> Option<Config> {
        let home = trellis_home()?;
        let config_path = home.join("config.toml");
        if !config_path.exists() {
            return None;
        }
        Some(Self::load_from_file(&config_path).fail_open_default("loading user config"))
    }

    /// Load config from a specific file path.
    fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| TrellisError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| TrellisError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // TRELLIS_LEECH_THRESHOLD
        if let Ok(val) = env::var("TRELLIS_LEECH_THRESHOLD") {
            match val.parse::<u32>() {
                Ok(n) => {
                    if ReviewConfig::is_valid_leech_threshold(n) {
                        self.review.leech_threshold = n;
                    } else {
                        eprintln!(
                            "Warning: Invalid TRELLIS_LEECH_THRESHOLD value '{}'. \
                            Must be >= {}. Using default '{}'.",
                            n, MIN_LEECH_THRESHOLD, self.review.leech_threshold
                        );
                    }
                }
                Err(_) => eprintln!(
                    "Warning: Invalid TRELLIS_LEECH_THRESHOLD value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.review.leech_threshold
                ),
            }
        }
    }

    /// Merge another config into this one. The `other` config takes
    /// precedence for every field it sets to a non-default value.
    fn merge(mut self, other: Config) -> Self {
        let default_review = ReviewConfig::default();
        if other.review.leech_threshold != default_review.leech_threshold {
            self.review.leech_threshold = other.review.leech_threshold;
        }
        self
    }

}

/// Get the Trellis home directory.
///
/// Checks `TRELLIS_HOME` first, then falls back to `~/.trellis`.
pub fn trellis_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("TRELLIS_HOME") {
        if home.is_empty() {
            tracing::warn!("TRELLIS_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("TRELLIS_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    dirs::home_dir().map(|home| home.join(".trellis"))
}

/// Get the per-deck memory-state directory.
///
/// Returns `<trellis_home>/srs/`.
pub fn srs_dir() -> Option<PathBuf> {
    trellis_home().map(|h| h.join("srs"))
}

/// Get the node-progress file path.
///
/// Returns `<trellis_home>/progress.json`.
pub fn progress_path() -> Option<PathBuf> {
    trellis_home().map(|h| h.join("progress.json"))
}

/// Get the curriculum path document location.
///
/// Returns `<trellis_home>/curriculum/path.json`.
pub fn curriculum_path() -> Option<PathBuf> {
    trellis_home().map(|h| h.join("curriculum").join("path.json"))
}

/// Get the deck manifests directory.
///
/// Returns `<trellis_home>/decks/`.
pub fn decks_dir() -> Option<PathBuf> {
    trellis_home().map(|h| h.join("decks"))
}
