use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

/// A file describes a whole creature: sections it omits are empty, never
/// filled in from the built-in one.
#[derive(Debug, Clone, Deserialize)]
pub struct MoodConfig {
    /// States in declaration order. The order drives range layout and sampling.
    #[serde(default)]
    pub states: Vec<StateConfig>,
    #[serde(default)]
    pub stimuli: Vec<StimulusConfig>,
    /// Starting state; the first declared state when unset.
    #[serde(default)]
    pub initial_state: Option<String>,
    /// RNG seed for reproducible runs. Entropy-seeded when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub heartbeat: HeartbeatSettings,
}

impl MoodConfig {
    /// Load config from a TOML file. After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return the
    /// built-in creature with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Mood config not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse mood TOML config")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MOODRING_INITIAL_STATE") {
            self.initial_state = Some(v);
        }
        if let Ok(v) = std::env::var("MOODRING_SEED") {
            if let Ok(n) = v.parse() {
                self.seed = Some(n);
            }
        }
        if let Ok(v) = std::env::var("MOODRING_TICK_MS") {
            if let Ok(n) = v.parse() {
                self.heartbeat.interval_ms = n;
            }
        }
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            states: default_states(),
            stimuli: default_stimuli(),
            initial_state: None,
            seed: None,
            heartbeat: HeartbeatSettings::default(),
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// One mood as written in configuration. Checked by `StateCatalog::load`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub id: String,
    /// Likelihood (0-100) of staying put before modifiers.
    pub base_self_weight: Option<f64>,
    /// Weight (0-100) per other state id. Must name every other state exactly once.
    #[serde(default)]
    pub switch_weights: BTreeMap<String, f64>,
    /// Opaque to the engine; handed through to the display.
    pub display_color: Option<String>,
}

impl StateConfig {
    pub fn new(id: &str, base_self_weight: f64, switch_weights: &[(&str, f64)]) -> Self {
        Self {
            id: id.to_string(),
            base_self_weight: Some(base_self_weight),
            switch_weights: switch_weights
                .iter()
                .map(|(k, w)| (k.to_string(), *w))
                .collect(),
            display_color: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StimulusConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub target_state: String,
    /// Signed delta added to the target's self modifier. Required; checked by
    /// `StimulusCatalog::load`.
    pub effect: Option<f64>,
    pub display_verb: Option<String>,
    pub display_label: Option<String>,
}

impl StimulusConfig {
    pub fn new(id: &str, target_state: &str, effect: f64) -> Self {
        Self {
            id: id.to_string(),
            target_state: target_state.to_string(),
            effect: Some(effect),
            display_verb: None,
            display_label: None,
        }
    }
}

/// Tick cadence for drivers that step the engine on a timer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    pub interval_ms: u64,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

// ============================================================================
// Built-in creature
// ============================================================================

fn default_states() -> Vec<StateConfig> {
    vec![
        StateConfig::new(
            "hungry",
            80.0,
            &[("thirsty", 35.0), ("happy", 10.0), ("sad", 20.0), ("tired", 35.0)],
        ),
        StateConfig::new(
            "thirsty",
            70.0,
            &[("hungry", 40.0), ("happy", 10.0), ("sad", 30.0), ("tired", 20.0)],
        ),
        StateConfig::new(
            "happy",
            50.0,
            &[("hungry", 30.0), ("thirsty", 20.0), ("sad", 10.0), ("tired", 40.0)],
        ),
        StateConfig::new(
            "sad",
            30.0,
            &[("hungry", 25.0), ("thirsty", 25.0), ("happy", 10.0), ("tired", 40.0)],
        ),
        StateConfig::new(
            "tired",
            50.0,
            &[("hungry", 40.0), ("thirsty", 10.0), ("happy", 10.0), ("sad", 40.0)],
        ),
    ]
}

fn default_stimuli() -> Vec<StimulusConfig> {
    vec![
        StimulusConfig::new("food", "hungry", -0.2),
        StimulusConfig::new("drink", "thirsty", -0.4),
        StimulusConfig::new("election-results", "happy", -0.7),
        StimulusConfig::new("balloons", "sad", -0.3),
        StimulusConfig::new("energy-drink", "tired", -0.35),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = MoodConfig::default();
        assert_eq!(cfg.states.len(), 5);
        assert_eq!(cfg.stimuli.len(), 5);
        assert_eq!(cfg.states[0].id, "hungry");
        assert_eq!(cfg.states[0].base_self_weight, Some(80.0));
        assert!(cfg.initial_state.is_none());
        assert_eq!(cfg.heartbeat.interval_ms, 1000);
    }

    #[test]
    fn test_default_switch_weights_cover_other_states() {
        let cfg = MoodConfig::default();
        for state in &cfg.states {
            assert_eq!(state.switch_weights.len(), cfg.states.len() - 1);
            assert!(!state.switch_weights.contains_key(&state.id));
            let total: f64 = state.switch_weights.values().sum();
            assert!((total - 100.0).abs() < 1e-9, "{} sums to {}", state.id, total);
        }
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r##"
initial_state = "calm"
seed = 7

[heartbeat]
interval_ms = 250

[[states]]
id = "calm"
base_self_weight = 60
display_color = "#88c0d0"
[states.switch_weights]
grumpy = 100

[[states]]
id = "grumpy"
base_self_weight = 40
[states.switch_weights]
calm = 100

[[stimuli]]
id = "tea"
target_state = "grumpy"
effect = -0.5
display_verb = "Brew"
display_label = "a cup of tea"
"##;
        let cfg = MoodConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.initial_state.as_deref(), Some("calm"));
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.heartbeat.interval_ms, 250);
        assert_eq!(cfg.states.len(), 2);
        assert_eq!(cfg.states[0].display_color.as_deref(), Some("#88c0d0"));
        assert_eq!(cfg.states[1].switch_weights["calm"], 100.0);
        assert_eq!(cfg.stimuli[0].effect, Some(-0.5));
        assert_eq!(cfg.stimuli[0].display_verb.as_deref(), Some("Brew"));
    }

    #[test]
    fn test_missing_base_weight_parses_as_none() {
        let toml_str = r#"
[[states]]
id = "calm"
"#;
        let cfg = MoodConfig::from_toml_str(toml_str).unwrap();
        assert!(cfg.states[0].base_self_weight.is_none());
        assert!(cfg.states[0].switch_weights.is_empty());
    }

    #[test]
    fn test_file_without_stimuli_has_none() {
        let toml_str = r#"
[[states]]
id = "calm"
base_self_weight = 60
[states.switch_weights]
grumpy = 100

[[states]]
id = "grumpy"
base_self_weight = 40
[states.switch_weights]
calm = 100
"#;
        let cfg = MoodConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(cfg.states.len(), 2);
        assert!(cfg.stimuli.is_empty());
        assert_eq!(cfg.heartbeat.interval_ms, 1000);
    }

    #[test]
    fn test_empty_file_has_no_states() {
        let cfg = MoodConfig::from_toml_str("seed = 1").unwrap();
        assert!(cfg.states.is_empty());
        assert!(cfg.stimuli.is_empty());
        assert_eq!(cfg.seed, Some(1));
    }

    #[test]
    fn test_missing_effect_parses_as_none() {
        let toml_str = r#"
[[stimuli]]
id = "tea"
target_state = "grumpy"
"#;
        let cfg = MoodConfig::from_toml_str(toml_str).unwrap();
        assert!(cfg.stimuli[0].effect.is_none());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(MoodConfig::from_toml_str("states = 3").is_err());
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("MOODRING_INITIAL_STATE", "sad");
        std::env::set_var("MOODRING_SEED", "42");
        std::env::set_var("MOODRING_TICK_MS", "not-a-number");

        let mut cfg = MoodConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.initial_state.as_deref(), Some("sad"));
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.heartbeat.interval_ms, 1000);

        std::env::remove_var("MOODRING_INITIAL_STATE");
        std::env::remove_var("MOODRING_SEED");
        std::env::remove_var("MOODRING_TICK_MS");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = MoodConfig::load_or_default("/nonexistent/mood.toml");
        assert_eq!(cfg.states.len(), 5);
        assert!(cfg.seed.is_none());
    }
}
