//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration:
//!
//! ```toml
//! max_frames = 600
//!
//! [arena]
//! initial_capacity = 4096
//! allow_growth = true
//!
//! [schedule]
//! present_priority = 100
//! extract_priority = -100
//!
//! [presentation]
//! warn_on_missing_camera = true
//! clear_color = [0.0, 0.0, 0.0, 1.0]
//! target_width = 1280
//! target_height = 720
//! ```

use std::path::Path;

use krepel_rendering::{Color, ExtractionConfig, RendererConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest accepted `arena.initial_capacity`, 1 GiB.
pub const MAX_ARENA_CAPACITY: usize = 1 << 30;

/// Extraction arena sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Initial capacity of each extraction buffer in bytes.
    pub initial_capacity: usize,
    /// Whether a full buffer doubles instead of aborting.
    pub allow_growth: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            allow_growth: true,
        }
    }
}

/// Priorities of the engine's own loop callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Presentation runs first in the frame.
    pub present_priority: i32,
    /// Extraction runs last, after game logic at priority 0.
    pub extract_priority: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            present_priority: 100,
            extract_priority: -100,
        }
    }
}

/// Presentation options and the main render target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentationConfig {
    /// Warn when a frame was extracted without a camera record.
    pub warn_on_missing_camera: bool,
    /// Clear color as `[r, g, b, a]` in `[0, 1]`.
    pub clear_color: [f32; 4],
    /// Render target width in pixels.
    pub target_width: u32,
    /// Render target height in pixels.
    pub target_height: u32,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            warn_on_missing_camera: true,
            clear_color: Color::CORNFLOWER_BLUE.to_array(),
            target_width: 800,
            target_height: 600,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Extraction arena sizing.
    pub arena: ArenaConfig,
    /// Engine callback priorities.
    pub schedule: ScheduleConfig,
    /// Presentation options.
    pub presentation: PresentationConfig,
    /// Stop [`Engine::run`](crate::Engine::run) after this many frames.
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), "engine configuration loaded");
        Ok(config)
    }

    /// Checks value ranges and cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arena.initial_capacity == 0 && !self.arena.allow_growth {
            return Err(ConfigError::Invalid(
                "arena.initial_capacity must be non-zero when arena.allow_growth is false".into(),
            ));
        }
        if self.arena.initial_capacity > MAX_ARENA_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "arena.initial_capacity ({}) exceeds the maximum of {MAX_ARENA_CAPACITY} bytes",
                self.arena.initial_capacity
            )));
        }
        if self.schedule.present_priority <= self.schedule.extract_priority {
            return Err(ConfigError::Invalid(format!(
                "schedule.present_priority ({}) must be greater than schedule.extract_priority ({})",
                self.schedule.present_priority, self.schedule.extract_priority
            )));
        }
        if self
            .presentation
            .clear_color
            .iter()
            .any(|component| !(0.0..=1.0).contains(component))
        {
            return Err(ConfigError::Invalid(
                "presentation.clear_color components must lie in [0, 1]".into(),
            ));
        }
        if self.presentation.target_width == 0 || self.presentation.target_height == 0 {
            return Err(ConfigError::Invalid(
                "presentation target size must be non-zero".into(),
            ));
        }
        if self.max_frames == Some(0) {
            return Err(ConfigError::Invalid("max_frames must be at least 1".into()));
        }
        Ok(())
    }

    /// Extraction buffer settings.
    #[must_use]
    pub fn extraction(&self) -> ExtractionConfig {
        ExtractionConfig {
            initial_capacity: self.arena.initial_capacity,
            allow_growth: self.arena.allow_growth,
        }
    }

    /// Renderer settings.
    #[must_use]
    pub fn renderer(&self) -> RendererConfig {
        RendererConfig {
            warn_on_missing_camera: self.presentation.warn_on_missing_camera,
        }
    }

    /// Clear color as a [`Color`].
    #[must_use]
    pub fn clear_color(&self) -> Color {
        Color::from_array(self.presentation.clear_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.arena.initial_capacity, 1024);
        assert_eq!(config.schedule.present_priority, 100);
        assert_eq!(config.schedule.extract_priority, -100);
        assert!(config.max_frames.is_none());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_frames = 3

            [arena]
            initial_capacity = 64
            allow_growth = false

            [presentation]
            warn_on_missing_camera = false
            "#,
        )
        .unwrap();

        assert_eq!(config.max_frames, Some(3));
        assert_eq!(config.extraction().initial_capacity, 64);
        assert!(!config.extraction().allow_growth);
        assert!(!config.renderer().warn_on_missing_camera);
        assert_eq!(config.schedule, ScheduleConfig::default());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = EngineConfig::from_toml_str("[arena]\nsize = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_inverted_priorities_are_rejected() {
        let err = EngineConfig::from_toml_str(
            "[schedule]\npresent_priority = -5\nextract_priority = 5\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("present_priority"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let cases = [
            "[presentation]\nclear_color = [2.0, 0.0, 0.0, 1.0]\n",
            "[presentation]\ntarget_width = 0\n",
            "[arena]\ninitial_capacity = 0\nallow_growth = false\n",
            "max_frames = 0\n",
            "[arena]\ninitial_capacity = 9223372036854775000\n",
            "[arena]\ninitial_capacity = 1073741825\n",
        ];
        for case in cases {
            assert!(
                matches!(EngineConfig::from_toml_str(case), Err(ConfigError::Invalid(_))),
                "accepted: {case}"
            );
        }
    }

    #[test]
    fn test_capacity_limit_is_inclusive() {
        let mut config = EngineConfig::default();
        config.arena.initial_capacity = MAX_ARENA_CAPACITY;
        assert!(config.validate().is_ok());
        config.arena.initial_capacity = MAX_ARENA_CAPACITY + 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("arena.initial_capacity"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/nonexistent/krepel/engine.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
