use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::editor::DragTuning;
use crate::export::CourseHeader;
use crate::logging::LogConfig;
use crate::metrics::TrainingLoadCalculator;
use crate::models::{IntervalShape, ShapeLimits};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// Interval shape bounds and defaults
    pub editor: EditorSettings,

    /// Training-load calculation settings
    pub metrics: MetricsSettings,

    /// Drag damping and timing
    pub drag: DragSettings,

    /// Course file header defaults
    pub export: ExportSettings,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Interval shape bounds and defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Handle size; minimum power is twice and minimum duration three times this
    pub handle_size: u16,

    /// Upper power bound (%)
    pub max_power: u16,

    /// Start power of new intervals (%)
    pub default_start_power: u16,

    /// End power of new intervals (%)
    pub default_end_power: u16,

    /// Duration of new intervals in seconds
    pub default_duration: u32,

    /// Initial zoom factor
    pub zoom: f64,
}

/// Training-load calculation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSettings {
    /// Normalized Power sampling step in seconds
    pub segment_length: u32,

    /// Reference (threshold) power in percent
    pub reference_power: f64,
}

/// Drag damping and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragSettings {
    /// Per-sample pointer speed below which drags are damped
    pub speed_threshold: f64,

    /// Divisor applied to slow height drags
    pub height_damping: f64,

    /// Divisor applied to slow width drags (plus zoom when zoom > 1)
    pub width_damping: f64,

    /// Minimum spacing of pointer speed samples
    pub sample_interval_ms: u64,

    /// Quiet period before metrics are recomputed after an edit
    pub debounce_ms: u64,
}

/// Course file header defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    pub file_name: String,
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            editor: EditorSettings::default(),
            metrics: MetricsSettings::default(),
            drag: DragSettings::default(),
            export: ExportSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        EditorSettings {
            handle_size: crate::models::HANDLE_SIZE,
            max_power: crate::models::MAX_POWER,
            default_start_power: crate::models::DEFAULT_POWER,
            default_end_power: crate::models::DEFAULT_POWER,
            default_duration: crate::models::DEFAULT_DURATION,
            zoom: 1.0,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        MetricsSettings {
            segment_length: crate::metrics::SEGMENT_LENGTH,
            reference_power: crate::metrics::REFERENCE_POWER,
        }
    }
}

impl Default for DragSettings {
    fn default() -> Self {
        let tuning = DragTuning::default();
        DragSettings {
            speed_threshold: tuning.speed_threshold,
            height_damping: tuning.height_damping,
            width_damping: tuning.width_damping,
            sample_interval_ms: crate::editor::velocity::SAMPLE_INTERVAL_MS,
            debounce_ms: 250,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        let header = CourseHeader::default();
        ExportSettings {
            file_name: header.file_name,
            description: header.description,
        }
    }
}

impl EditorSettings {
    pub fn limits(&self) -> ShapeLimits {
        ShapeLimits::from_handle_size(self.handle_size, self.max_power)
    }

    /// Shape given to new intervals, clamped into the limits
    pub fn default_shape(&self) -> IntervalShape {
        self.limits().clamp_shape(IntervalShape {
            start_power: self.default_start_power,
            end_power: self.default_end_power,
            duration: self.default_duration,
        })
    }
}

impl MetricsSettings {
    pub fn calculator(&self) -> TrainingLoadCalculator {
        TrainingLoadCalculator::new(self.segment_length, self.reference_power)
    }
}

impl DragSettings {
    pub fn tuning(&self) -> DragTuning {
        DragTuning {
            speed_threshold: self.speed_threshold,
            height_damping: self.height_damping,
            width_damping: self.width_damping,
        }
    }
}

impl ExportSettings {
    pub fn header(&self) -> CourseHeader {
        CourseHeader {
            description: self.description.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".intervalrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(path = %config_path.display(), error = %err, "using default configuration");
                Self::default()
            }
        }
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        let limits = self.editor.limits();
        if self.editor.handle_size == 0 {
            bail!("editor.handle_size must be positive");
        }
        if limits.max_power < limits.min_power {
            bail!(
                "editor.max_power ({}) is below the minimum power ({})",
                limits.max_power,
                limits.min_power
            );
        }
        if !(self.editor.zoom.is_finite() && self.editor.zoom > 0.0) {
            bail!("editor.zoom must be a positive number");
        }
        if self.metrics.segment_length == 0 {
            bail!("metrics.segment_length must be positive");
        }
        if !(self.metrics.reference_power.is_finite() && self.metrics.reference_power > 0.0) {
            bail!("metrics.reference_power must be a positive number");
        }
        if self.drag.height_damping <= 0.0 || self.drag.width_damping <= 0.0 {
            bail!("drag damping factors must be positive");
        }
        Ok(())
    }

    /// Read a setting by dotted key, e.g. `metrics.reference_power`
    pub fn get_value(&self, key: &str) -> Result<String> {
        let table = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        let value = key
            .split('.')
            .try_fold(&table, |node, part| node.get(part))
            .with_context(|| format!("Unknown configuration key: {}", key))?;

        Ok(match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a setting by dotted key. The value is parsed as TOML and falls back
    /// to a plain string.
    pub fn set_value(&mut self, key: &str, raw: &str) -> Result<()> {
        let mut table = toml::Value::try_from(&*self).context("Failed to serialize configuration")?;

        let mut node = &mut table;
        for part in key.split('.') {
            node = node
                .get_mut(part)
                .with_context(|| format!("Unknown configuration key: {}", key))?;
        }
        if node.is_table() {
            bail!("{} is a section, not a value", key);
        }

        let parsed = format!("v = {}", raw)
            .parse::<toml::Table>()
            .ok()
            .and_then(|mut t| t.remove("v"))
            .unwrap_or_else(|| toml::Value::String(raw.to_string()));
        *node = parsed;

        let updated: AppConfig = table
            .try_into()
            .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
        updated.validate()?;

        *self = updated;
        self.metadata.updated_at = Utc::now();
        Ok(())
    }

    /// Every leaf setting as `(dotted key, value)` pairs
    pub fn list_values(&self) -> Result<Vec<(String, String)>> {
        fn walk(prefix: &str, value: &toml::Value, out: &mut Vec<(String, String)>) {
            match value {
                toml::Value::Table(table) => {
                    for (key, child) in table {
                        let path = if prefix.is_empty() {
                            key.clone()
                        } else {
                            format!("{}.{}", prefix, key)
                        };
                        walk(&path, child, out);
                    }
                }
                toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let table = toml::Value::try_from(self).context("Failed to serialize configuration")?;
        let mut out = Vec::new();
        walk("", &table, &mut out);
        Ok(out)
    }
}
