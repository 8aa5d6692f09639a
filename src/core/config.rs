//! Configuration for the synthetic dataset generator.
//!
//! This module provides the tunable knobs of a generation run: how many
//! elements a canvas may carry, how much slack the canvas area gets relative
//! to the total element area, the downsampling fallback range, worker-pool
//! sizing, and the RNG seed. All fields have defaults matching the published
//! dataset recipe, so `GeneratorConfig::default()` reproduces it.

use serde::{Deserialize, Serialize};

use super::errors::{DatagenError, DatagenResult};

/// Configuration for a generation run.
///
/// The struct is deserializable so runs can be configured from JSON, and
/// every field carries a chainable `with_*` setter for configuration in
/// code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Minimum number of elements per canvas (inclusive).
    #[serde(default = "GeneratorConfig::default_min_elements")]
    pub min_elements: usize,

    /// Maximum number of elements per canvas (inclusive).
    #[serde(default = "GeneratorConfig::default_max_elements")]
    pub max_elements: usize,

    /// Range the per-task canvas area inflation factor is drawn from.
    /// The canvas area is the summed element area times this factor, so the
    /// low end of the range directly controls how hard placement has to
    /// work.
    #[serde(default = "GeneratorConfig::default_area_factor_range")]
    pub area_factor_range: (f64, f64),

    /// Raw canvas side lengths above this ceiling are downsampled.
    #[serde(default = "GeneratorConfig::default_canvas_ceiling")]
    pub canvas_ceiling: u32,

    /// Range the fallback output side is drawn from (half-open) when the
    /// raw canvas exceeds the ceiling.
    #[serde(default = "GeneratorConfig::default_fallback_side_range")]
    pub fallback_side_range: (u32, u32),

    /// Number of worker threads for the task executor.
    /// If None, the available CPU parallelism is used.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Seed for the master random source. If None, the run is seeded from
    /// the operating system and is not reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    fn default_min_elements() -> usize {
        1
    }

    fn default_max_elements() -> usize {
        15
    }

    fn default_area_factor_range() -> (f64, f64) {
        (2.0, 4.0)
    }

    fn default_canvas_ceiling() -> u32 {
        800
    }

    fn default_fallback_side_range() -> (u32, u32) {
        (600, 800)
    }

    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a configuration from a JSON file, filling omitted fields with
    /// their defaults.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a
    /// [`DatagenError::ConfigError`] if it does not deserialize.
    pub fn from_json_file(path: &std::path::Path) -> DatagenResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|error| {
            DatagenError::config_error(format!("{}: {error}", path.display()))
        })
    }

    /// Sets the element count range.
    pub fn with_element_range(mut self, min: usize, max: usize) -> Self {
        self.min_elements = min;
        self.max_elements = max;
        self
    }

    /// Sets the canvas area inflation factor range.
    pub fn with_area_factor_range(mut self, low: f64, high: f64) -> Self {
        self.area_factor_range = (low, high);
        self
    }

    /// Sets the raw canvas ceiling.
    pub fn with_canvas_ceiling(mut self, ceiling: u32) -> Self {
        self.canvas_ceiling = ceiling;
        self
    }

    /// Sets the fallback output side range.
    pub fn with_fallback_side_range(mut self, low: u32, high: u32) -> Self {
        self.fallback_side_range = (low, high);
        self
    }

    /// Sets the worker thread count.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the master RNG seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`DatagenError::ConfigError`] describing the first invalid
    /// field found.
    pub fn validate(&self) -> DatagenResult<()> {
        if self.min_elements == 0 {
            return Err(DatagenError::config_error(
                "min_elements must be at least 1",
            ));
        }
        if self.min_elements > self.max_elements {
            return Err(DatagenError::config_error(format!(
                "min_elements ({}) exceeds max_elements ({})",
                self.min_elements, self.max_elements
            )));
        }
        let (factor_low, factor_high) = self.area_factor_range;
        if !(factor_low.is_finite() && factor_high.is_finite()) || factor_low > factor_high {
            return Err(DatagenError::config_error(format!(
                "area_factor_range ({factor_low}, {factor_high}) is not an ordered range"
            )));
        }
        if factor_low < 1.0 {
            return Err(DatagenError::config_error(
                "area_factor_range must start at 1.0 or above; a canvas smaller \
                 than its elements can never be packed",
            ));
        }
        let (side_low, side_high) = self.fallback_side_range;
        if side_low == 0 || side_low >= side_high {
            return Err(DatagenError::config_error(format!(
                "fallback_side_range ({side_low}, {side_high}) is not an ordered non-zero range"
            )));
        }
        if self.canvas_ceiling == 0 {
            return Err(DatagenError::config_error("canvas_ceiling must be non-zero"));
        }
        if self.workers == Some(0) {
            return Err(DatagenError::config_error("workers must be non-zero"));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_elements: Self::default_min_elements(),
            max_elements: Self::default_max_elements(),
            area_factor_range: Self::default_area_factor_range(),
            canvas_ceiling: Self::default_canvas_ceiling(),
            fallback_side_range: Self::default_fallback_side_range(),
            workers: None,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = GeneratorConfig::new()
            .with_element_range(2, 8)
            .with_area_factor_range(3.0, 5.0)
            .with_seed(Some(7));
        assert_eq!(config.min_elements, 2);
        assert_eq!(config.max_elements, 8);
        assert_eq!(config.area_factor_range, (3.0, 5.0));
        assert_eq!(config.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_ranges_are_rejected() {
        assert!(
            GeneratorConfig::new()
                .with_element_range(0, 5)
                .validate()
                .is_err()
        );
        assert!(
            GeneratorConfig::new()
                .with_element_range(6, 5)
                .validate()
                .is_err()
        );
        assert!(
            GeneratorConfig::new()
                .with_area_factor_range(0.5, 2.0)
                .validate()
                .is_err()
        );
        assert!(
            GeneratorConfig::new()
                .with_fallback_side_range(700, 700)
                .validate()
                .is_err()
        );
        assert!(
            GeneratorConfig::new()
                .with_workers(Some(0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_deserialization_fills_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"max_elements": 6}"#).unwrap();
        assert_eq!(config.min_elements, 1);
        assert_eq!(config.max_elements, 6);
        assert_eq!(config.canvas_ceiling, 800);
        assert_eq!(config.fallback_side_range, (600, 800));
    }
}
