//! TOML configuration of a POD post-processing run
//!
//! ```toml
//! [modes]
//! num_components = 3
//! num_modes = 10
//! plot_modes = [0, 1, 2]
//!
//! [coefficients]
//! num_bins = 40
//! bound = 5.0
//! log_scale = true
//!
//! [scatter]
//! thumb_frac = 0.3
//! ```
//!
//! Every section and every key is optional.
use crate::coefficients::{BinSettings, ScatterSettings};
use crate::error::Result;
use crate::modes::{ModeFields, ModePanel};
use crate::types::FloatNum;
use ndarray::{ArrayBase, Data, Ix2};
use serde::Deserialize;
use std::path::Path;

/// Settings of a post-processing run
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Mode reconstruction
    pub modes: ModeConfig,
    /// Coefficient heatmaps
    pub coefficients: BinSettings,
    /// Coefficient scatter plots
    pub scatter: ScatterSettings,
}

/// Settings of the mode reconstruction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Number of velocity components in the mode matrix
    pub num_components: usize,
    /// Number of modes to reconstruct, all by default
    pub num_modes: Option<usize>,
    /// Modes to plot
    pub plot_modes: Vec<usize>,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            num_components: 2,
            num_modes: None,
            plot_modes: vec![0, 1, 2, 3],
        }
    }
}

impl ModeConfig {
    /// Reconstruct mode fields with these settings
    ///
    /// # Errors
    /// See [`crate::modes::reconstruct`]
    pub fn reconstruct<A, S>(
        &self,
        modes: &ArrayBase<S, Ix2>,
        field_shape: (usize, usize),
    ) -> Result<ModeFields<A>>
    where
        A: FloatNum,
        S: Data<Elem = A>,
    {
        let num_modes = self.num_modes.unwrap_or_else(|| modes.ncols());
        ModeFields::from_matrix(modes, field_shape, num_modes, self.num_components)
    }

    /// Panels of the configured `plot_modes`
    ///
    /// # Errors
    /// See [`ModeFields::panels`]
    pub fn panels<A: FloatNum>(&self, fields: &ModeFields<A>) -> Result<Vec<Vec<ModePanel<A>>>> {
        fields.panels(&self.plot_modes)
    }
}

impl AnalysisConfig {
    /// Parse configuration from a TOML string
    ///
    /// # Errors
    /// Invalid TOML or unknown value types
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Load and parse a TOML configuration file.
///
/// # Errors
/// File can not be read or is not valid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = AnalysisConfig::from_toml_str(&content)?;
    log::debug!("loaded configuration {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PodError;
    use ndarray::Array2;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config.modes.num_components, 2);
        assert_eq!(config.modes.num_modes, None);
        assert_eq!(config.coefficients.num_bins, 50);
        assert_eq!(config.coefficients.bound, None);
        assert!(!config.coefficients.log_scale);
        assert!((config.scatter.thumb_frac - 0.5).abs() < 1e-12);
        assert!((config.scatter.vec_dist - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_values() {
        let content = r#"
            [modes]
            num_components = 3
            num_modes = 2

            [coefficients]
            num_bins = 40
            bound = 5.0
            log_scale = true
        "#;
        let config = AnalysisConfig::from_toml_str(content).unwrap();
        assert_eq!(config.modes.num_components, 3);
        assert_eq!(config.modes.plot_modes, vec![0, 1, 2, 3]);
        assert_eq!(config.coefficients.num_bins, 40);
        assert_eq!(config.coefficients.bound, Some(5.0));
        assert!(config.coefficients.log_scale);

        let modes = Array2::<f64>::zeros((3 * 2 * 2, 4));
        let fields = config.modes.reconstruct(&modes, (2, 2)).unwrap();
        assert_eq!(fields.num_components(), 3);
        assert_eq!(fields.num_modes(), 2);
        // default plot modes 2 and 3 exceed the reconstructed modes
        assert!(matches!(
            config.modes.panels(&fields),
            Err(PodError::Domain(_))
        ));
    }

    #[test]
    fn test_plot_modes_select_panels() {
        let config = AnalysisConfig::from_toml_str("[modes]\nplot_modes = [1, 3]").unwrap();
        let modes = Array2::<f64>::ones((2 * 3 * 2, 4));
        let fields = config.modes.reconstruct(&modes, (3, 2)).unwrap();
        let panels = config.modes.panels(&fields).unwrap();
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[1][0].mode, 3);
        assert_eq!(panels[1].len(), 2);
        assert!((panels[0][1].clim - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AnalysisConfig::from_toml_str("[modes]\nnum_components = \"two\"");
        assert!(matches!(result, Err(PodError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(PodError::Io(_))));
    }
}
