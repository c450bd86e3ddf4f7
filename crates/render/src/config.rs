//! Render configuration, loaded from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors from loading or validating a [`RenderConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 700,
            title: "pickview".into(),
            vsync: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 70.0,
            near_plane: 0.1,
            far_plane: 1000.0,
        }
    }
}

/// Everything the apps read at startup. Missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub window: WindowConfig,
    pub projection: ProjectionConfig,
    pub sky_colour: [f32; 3],
    /// Run the pick pass at all. Off means clicks never select.
    pub picking: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            projection: ProjectionConfig::default(),
            sky_colour: [0.4, 0.1, 0.2],
            picking: true,
        }
    }
}

impl RenderConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded render config");
        Ok(config)
    }

    /// Load `path` if given and present; otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::warn!(path = %p.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.projection;
        if !(p.fov_degrees > 0.0 && p.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees {} outside (0, 180)",
                p.fov_degrees
            )));
        }
        if !(p.near_plane > 0.0 && p.far_plane > p.near_plane) {
            return Err(ConfigError::Invalid(format!(
                "need 0 < near_plane < far_plane, got {} and {}",
                p.near_plane, p.far_plane
            )));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid("window size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let c = RenderConfig::default();
        assert_eq!((c.window.width, c.window.height), (700, 700));
        assert_eq!(c.projection.fov_degrees, 70.0);
        assert_eq!(c.projection.near_plane, 0.1);
        assert_eq!(c.projection.far_plane, 1000.0);
        assert_eq!(c.sky_colour, [0.4, 0.1, 0.2]);
        assert!(c.picking);
        c.validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let c = RenderConfig::from_yaml_str("window:\n  width: 1280\nprojection:\n  fov_degrees: 60\n")
            .unwrap();
        assert_eq!(c.window.width, 1280);
        assert_eq!(c.window.height, 700);
        assert_eq!(c.projection.fov_degrees, 60.0);
        assert_eq!(c.projection.far_plane, 1000.0);
    }

    #[test]
    fn rejects_bad_planes() {
        let err = RenderConfig::from_yaml_str("projection:\n  near_plane: 10\n  far_plane: 5\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(matches!(
            RenderConfig::from_yaml_str("window: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn yaml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("render.yaml");
        let mut config = RenderConfig::default();
        config.sky_colour = [0.1, 0.2, 0.3];
        config.picking = false;
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let c = RenderConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(c, RenderConfig::default());
        assert!(matches!(RenderConfig::load(&path), Err(ConfigError::Io { .. })));
    }
}
