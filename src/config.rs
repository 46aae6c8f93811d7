//! Configuration file handling for a64enc.
//!
//! Loads configuration from `<config dir>/a64-multicolor/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::charset::{LumaReference, PaletteError, GRAY_GRADIENT};
use crate::encoder::{lifetime_from_quality, EncoderConfig};
use crate::payload::ColorMode;
use crate::quantizer::{DEFAULT_SEED, DEFAULT_STEPS};

/// Configuration file structure.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub encoder: EncoderSection,
    #[serde(default)]
    pub quantizer: QuantizerSection,
    #[serde(default)]
    pub palette: PaletteSection,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct EncoderSection {
    /// Lambda-scale quality, mapped to a lifetime
    #[serde(default)]
    pub quality: i32,
    /// Explicit lifetime, wins over `quality`
    #[serde(default)]
    pub lifetime: Option<usize>,
    #[serde(default)]
    pub mode: ColorMode,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct QuantizerSection {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_seed")]
    pub seed: u32,
}

impl Default for QuantizerSection {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct PaletteSection {
    /// C64 palette indices, darkest first
    #[serde(default = "default_gradient")]
    pub gradient: [u8; 5],
}

impl Default for PaletteSection {
    fn default() -> Self {
        Self {
            gradient: GRAY_GRADIENT,
        }
    }
}

fn default_steps() -> u32 {
    DEFAULT_STEPS
}

fn default_seed() -> u32 {
    DEFAULT_SEED
}

fn default_gradient() -> [u8; 5] {
    GRAY_GRADIENT
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid palette: {0}")]
    Palette(#[from] PaletteError),
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            Self::load_from_explicit(&path)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load configuration from a file that must exist.
    pub fn load_from_explicit(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Lifetime from the explicit setting or the quality mapping.
    pub fn lifetime(&self) -> usize {
        self.encoder
            .lifetime
            .unwrap_or_else(|| lifetime_from_quality(self.encoder.quality))
            .max(1)
    }

    /// Build the encoder settings, validating the palette gradient.
    pub fn encoder_config(&self) -> Result<EncoderConfig, ConfigError> {
        Ok(EncoderConfig {
            lifetime: self.lifetime(),
            mode: self.encoder.mode,
            reference: LumaReference::from_gradient(self.palette.gradient)?,
        })
    }
}

/// Contents written by `a64enc config init`.
pub const DEFAULT_CONFIG: &str = r#"# a64enc configuration

[encoder]
# Lambda-scale quality: below 1 => 4 frames per charset, else quality / 118
quality = 0
# Frames per charset, overrides quality
# lifetime = 4
# Color mode: multi (4 colors) or multi5 (5 colors, adds a colorram map)
mode = "multi"

[quantizer]
# Refinement passes per batch
steps = 5
# Seed for codebook initialisation
seed = 1

[palette]
# C64 palette indices from darkest to brightest
gradient = [0, 11, 12, 15, 1]
"#;

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("a64-multicolor").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/a64-multicolor/config.toml")
        })
}
