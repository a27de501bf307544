//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings file name inside the config directory.
pub const CONFIG_FILE: &str = "farshore.ron";

/// Failure modes of the `farshore.ron` settings file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but is not valid RON for this schema.
    #[error("settings file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },

    #[error("settings could not be rendered as RON: {0}")]
    Serialize(#[from] ron::Error),
}

/// Top-level world generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Heightfield synthesis settings.
    pub terrain: TerrainSection,
    /// Water body detection settings.
    pub water: WaterSection,
    /// Instanced ground cover streaming settings.
    pub streaming: StreamingSection,
    /// Discrete object placement settings.
    pub discrete: DiscreteSection,
    /// Chunk blanket overlay settings.
    pub blanket: BlanketSection,
    /// Debug/development settings.
    pub debug: DebugSection,
}

/// Island shaping applied after noise synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum IslandMaskMode {
    /// No mask: the raw redistributed noise.
    None,
    /// Single falloff centered on the map.
    RealCenter { inner_edge: f32 },
    /// Several randomly placed falloff centers, forming an archipelago.
    MultiCenter { centers: u32, inner_edge: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainSection {
    /// World seed.
    pub seed: u64,
    /// Raster samples along world X.
    pub x_range: usize,
    /// Raster samples along world Z.
    pub z_range: usize,
    /// Vertical scale in world units.
    pub y_range: f32,
    /// Base noise frequency scale.
    pub noise_scale: f64,
    /// Octave count for fractal summation.
    pub octaves: u32,
    /// Redistribution exponent applied to normalized heights.
    pub redistribution: f32,
    /// Island shaping mode.
    pub island_mask: IslandMaskMode,
}

impl Default for TerrainSection {
    fn default() -> Self {
        Self {
            seed: 0,
            x_range: 1024,
            z_range: 1024,
            y_range: 60.0,
            noise_scale: 20.0,
            octaves: 4,
            redistribution: 1.0,
            island_mask: IslandMaskMode::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WaterSection {
    /// Coarse grid resolution along X.
    pub grid_x: usize,
    /// Coarse grid resolution along Z.
    pub grid_z: usize,
    /// Heights outside this band are ignored entirely.
    pub skip_low: f32,
    pub skip_high: f32,
    /// Heights inside this band classify as water.
    pub water_low: f32,
    pub water_high: f32,
    /// Water surface height as a fraction of the vertical scale.
    pub water_height: f32,
}

impl Default for WaterSection {
    fn default() -> Self {
        Self {
            grid_x: 64,
            grid_z: 64,
            skip_low: 0.0,
            skip_high: 1.0,
            water_low: 0.1,
            water_high: 0.3,
            water_height: 0.25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingSection {
    /// Chunk edge length in world units.
    pub chunk_size: f32,
    /// Candidate positions rolled per chunk.
    pub candidates_per_chunk: usize,
    /// Hard cap on accepted instances per chunk.
    pub max_per_chunk: usize,
    /// Cull chunks beyond this distance from the camera.
    pub culling_distance: f32,
    /// Horizontal field of view for cone culling, degrees.
    pub fov_degrees: f32,
    /// Disable to cull by distance only.
    pub fov_enabled: bool,
    /// Blue-noise acceptance threshold.
    pub noise_threshold: f32,
    /// World-to-UV scale for the blue-noise mask.
    pub noise_scale: f32,
    /// Accepted surface height band, as fractions of the vertical scale.
    pub min_height: f32,
    pub max_height: f32,
    /// Reject ground steeper than this, degrees.
    pub max_slope_degrees: f32,
    /// Vertical sink applied to accepted positions.
    pub y_offset: f32,
    /// Uniform instance scale range.
    pub scale_min: f32,
    pub scale_max: f32,
    /// Random tilt range on both horizontal axes, degrees.
    pub tilt_degrees: f32,
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            chunk_size: 32.0,
            candidates_per_chunk: 100,
            max_per_chunk: 1000,
            culling_distance: 200.0,
            fov_degrees: 100.0,
            fov_enabled: true,
            noise_threshold: 0.3,
            noise_scale: 0.01,
            min_height: 0.0,
            max_height: 1.0,
            max_slope_degrees: 45.0,
            y_offset: -0.05,
            scale_min: 0.8,
            scale_max: 1.2,
            tilt_degrees: 5.0,
        }
    }
}

/// One discrete object population.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnTypeSection {
    pub name: String,
    pub target_count: usize,
    /// Minimum distance to every other placement of the same type.
    pub min_spacing: f32,
    /// Accepted surface height band, as fractions of the vertical scale.
    pub min_height: f32,
    pub max_height: f32,
    pub enabled: bool,
}

impl Default for SpawnTypeSection {
    fn default() -> Self {
        Self {
            name: String::new(),
            target_count: 0,
            min_spacing: 1.0,
            min_height: 0.0,
            max_height: 1.0,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscreteSection {
    /// Attempt budget per type is `target_count * attempt_multiplier`.
    pub attempt_multiplier: usize,
    /// Attempts consumed per tick.
    pub attempts_per_tick: usize,
    /// Object populations, placed in order.
    pub types: Vec<SpawnTypeSection>,
}

impl Default for DiscreteSection {
    fn default() -> Self {
        Self {
            attempt_multiplier: 10,
            attempts_per_tick: 50,
            types: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlanketSection {
    /// Enable the overlay blanket.
    pub enabled: bool,
    /// Kept radius around the anchor, in chunks.
    pub radius_chunks: i32,
    /// Vertical offset above the terrain surface at each chunk center.
    pub height_offset: f32,
    /// Uniform blanket scale.
    pub scale: f32,
    /// Minimum seconds between sweeps.
    pub update_interval: f32,
}

impl Default for BlanketSection {
    fn default() -> Self {
        Self {
            enabled: true,
            radius_chunks: 3,
            height_offset: 8.0,
            scale: 1.0,
            update_interval: 0.5,
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugSection {
    /// Log per-tick streaming statistics.
    pub log_stream_stats: bool,
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugSection {
    fn default() -> Self {
        Self {
            log_stream_stats: false,
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = Self::read_from(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as [`CONFIG_FILE`].
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read_from(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read_from(config_path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }
}

impl Default for IslandMaskMode {
    fn default() -> Self {
        Self::None
    }
}
