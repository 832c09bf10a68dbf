use crate::domain::{config::GrabConfig, error::{GrabError, GrabResult}};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const PROJECT_DIR: &str = ".serialgrab";
const CONFIG_FILE: &str = "config.toml";

/// Configuration manager
pub struct ConfigManager {
    global_config_path: Option<PathBuf>,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> Self {
        Self {
            global_config_path: Self::global_config_path(),
            project_config_path: Self::find_project_config_path(),
        }
    }

    /// Load configuration: defaults, then the global file, then the
    /// nearest project file. Later files replace earlier ones wholesale.
    pub fn load_config(&self) -> GrabResult<GrabConfig> {
        let mut config = GrabConfig::default();

        let candidates = [&self.global_config_path, &self.project_config_path];
        for path in candidates.into_iter().flatten() {
            if path.exists() {
                debug!("Loading configuration from {}", path.display());
                config = self.load_config_from_path(path)?;
            }
        }

        Ok(config)
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> GrabResult<GrabConfig> {
        let content = fs::read_to_string(path).map_err(|e| GrabError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| GrabError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &GrabConfig) -> GrabResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| GrabError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| GrabError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Write a default project configuration under `dir/.serialgrab/`.
    pub fn init_project_config(&self, dir: &Path) -> GrabResult<PathBuf> {
        let config_dir = dir.join(PROJECT_DIR);
        let config_file = config_dir.join(CONFIG_FILE);

        if config_file.exists() {
            return Err(GrabError::Config {
                message: format!("Project configuration already exists at {}", config_file.display()),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| GrabError::Config {
            message: format!("Failed to create {} directory: {}", PROJECT_DIR, e),
        })?;

        self.save_config_to_path(&config_file, &GrabConfig::default())?;
        Ok(config_file)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("serialgrab").join(CONFIG_FILE))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(PROJECT_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
