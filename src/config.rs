use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use stl_viewer_mcp::gateway::{DEFAULT_PROBE_DELAY, DetachedLauncher, LaunchTarget, MessageTemplates};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub viewer: ViewerConfig,
    pub messages: MessageTemplates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Overrides `<project_root>/build/Release/stl_viewer`
    pub executable: Option<PathBuf>,
    /// Defaults to two levels above the directory holding this binary
    pub project_root: Option<PathBuf>,
    pub probe_delay_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            executable: None,
            project_root: None,
            probe_delay_ms: DEFAULT_PROBE_DELAY.as_millis() as u64,
        }
    }
}

impl ViewerConfig {
    /// Resolve the single launch target for this server
    pub fn launch_target(&self) -> Result<LaunchTarget> {
        // Relative paths are taken from the server's working directory, never the viewer's
        let mut target = match &self.project_root {
            Some(root) => LaunchTarget::for_project_root(&absolute(root)?),
            None => LaunchTarget::from_current_exe().context("Failed to resolve project root")?,
        };

        if let Some(executable) = &self.executable {
            target.executable = absolute(executable)?;
        }
        Ok(target)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).context(format!("Failed to resolve {}", path.display()))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            viewer: ViewerConfig::default(),
            messages: MessageTemplates::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let (config, warnings) = Self::load_first(&Self::candidate_paths());
        // Logging is not set up yet, so skipped files are reported on stderr
        for warning in &warnings {
            eprintln!("Warning: {}", warning);
        }
        Ok(config)
    }

    /// Primary location `~/.config/<project>/<project>.yml`, then `./<project>.yml`
    fn candidate_paths() -> Vec<PathBuf> {
        let project_name = env!("CARGO_PKG_NAME");
        let mut candidates = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(project_name).join(format!("{}.yml", project_name)));
        }
        candidates.push(PathBuf::from(format!("{}.yml", project_name)));
        candidates
    }

    /// Load the first readable candidate, collecting a warning for each broken one
    fn load_first(candidates: &[PathBuf]) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return (config, warnings),
                Err(e) => warnings.push(format!("Failed to load config from {}: {:#}", path.display(), e)),
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        (Self::default(), warnings)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Build the launcher from the viewer and message settings
    pub fn launcher(&self) -> Result<DetachedLauncher> {
        let target = self.viewer.launch_target()?;
        Ok(DetachedLauncher::new(target)
            .with_probe_delay(self.viewer.probe_delay())
            .with_templates(self.messages.clone()))
    }
}
