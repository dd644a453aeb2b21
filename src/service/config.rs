//! Configuration for the gRNA design web service

use serde::{Deserialize, Serialize};

use crate::config::{DataConfig, ExplanationConfig, ScanConfig, SourcesConfig};
use crate::error::GrnaError;
use crate::locus::LocusRegistry;

/// Main service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Guide scanning parameters
    #[serde(default)]
    pub scan: ScanConfig,
    /// Ordered sequence sources
    #[serde(default)]
    pub sources: SourcesConfig,
    /// Explanation generator
    #[serde(default)]
    pub explanation: ExplanationConfig,
    /// Data artifacts
    #[serde(default)]
    pub data: DataConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to (default: "0.0.0.0")
    pub host: String,
    /// Port to listen on (default: 5000)
    pub port: u16,
    /// Maximum request size (default: "10MB")
    pub max_request_size: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_request_size: "10MB".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ServiceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Names of enabled sequence sources in fallback order
    pub fn enabled_sources(&self) -> Vec<String> {
        self.sources
            .enabled_sources()
            .iter()
            .map(|kind| kind.to_string())
            .collect()
    }

    /// Load the configured registry, or the embedded one
    pub fn load_registry(&self) -> Result<LocusRegistry, GrnaError> {
        match &self.data.registry_path {
            Some(path) => LocusRegistry::from_path(path),
            None => LocusRegistry::embedded(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        parse_size(&self.server.max_request_size)
            .map_err(|e| format!("Invalid max_request_size: {}", e))?;

        self.scan
            .params()
            .map_err(|e| format!("Invalid scan configuration: {}", e))?;

        if self.enabled_sources().is_empty() {
            return Err("At least one sequence source must be enabled".to_string());
        }

        if let Some(path) = &self.data.registry_path {
            if !path.exists() {
                return Err(format!(
                    "Registry file does not exist: {}",
                    path.display()
                ));
            }
        }

        Ok(())
    }
}

/// Parse size strings like "10MB", "1GB", etc.
pub fn parse_size(size_str: &str) -> Result<usize, String> {
    let size_str = size_str.trim().to_uppercase();

    // Check longer suffixes first to avoid partial matches
    let (num_str, multiplier) = if let Some(num_str) = size_str.strip_suffix("GB") {
        (num_str, 1024 * 1024 * 1024)
    } else if let Some(num_str) = size_str.strip_suffix("MB") {
        (num_str, 1024 * 1024)
    } else if let Some(num_str) = size_str.strip_suffix("KB") {
        (num_str, 1024)
    } else if let Some(num_str) = size_str.strip_suffix('B') {
        (num_str, 1)
    } else {
        (size_str.as_str(), 1)
    };

    num_str
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|num| num.checked_mul(multiplier))
        .ok_or_else(|| format!("Invalid size format: {}", size_str))
}
