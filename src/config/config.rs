use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub display: DisplayConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the student data management service.
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show the filtered-count chip next to the search box
    pub show_totals: bool,

    /// Show recent log lines at the bottom of the dashboard
    pub show_log_panel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Rows per page in entity list views
    pub list_page_size: usize,

    /// Rows per page in report and user management views
    pub report_page_size: usize,

    /// Require a second keypress before delete/block take effect
    pub confirm_destructive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            display: DisplayConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_totals: true,
            show_log_panel: false,
        }
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            list_page_size: 5,
            report_page_size: 10,
            confirm_destructive: true,
        }
    }
}

impl Config {
    /// Load config from the default location, creating it on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            let default_config = Self::default();
            default_config.save()?;
            return Ok(default_config);
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("sdms-cli").join("config.toml"))
    }

    /// Annotated config text for `--generate-config`.
    pub fn create_default_with_comments() -> String {
        r#"# sdms-cli configuration file
# Location: ~/.config/sdms-cli/config.toml (Linux/macOS)
#           %APPDATA%\sdms-cli\config.toml (Windows)

[server]
# Base URL of the student data management service
base_url = "http://localhost:5000"

[display]
# Show the filtered-count chip next to the search box
show_totals = true

# Show recent log lines at the bottom of the dashboard
show_log_panel = false

[behavior]
# Rows per page in entity list views
list_page_size = 5

# Rows per page in report and user management views
report_page_size = 10

# Require a second keypress before delete/block take effect
confirm_destructive = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.behavior.list_page_size, 5);
        assert_eq!(config.behavior.report_page_size, 10);
        assert!(config.behavior.confirm_destructive);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.base_url, config.server.base_url);
        assert_eq!(parsed.behavior.list_page_size, config.behavior.list_page_size);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str("[server]\nbase_url = \"http://sdms.example:8080\"\n").unwrap();
        assert_eq!(parsed.server.base_url, "http://sdms.example:8080");
        assert_eq!(parsed.behavior.report_page_size, 10);
    }
}
