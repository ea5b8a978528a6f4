use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Extensions of edited photos read for EXIF.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,

    /// Extensions counted as RAW frames.
    #[serde(default = "default_raw_extensions")]
    pub raw_extensions: Vec<String>,

    /// Sibling folder names searched for RAW frames, in order.
    #[serde(default = "default_raw_folder_names")]
    pub raw_folder_names: Vec<String>,

    /// Path components skipped when deriving a session name while crawling.
    #[serde(default = "default_skip_folder_names")]
    pub skip_folder_names: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    vec![
        "jpg".to_string(),
        "jpeg".to_string(),
        "tif".to_string(),
        "tiff".to_string(),
        "heic".to_string(),
        "png".to_string(),
    ]
}

fn default_raw_extensions() -> Vec<String> {
    vec![
        "arw".to_string(),
        "cr2".to_string(),
        "cr3".to_string(),
        "nef".to_string(),
        "raf".to_string(),
        "orf".to_string(),
        "rw2".to_string(),
        "dng".to_string(),
    ]
}

fn default_raw_folder_names() -> Vec<String> {
    vec!["RAW".to_string(), "Raw".to_string(), "raw".to_string()]
}

fn default_skip_folder_names() -> Vec<String> {
    vec![
        "photos".to_string(),
        "edited".to_string(),
        "raw".to_string(),
        "images".to_string(),
        "jpg".to_string(),
        "jpeg".to_string(),
    ]
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
            raw_extensions: default_raw_extensions(),
            raw_folder_names: default_raw_folder_names(),
            skip_folder_names: default_skip_folder_names(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_dir")]
    pub output_dir: PathBuf,
}

fn default_report_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photowrapped")
        .join("reports")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_report_dir(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photowrapped")
        .join("photowrapped.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            server: ServerConfig::default(),
            scanner: ScannerConfig::default(),
            reports: ReportConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`. A missing
    /// file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(&config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photowrapped")
            .join("config.toml")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("photowrapped/config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.bind_address(), "127.0.0.1:5000");

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "db_path = \"/tmp/wrapped.db\"\n\n[server]\nport = 8080\n\n[scanner]\nraw_folder_names = [\"RAW Files\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/wrapped.db"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.scanner.raw_folder_names, vec!["RAW Files".to_string()]);
        assert!(config.scanner.image_extensions.contains(&"jpg".to_string()));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
