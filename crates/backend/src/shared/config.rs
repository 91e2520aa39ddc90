use once_cell::sync::Lazy;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub creation: CreationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    /// URL prefix under which uploaded and exported files are served
    pub public_prefix: String,
    /// How long uploads and exports are kept, in minutes
    #[serde(default = "default_retention_minutes")]
    pub retention_minutes: i64,
}

fn default_retention_minutes() -> i64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreationConfig {
    /// Pause between rows during batch item creation, in milliseconds
    #[serde(default)]
    pub item_delay_ms: u64,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[files]
public_prefix = "/api/u508/files"
retention_minutes = 60

[creation]
item_delay_ms = 300
"#;

static CONFIG: Lazy<Config> = Lazy::new(|| match load_config() {
    Ok(config) => config,
    Err(e) => {
        tracing::error!("Failed to load config.toml, using defaults: {}", e);
        default_config()
    }
});

/// Process-wide configuration, loaded on first access
pub fn get_config() -> &'static Config {
    &CONFIG
}

fn default_config() -> Config {
    toml::from_str(DEFAULT_CONFIG).unwrap_or(Config {
        server: ServerConfig {
            host: "0.0.0.0".into(),
            port: 3000,
        },
        files: FilesConfig {
            public_prefix: "/api/u508/files".into(),
            retention_minutes: default_retention_minutes(),
        },
        creation: CreationConfig { item_delay_ms: 300 },
    })
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.files.public_prefix, "/api/u508/files");
        assert_eq!(config.creation.item_delay_ms, 300);
        assert_eq!(config.files.retention_minutes, 60);
    }

    #[test]
    fn test_item_delay_is_optional() {
        let config: Config = toml::from_str(
            "[server]\nhost = \"127.0.0.1\"\nport = 8080\n[files]\npublic_prefix = \"/f\"\n[creation]\n",
        )
        .unwrap();
        assert_eq!(config.creation.item_delay_ms, 0);
        assert_eq!(config.files.retention_minutes, 60);
    }
}
