use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub import: ImportSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Максимальный размер загружаемого файла сметы, МБ
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

/// Параметры импорта смет
#[derive(Debug, Deserialize, Clone)]
pub struct ImportSettings {
    /// Максимум позиций в одной пакетной вставке
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Единица измерения, если в строке она не указана
    #[serde(default = "default_unit")]
    pub default_unit: String,
    /// Лист книги, который читается в первую очередь
    #[serde(default = "default_preferred_sheet")]
    pub preferred_sheet: String,
    /// Префикс названия для позиций без наименования
    #[serde(default = "default_rescue_prefix")]
    pub rescue_prefix: String,
    /// Через сколько часов забывать завершённые сессии импорта
    #[serde(default = "default_session_max_age_hours")]
    pub session_max_age_hours: i64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            default_unit: default_unit(),
            preferred_sheet: default_preferred_sheet(),
            rescue_prefix: default_rescue_prefix(),
            session_max_age_hours: default_session_max_age_hours(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_mb() -> usize {
    20
}

fn default_batch_size() -> usize {
    100
}

fn default_unit() -> String {
    "шт".to_string()
}

fn default_preferred_sheet() -> String {
    "Смета".to_string()
}

fn default_rescue_prefix() -> String {
    "Item".to_string()
}

fn default_session_max_age_hours() -> i64 {
    24
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[server]
port = 3000
max_upload_mb = 20

[import]
batch_size = 100
default_unit = "шт"
preferred_sheet = "Смета"
rescue_prefix = "Item"
session_max_age_hours = 24
"#;

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
                return parse_config(&contents);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    parse_config(DEFAULT_CONFIG)
}

fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(contents)?;
    if config.import.batch_size == 0 {
        anyhow::bail!("import.batch_size must be greater than zero");
    }
    Ok(config)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    Ok(PathBuf::from(db_path_str))
}
