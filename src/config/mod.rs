//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::CacheBackend;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "plantlog";
const ENV_PREFIX: &str = "PLANTLOG";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_CAPACITY: u64 = 1024;
const DEFAULT_SCRATCH_DIR: &str = "uploads/tmp";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_OBJECT_STORAGE_URL: &str = "https://api.cloudinary.com/";
const DEFAULT_DIAGNOSIS_URL: &str = "https://generativelanguage.googleapis.com/";
const DEFAULT_DIAGNOSIS_MODEL: &str = "gemini-1.5-flash";

/// Command-line arguments for the plantlog binary.
#[derive(Debug, Parser)]
#[command(name = "plantlog", version, about = "Plant and health log service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PLANTLOG_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the cache backend (memory|redis).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Override the Redis connection URL.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,

    /// Override the directory multipart files are spooled to.
    #[arg(long = "uploads-scratch-dir", value_name = "PATH")]
    pub uploads_scratch_dir: Option<PathBuf>,

    /// Override the maximum request size for uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub uploads: UploadSettings,
    pub object_storage: ObjectStorageSettings,
    pub diagnosis: DiagnosisSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackend,
    pub capacity: usize,
    pub redis_url: Option<String>,
    pub key_prefix: String,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub scratch_dir: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

impl UploadSettings {
    /// Request body limit as `usize`; range is checked at load time.
    pub fn limit_bytes(&self) -> usize {
        usize::try_from(self.max_request_bytes.get()).unwrap_or(usize::MAX)
    }
}

/// Credentials for the image host. Empty credentials are accepted at load
/// time so `migrate` works without them; `serve` checks [`Self::is_configured`].
#[derive(Debug, Clone)]
pub struct ObjectStorageSettings {
    pub base_url: Url,
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
}

impl ObjectStorageSettings {
    pub fn is_configured(&self) -> bool {
        !(self.cloud_name.is_empty() || self.api_key.is_empty() || self.api_secret.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct DiagnosisSettings {
    pub base_url: Url,
    pub api_key: String,
    pub model: String,
}

impl DiagnosisSettings {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    uploads: RawUploadSettings,
    object_storage: RawObjectStorageSettings,
    diagnosis: RawDiagnosisSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
        if let Some(dir) = overrides.uploads_scratch_dir.as_ref() {
            self.uploads.scratch_dir = Some(dir.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            uploads,
            object_storage,
            diagnosis,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            uploads: build_upload_settings(uploads)?,
            object_storage: build_object_storage_settings(object_storage)?,
            diagnosis: build_diagnosis_settings(diagnosis)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }
    let addr =
        parse_socket_addr(&host, port).map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_empty(database.url);
    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend.as_deref().map(str::trim) {
        None | Some("") | Some("memory") => CacheBackend::Memory,
        Some("redis") => CacheBackend::Redis,
        Some(other) => {
            return Err(LoadError::invalid(
                "cache.backend",
                format!("unknown backend `{other}` (expected memory or redis)"),
            ));
        }
    };

    let capacity_value = cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY);
    if capacity_value == 0 {
        return Err(LoadError::invalid(
            "cache.capacity",
            "must be greater than zero",
        ));
    }
    let capacity = usize::try_from(capacity_value).map_err(|_| {
        LoadError::invalid("cache.capacity", "value exceeds supported range for usize")
    })?;

    let redis_url = non_empty(cache.redis_url);
    if backend == CacheBackend::Redis && redis_url.is_none() {
        return Err(LoadError::invalid(
            "cache.redis_url",
            "required when cache.backend is redis",
        ));
    }

    Ok(CacheSettings {
        backend,
        capacity,
        redis_url,
        key_prefix: cache.key_prefix.unwrap_or_default(),
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let scratch_dir = uploads
        .scratch_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRATCH_DIR));
    if scratch_dir.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "uploads.scratch_dir",
            "path must not be empty",
        ));
    }

    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings {
        scratch_dir,
        max_request_bytes,
    })
}

fn build_object_storage_settings(
    storage: RawObjectStorageSettings,
) -> Result<ObjectStorageSettings, LoadError> {
    let base_url = parse_base_url(
        storage.base_url.as_deref(),
        DEFAULT_OBJECT_STORAGE_URL,
        "object_storage.base_url",
    )?;

    Ok(ObjectStorageSettings {
        base_url,
        cloud_name: non_empty(storage.cloud_name).unwrap_or_default(),
        api_key: non_empty(storage.api_key).unwrap_or_default(),
        api_secret: non_empty(storage.api_secret).unwrap_or_default(),
        folder: non_empty(storage.folder),
    })
}

fn build_diagnosis_settings(
    diagnosis: RawDiagnosisSettings,
) -> Result<DiagnosisSettings, LoadError> {
    let base_url = parse_base_url(
        diagnosis.base_url.as_deref(),
        DEFAULT_DIAGNOSIS_URL,
        "diagnosis.base_url",
    )?;
    let model = non_empty(diagnosis.model).unwrap_or_else(|| DEFAULT_DIAGNOSIS_MODEL.to_string());
    if model.contains('/') {
        return Err(LoadError::invalid(
            "diagnosis.model",
            "model name must not contain `/`",
        ));
    }

    Ok(DiagnosisSettings {
        base_url,
        api_key: non_empty(diagnosis.api_key).unwrap_or_default(),
        model,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    capacity: Option<u64>,
    redis_url: Option<String>,
    key_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    scratch_dir: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawObjectStorageSettings {
    base_url: Option<String>,
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    folder: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDiagnosisSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Parse a base URL, forcing a trailing slash so relative joins keep the path.
fn parse_base_url(
    raw: Option<&str>,
    default: &str,
    key: &'static str,
) -> Result<Url, LoadError> {
    let value = raw.map(str::trim).filter(|value| !value.is_empty());
    let mut text = value.unwrap_or(default).to_string();
    if !text.ends_with('/') {
        text.push('/');
    }
    Url::parse(&text).map_err(|err| LoadError::invalid(key, format!("invalid url: {err}")))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
        assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
        assert_eq!(settings.logging.level, LevelFilter::INFO);
        assert!(matches!(settings.logging.format, LogFormat::Compact));
        assert_eq!(settings.database.max_connections.get(), 8);
        assert_eq!(settings.cache.backend, CacheBackend::Memory);
        assert_eq!(settings.cache.capacity, 1024);
        assert_eq!(settings.uploads.scratch_dir, PathBuf::from("uploads/tmp"));
        assert_eq!(settings.uploads.limit_bytes(), 10 * 1024 * 1024);
        assert_eq!(settings.diagnosis.model, "gemini-1.5-flash");
        assert_eq!(
            settings.object_storage.base_url.as_str(),
            "https://api.cloudinary.com/"
        );
        assert!(!settings.object_storage.is_configured());
        assert!(!settings.diagnosis.is_configured());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn redis_backend_requires_url() {
        let mut raw = RawSettings::default();
        raw.cache.backend = Some("redis".to_string());
        let err = Settings::from_raw(raw.clone()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.redis_url",
                ..
            }
        ));

        raw.cache.redis_url = Some("redis://127.0.0.1:6379".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(settings.cache.backend, CacheBackend::Redis);
    }

    #[test]
    fn unknown_cache_backend_is_rejected() {
        let mut raw = RawSettings::default();
        raw.cache.backend = Some("memcached".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn base_urls_gain_trailing_slash() {
        let mut raw = RawSettings::default();
        raw.diagnosis.base_url = Some("http://127.0.0.1:9000/proxy".to_string());
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.diagnosis.base_url.as_str(),
            "http://127.0.0.1:9000/proxy/"
        );
    }

    #[test]
    fn zero_limits_are_rejected() {
        let mut raw = RawSettings::default();
        raw.uploads.max_request_bytes = Some(0);
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.database.max_connections = Some(0);
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["plantlog"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_migrate_arguments() {
        let args = CliArgs::parse_from([
            "plantlog",
            "migrate",
            "--database-url",
            "postgres://example",
        ]);

        match args.command.expect("migrate command") {
            Command::Migrate(migrate) => {
                assert_eq!(
                    migrate.database.database_url.as_deref(),
                    Some("postgres://example")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "plantlog",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--cache-backend",
            "redis",
            "--cache-redis-url",
            "redis://cache:6379",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(serve.overrides.cache_backend.as_deref(), Some("redis"));
                assert_eq!(
                    serve.overrides.cache_redis_url.as_deref(),
                    Some("redis://cache:6379")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    #[serial]
    fn environment_overrides_files() {
        // SAFETY: guarded by #[serial]; no other test touches these variables concurrently.
        unsafe {
            std::env::set_var("PLANTLOG__SERVER__PORT", "4100");
            std::env::set_var("PLANTLOG__DIAGNOSIS__MODEL", "gemini-2.0-flash");
        }

        let args = CliArgs::parse_from(["plantlog"]);
        let result = load(&args);

        unsafe {
            std::env::remove_var("PLANTLOG__SERVER__PORT");
            std::env::remove_var("PLANTLOG__DIAGNOSIS__MODEL");
        }

        let settings = result.expect("settings");
        assert_eq!(settings.server.addr.port(), 4100);
        assert_eq!(settings.diagnosis.model, "gemini-2.0-flash");
    }

    #[test]
    #[serial]
    fn cli_beats_environment() {
        unsafe {
            std::env::set_var("PLANTLOG__SERVER__PORT", "4100");
        }

        let args = CliArgs::parse_from(["plantlog", "serve", "--server-port", "4200"]);
        let result = load(&args);

        unsafe {
            std::env::remove_var("PLANTLOG__SERVER__PORT");
        }

        assert_eq!(result.expect("settings").server.addr.port(), 4200);
    }
}
