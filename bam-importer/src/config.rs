//! Configuration aggregate (§4.0): defaults, then an optional YAML file,
//! then environment variables, then CLI flags, each layer overriding the
//! last. Grouped the way `original_source/src/importer/config.py` groups
//! it: one connection block, one policy block, one throttle block, one
//! cache block, and an observability-only "circuit breaker" block that
//! feeds the adaptive throttle rather than gating admission itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use bam_client::config::ClientConfig;
use bam_executor::{ConflictResolution, FailurePolicy};
use bam_planner::UpdateMode;
use bam_resolver::ResolverConfig;
use bam_throttle::ThrottleConfig;
use bam_util::redacted::RedactedString;
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanAction {
    Report,
    Delete,
    Ignore,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BAM_URL is set but BAM_USERNAME and/or BAM_PASSWORD is missing")]
    IncompleteCredentials,

    #[error("failed to read config file {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml_ng::Error },

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

/// The on-disk YAML shape. Every field optional: a layer only overrides
/// what it actually sets, so defaults from earlier layers survive.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    api_version: Option<String>,
    verify_ssl: Option<bool>,
    max_connections: Option<usize>,
    max_keepalive: Option<usize>,
    allow_dangerous_operations: Option<bool>,
    failure_policy: Option<String>,
    update_mode: Option<String>,
    conflict_resolution: Option<String>,
    safe_mode: Option<bool>,
    max_concurrent_operations: Option<usize>,
    enable_orphan_detection: Option<bool>,
    orphan_action: Option<String>,
    bypass_cache: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub allow_dangerous_operations: bool,
    pub failure_policy: FailurePolicy,
    pub update_mode: UpdateMode,
    pub conflict_resolution: ConflictResolution,
    /// When set, `apply` refuses to run without `--yes` if the plan
    /// contains any delete of a protected kind, even with
    /// `allow_dangerous_operations` set.
    pub safe_mode: bool,
    pub max_concurrent_operations: usize,
    pub enable_orphan_detection: bool,
    pub orphan_action: OrphanAction,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_dangerous_operations: false,
            failure_policy: FailurePolicy::Continue,
            update_mode: UpdateMode::Upsert,
            conflict_resolution: ConflictResolution::Fail,
            safe_mode: true,
            max_concurrent_operations: 50,
            enable_orphan_detection: false,
            orphan_action: OrphanAction::Report,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BamConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: RedactedString,
    pub api_version: String,
    pub verify_ssl: bool,
    pub max_connections: usize,
    pub max_keepalive: usize,
}

impl Default for BamConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: RedactedString::new(String::new()),
            api_version: "v2".to_string(),
            verify_ssl: true,
            max_connections: 50,
            max_keepalive: 20,
        }
    }
}

/// An observability knob, not a literal circuit-breaker state machine:
/// §4.7 already names the adaptive throttle as the sole admission-control
/// point, so these thresholds only feed its decrease-on-failure path.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub error_rate_threshold: f64,
    pub consecutive_failures_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: 0.5,
            consecutive_failures_threshold: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub cache_dir: PathBuf,
    pub positive_ttl: Duration,
    pub negative_ttl: Duration,
    pub view_context_ttl: Duration,
    pub bypass_cache: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let resolver_defaults = ResolverConfig::default();
        Self {
            cache_dir: resolver_defaults.cache_dir,
            positive_ttl: resolver_defaults.positive_ttl,
            negative_ttl: resolver_defaults.negative_ttl,
            view_context_ttl: resolver_defaults.view_context_ttl,
            bypass_cache: resolver_defaults.bypass_cache,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BamConfig {
    pub connection: BamConnectionConfig,
    pub policy: PolicyConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    pub throttle: ThrottleConfig,
    pub log_level: String,
    pub log_format: LogFormat,
    pub checkpoint_dir: PathBuf,
    pub changelog_dir: PathBuf,
    pub request_timeout: Duration,
}

impl Default for BamConfig {
    fn default() -> Self {
        Self {
            connection: BamConnectionConfig::default(),
            policy: PolicyConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            throttle: ThrottleConfig::default(),
            log_level: String::new(),
            log_format: LogFormat::default(),
            checkpoint_dir: PathBuf::from(".checkpoints"),
            changelog_dir: PathBuf::from(".changelogs"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Pretty
    }
}

/// Loads the full precedence chain: defaults, optional YAML file,
/// environment variables, then CLI flags.
pub fn load(cli: &Cli) -> Result<BamConfig, ConfigError> {
    let mut config = BamConfig::default();

    if let Some(path) = &cli.config {
        apply_file(&mut config, path)?;
    }
    apply_env(&mut config)?;
    apply_cli(&mut config, cli)?;

    if !config.connection.url.is_empty() && (config.connection.username.is_empty() || config.connection.password.expose().is_empty()) {
        return Err(ConfigError::IncompleteCredentials);
    }

    Ok(config)
}

fn apply_file(config: &mut BamConfig, path: &Path) -> Result<(), ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
    let file: FileConfig = serde_yaml_ng::from_str(&text).map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })?;

    if let Some(url) = file.url {
        config.connection.url = url;
    }
    if let Some(username) = file.username {
        config.connection.username = username;
    }
    if let Some(password) = file.password {
        config.connection.password = RedactedString::new(password);
    }
    if let Some(api_version) = file.api_version {
        config.connection.api_version = api_version;
    }
    if let Some(verify_ssl) = file.verify_ssl {
        config.connection.verify_ssl = verify_ssl;
    }
    if let Some(max_connections) = file.max_connections {
        config.connection.max_connections = max_connections;
    }
    if let Some(max_keepalive) = file.max_keepalive {
        config.connection.max_keepalive = max_keepalive;
    }
    if let Some(allow) = file.allow_dangerous_operations {
        config.policy.allow_dangerous_operations = allow;
    }
    if let Some(raw) = file.failure_policy {
        config.policy.failure_policy = parse_failure_policy(&raw)?;
    }
    if let Some(raw) = file.update_mode {
        config.policy.update_mode = parse_update_mode(&raw)?;
    }
    if let Some(raw) = file.conflict_resolution {
        config.policy.conflict_resolution = parse_conflict_resolution(&raw)?;
    }
    if let Some(safe_mode) = file.safe_mode {
        config.policy.safe_mode = safe_mode;
    }
    if let Some(max) = file.max_concurrent_operations {
        config.policy.max_concurrent_operations = max;
    }
    if let Some(enabled) = file.enable_orphan_detection {
        config.policy.enable_orphan_detection = enabled;
    }
    if let Some(raw) = file.orphan_action {
        config.policy.orphan_action = parse_orphan_action(&raw)?;
    }
    if let Some(bypass) = file.bypass_cache {
        config.cache.bypass_cache = bypass;
    }
    Ok(())
}

fn apply_env(config: &mut BamConfig) -> Result<(), ConfigError> {
    if let Ok(url) = std::env::var("BAM_URL") {
        config.connection.url = url;
    }
    if let Ok(username) = std::env::var("BAM_USERNAME") {
        config.connection.username = username;
    }
    if let Ok(password) = std::env::var("BAM_PASSWORD") {
        config.connection.password = RedactedString::new(password);
    }
    if let Ok(api_version) = std::env::var("BAM_API_VERSION") {
        config.connection.api_version = api_version;
    }
    if let Ok(raw) = std::env::var("BAM_VERIFY_SSL") {
        config.connection.verify_ssl = parse_bool(&raw, "BAM_VERIFY_SSL")?;
    }
    if let Ok(raw) = std::env::var("BAM_MAX_CONNECTIONS") {
        config.connection.max_connections = parse_usize(&raw, "BAM_MAX_CONNECTIONS")?;
    }
    if let Ok(raw) = std::env::var("BAM_MAX_KEEPALIVE") {
        config.connection.max_keepalive = parse_usize(&raw, "BAM_MAX_KEEPALIVE")?;
    }
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.log_level = level;
    }
    if let Ok(raw) = std::env::var("LOG_FORMAT") {
        config.log_format = match raw.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };
    }
    Ok(())
}

fn apply_cli(config: &mut BamConfig, cli: &Cli) -> Result<(), ConfigError> {
    if let Some(url) = &cli.url {
        config.connection.url = url.clone();
    }
    if let Some(username) = &cli.username {
        config.connection.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.connection.password = RedactedString::new(password.clone());
    }
    if cli.allow_dangerous_operations {
        config.policy.allow_dangerous_operations = true;
    }
    if cli.no_cache {
        config.cache.bypass_cache = true;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if config.log_level.is_empty() {
        config.log_level = "info".to_string();
    }
    Ok(())
}

fn parse_bool(raw: &str, field: &'static str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue { field, value: raw.to_string() }),
    }
}

fn parse_usize(raw: &str, field: &'static str) -> Result<usize, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue { field, value: raw.to_string() })
}

fn parse_failure_policy(raw: &str) -> Result<FailurePolicy, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "fail_fast" | "fail-fast" => Ok(FailurePolicy::FailFast),
        "fail_group" | "fail-group" => Ok(FailurePolicy::FailGroup),
        "continue" => Ok(FailurePolicy::Continue),
        _ => Err(ConfigError::InvalidValue { field: "failure_policy", value: raw.to_string() }),
    }
}

fn parse_update_mode(raw: &str) -> Result<UpdateMode, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "create_only" | "create-only" => Ok(UpdateMode::CreateOnly),
        "upsert" => Ok(UpdateMode::Upsert),
        "update_only" | "update-only" => Ok(UpdateMode::UpdateOnly),
        _ => Err(ConfigError::InvalidValue { field: "update_mode", value: raw.to_string() }),
    }
}

fn parse_conflict_resolution(raw: &str) -> Result<ConflictResolution, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "fail" => Ok(ConflictResolution::Fail),
        "overwrite" => Ok(ConflictResolution::Overwrite),
        "merge" => Ok(ConflictResolution::Merge),
        "manual" => Ok(ConflictResolution::Manual),
        _ => Err(ConfigError::InvalidValue { field: "conflict_resolution", value: raw.to_string() }),
    }
}

fn parse_orphan_action(raw: &str) -> Result<OrphanAction, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "report" => Ok(OrphanAction::Report),
        "delete" => Ok(OrphanAction::Delete),
        "ignore" => Ok(OrphanAction::Ignore),
        _ => Err(ConfigError::InvalidValue { field: "orphan_action", value: raw.to_string() }),
    }
}

impl BamConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.connection.url.clone(),
            username: self.connection.username.clone(),
            password: self.connection.password.clone(),
            api_version: self.connection.api_version.clone(),
            verify_ssl: self.connection.verify_ssl,
            max_connections: self.connection.max_connections,
            max_keepalive: self.connection.max_keepalive,
            request_timeout: self.request_timeout,
            allow_dangerous_operations: self.policy.allow_dangerous_operations,
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            cache_dir: self.cache.cache_dir.clone(),
            positive_ttl: self.cache.positive_ttl,
            negative_ttl: self.cache.negative_ttl,
            view_context_ttl: self.cache.view_context_ttl,
            bypass_cache: self.cache.bypass_cache,
        }
    }
}
