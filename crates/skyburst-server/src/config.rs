use std::time::Duration;

use serde::Deserialize;

use skyburst_core::net::channel::Environment;

/// Top-level server configuration, loaded from `skyburst.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    /// Selects the broadcast channel (`fireworks-channel-<environment>`).
    pub environment: Environment,
    pub limits: LimitsConfig,
    pub epoch: EpochConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            web_root: "web".to_string(),
            environment: Environment::default(),
            limits: LimitsConfig::default(),
            epoch: EpochConfig::default(),
        }
    }
}

/// Infrastructure limits (rate limit, connection caps, buffer sizes).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Fireworks a single client may publish per window.
    pub rate_limit_max: usize,
    pub rate_limit_window_ms: u64,
    /// How often idle rate-limit entries are dropped.
    pub sweep_interval_secs: u64,
    pub max_ws_connections: usize,
    pub max_sse_subscribers: usize,
    /// Per-subscriber buffer of the broadcast channel.
    pub broadcast_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: 5,
            rate_limit_window_ms: 1000,
            sweep_interval_secs: 60,
            max_ws_connections: 500,
            max_sse_subscribers: 500,
            broadcast_capacity: 256,
        }
    }
}

impl LimitsConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Countdown epoch settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpochConfig {
    /// When set, the server broadcasts `happy-new-year` at this Unix time.
    pub target_unix_secs: Option<u64>,
    /// Bearer token required by `POST /api/happy-new-year`. None = open.
    pub trigger_token: Option<String>,
}

impl ServerConfig {
    /// Validate configuration, exiting on values the server cannot run with.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }

        if self.epoch.trigger_token.is_some() {
            tracing::warn!(
                "epoch.trigger_token is set in config file, use SKYBURST_EPOCH_TOKEN env var in production"
            );
        }

        if let Err(msg) = self.limits.check() {
            tracing::error!("{msg}");
            std::process::exit(1);
        }
    }

    /// Load config from `skyburst.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("skyburst.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from skyburst.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse skyburst.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No skyburst.toml found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply `SKYBURST_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = get("SKYBURST_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(root) = get("SKYBURST_WEB_ROOT") {
            self.web_root = root;
        }
        if let Some(env) = get("SKYBURST_ENV") {
            match env.parse::<Environment>() {
                Ok(parsed) => self.environment = parsed,
                Err(e) => tracing::warn!("Ignoring SKYBURST_ENV: {e}"),
            }
        }
        if let Some(token) = get("SKYBURST_EPOCH_TOKEN") {
            self.epoch.trigger_token = Some(token);
        }
        if let Some(target) = get("SKYBURST_EPOCH_TARGET")
            && let Ok(secs) = target.parse::<u64>()
        {
            self.epoch.target_unix_secs = Some(secs);
        }
        if let Some(val) = get("SKYBURST_RATE_LIMIT_MAX")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.rate_limit_max = n;
        }
        if let Some(val) = get("SKYBURST_RATE_LIMIT_WINDOW_MS")
            && let Ok(n) = val.parse::<u64>()
        {
            self.limits.rate_limit_window_ms = n;
        }
    }
}

impl LimitsConfig {
    fn check(&self) -> Result<(), &'static str> {
        if self.rate_limit_max == 0 {
            return Err("limits.rate_limit_max must be > 0");
        }
        if self.rate_limit_window_ms == 0 {
            return Err("limits.rate_limit_window_ms must be > 0");
        }
        if self.sweep_interval_secs == 0 {
            return Err("limits.sweep_interval_secs must be > 0");
        }
        if self.max_ws_connections == 0 {
            return Err("limits.max_ws_connections must be > 0");
        }
        if self.max_sse_subscribers == 0 {
            return Err("limits.max_sse_subscribers must be > 0");
        }
        if self.broadcast_capacity == 0 {
            return Err("limits.broadcast_capacity must be > 0");
        }
        Ok(())
    }
}
