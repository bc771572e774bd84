use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default bind address for the status gateway. Go-style `:port` shorthand
/// is accepted and expanded to `0.0.0.0:port`.
pub const DEFAULT_ADDRESS: &str = ":8998";
/// Default cap on simultaneously executing job bodies.
pub const DEFAULT_POOL_SIZE: usize = 1000;

/// Top-level config (chime.toml + CHIME_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub log: LogSettings,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerSettings::default(),
            gateway: GatewaySettings::default(),
            log: LogSettings::default(),
        }
    }
}

/// Knobs for the scheduling engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Maximum number of job bodies executing at the same time.
    /// A value of 0 falls back to [`DEFAULT_POOL_SIZE`].
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// IANA timezone name used when computing due times
    /// (e.g. "Asia/Jakarta"). Unset means the host's local timezone.
    #[serde(default)]
    pub location: Option<String>,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            location: None,
        }
    }
}

impl SchedulerSettings {
    /// Effective pool capacity after applying the zero-means-default rule.
    pub fn effective_pool_size(&self) -> usize {
        if self.pool_size == 0 {
            DEFAULT_POOL_SIZE
        } else {
            self.pool_size
        }
    }
}

/// Status gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Bind address for the read-only status page.
    /// An empty string disables the gateway entirely.
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

impl GatewaySettings {
    /// Whether the status gateway should be served at all.
    pub fn enabled(&self) -> bool {
        !self.address.is_empty()
    }

    /// Expand Go-style `:port` shorthand into a bindable socket address.
    pub fn socket_addr(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default tracing filter directive when RUST_LOG is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_pool_size() -> usize {
    DEFAULT_POOL_SIZE
}
fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}
fn default_log_filter() -> String {
    "chime_gateway=info,chime_scheduler=info,tower_http=warn".to_string()
}

impl ChimeConfig {
    /// Load config from a TOML file with CHIME_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./chime.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("chime.toml");

        let config: ChimeConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("CHIME_").split("_"))
            .extract()
            .map_err(|e| crate::error::ChimeError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = ChimeConfig::default();
        assert_eq!(cfg.scheduler.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(cfg.gateway.address, DEFAULT_ADDRESS);
        assert!(cfg.scheduler.location.is_none());
    }

    #[test]
    fn zero_pool_size_falls_back_to_default() {
        let settings = SchedulerSettings {
            pool_size: 0,
            location: None,
        };
        assert_eq!(settings.effective_pool_size(), DEFAULT_POOL_SIZE);
    }

    #[test]
    fn empty_address_disables_gateway() {
        let gw = GatewaySettings {
            address: String::new(),
        };
        assert!(!gw.enabled());
    }

    #[test]
    fn go_style_address_is_expanded() {
        let gw = GatewaySettings::default();
        assert_eq!(gw.socket_addr(), "0.0.0.0:8998");

        let gw = GatewaySettings {
            address: "127.0.0.1:9000".to_string(),
        };
        assert_eq!(gw.socket_addr(), "127.0.0.1:9000");
    }
}
