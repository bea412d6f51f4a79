//! Server configuration
//!
//! Defines the configurable parameters for the deployment server: bind
//! address, build engine endpoint, and the bounds of the startup readiness
//! poll.

use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Build engine base URL (e.g. "http://localhost:2375")
    pub engine_url: String,

    /// Overall deadline for the build engine readiness poll at startup
    pub engine_ready_timeout: Duration,

    /// Interval between readiness attempts
    pub engine_ready_interval: Duration,
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SERVER_BIND_ADDR (optional, default: "0.0.0.0:8080")
    /// - BUILD_ENGINE_URL (optional, default: "http://localhost:2375")
    /// - ENGINE_READY_TIMEOUT (optional, seconds, default: 30)
    /// - ENGINE_READY_INTERVAL (optional, seconds, default: 2)
    pub fn from_env() -> Self {
        let bind_addr =
            std::env::var("SERVER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let engine_url =
            std::env::var("BUILD_ENGINE_URL").unwrap_or_else(|_| "http://localhost:2375".to_string());

        let engine_ready_timeout = std::env::var("ENGINE_READY_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(anvil_engine::DEFAULT_READY_TIMEOUT);

        let engine_ready_interval = std::env::var("ENGINE_READY_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(anvil_engine::DEFAULT_READY_INTERVAL);

        Self {
            bind_addr,
            engine_url,
            engine_ready_timeout,
            engine_ready_interval,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.engine_url.starts_with("http://") && !self.engine_url.starts_with("https://") {
            anyhow::bail!("engine_url must start with http:// or https://");
        }

        if self.engine_ready_interval.is_zero() {
            anyhow::bail!("engine_ready_interval must be greater than 0");
        }

        if self.engine_ready_timeout < self.engine_ready_interval {
            anyhow::bail!("engine_ready_timeout must be at least engine_ready_interval");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            engine_url: "http://localhost:2375".to_string(),
            engine_ready_timeout: anvil_engine::DEFAULT_READY_TIMEOUT,
            engine_ready_interval: anvil_engine::DEFAULT_READY_INTERVAL,
        }
    }
}
