//! Daemon configuration, read once at startup.
//!
//! Loaded with `clap`'s derive + env support, the same way the examined
//! corpus's CLI tools layer configuration: every field has an environment
//! variable fallback, and the CLI flag wins when both are present.

use clap::Parser;

/// VPC topology daemon configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "vpcd", about = "Translates AWS-shaped VPC lifecycle events into OVN Northbound DB state")]
pub struct Config {
    /// OVSDB endpoint for the OVN Northbound database, e.g. `tcp:127.0.0.1:6641`.
    #[arg(long, env = "VPCD_NB_DB", default_value = "tcp:127.0.0.1:6641")]
    pub nb_db: String,

    /// NATS server URL.
    #[arg(long, env = "VPCD_NATS_URL", default_value = "nats://127.0.0.1:4222")]
    pub nats_url: String,

    /// Auth token presented when connecting to the bus, if any.
    #[arg(long, env = "VPCD_BUS_TOKEN")]
    pub bus_token: Option<String>,

    /// Base directory for the PID file, written as `<pid_dir>/vpcd.pid`.
    #[arg(long, env = "VPCD_PID_DIR", default_value = "/var/run")]
    pub pid_dir: String,

    /// Enable debug-level logging.
    #[arg(long, env = "VPCD_DEBUG", default_value_t = false)]
    pub debug: bool,
}

impl Config {
    /// Parse from CLI args with env var fallback (CLI > env > default).
    pub fn load() -> Self {
        Self::parse()
    }

    /// Path to the PID file this process writes on startup.
    pub fn pid_file_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.pid_dir).join("vpcd.pid")
    }

    /// `addr:port` the OVSDB TCP client should dial, stripped of the
    /// `tcp:` scheme prefix OVN configuration strings carry.
    pub fn nb_db_addr(&self) -> &str {
        self.nb_db.strip_prefix("tcp:").unwrap_or(&self.nb_db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nb_db_addr_strips_tcp_scheme() {
        let config = Config {
            nb_db: "tcp:127.0.0.1:6641".to_string(),
            nats_url: "nats://127.0.0.1:4222".to_string(),
            bus_token: None,
            pid_dir: "/var/run".to_string(),
            debug: false,
        };
        assert_eq!(config.nb_db_addr(), "127.0.0.1:6641");
    }

    #[test]
    fn pid_file_path_joins_pid_dir() {
        let config = Config {
            nb_db: "tcp:127.0.0.1:6641".to_string(),
            nats_url: "nats://127.0.0.1:4222".to_string(),
            bus_token: None,
            pid_dir: "/tmp/hive".to_string(),
            debug: false,
        };
        assert_eq!(config.pid_file_path(), std::path::Path::new("/tmp/hive/vpcd.pid"));
    }
}
