//! Process configuration.
//!
//! Everything is overridable from the environment, nothing is required:
//! the defaults produce a working local instance on port 4000.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Default treasury wallet address, used when `TREASURY_ADDRESS` is unset.
pub const DEFAULT_TREASURY_ADDRESS: &str = "9hAr4dePYmPz6Kbr2vUq7FzdQxj3u1XLkTtWQaN5E8cs";

/// Runtime configuration, parsed from flags and environment variables.
#[derive(Debug, Parser)]
#[command(name = "souk", version, about = "Flat-file marketplace backend")]
pub struct Config {
    /// Port to listen on, on all interfaces.
    #[arg(long, env = "PORT", default_value_t = 4000)]
    pub port: u16,

    /// Treasury wallet address served at `GET /config/treasury`.
    #[arg(long, env = "TREASURY_ADDRESS", default_value = DEFAULT_TREASURY_ADDRESS)]
    pub treasury_address: String,

    /// Directory holding the collection files.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

impl Config {
    /// The socket address the server binds: all interfaces, configured port.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
