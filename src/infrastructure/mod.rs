pub mod config;
pub mod disco;
pub mod download;
pub mod paths;

pub use config::{Config, DiscoveryConfig};
pub use disco::DiscoClient;
