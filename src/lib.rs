pub mod cli;
pub mod discovery;
pub mod error;
pub mod infrastructure;
pub mod installer;
pub mod semver;

pub use discovery::{Cache, Jdk, Manager};
pub use error::{AppError, AppResult};
pub use infrastructure::{Config, DiscoveryConfig};
pub use semver::{Range, Version, VersionPart};
