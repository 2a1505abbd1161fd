pub mod manager;
pub mod models;
pub mod runner;
pub mod scan;
pub mod sources;

pub use manager::{deduplicate_jdks, Manager};
pub use models::{Cache, Jdk};
pub use runner::{ExecRunner, Runner};
pub use scan::MANAGED_SOURCE;
pub use sources::DiscoverySource;
