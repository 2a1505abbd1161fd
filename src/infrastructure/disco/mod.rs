pub mod client;
pub mod models;

pub use client::{host_platform, DiscoClient, API_URL_ENV, DEFAULT_API_URL};
pub use models::{Distribution, Package, PackageInfo};
