pub mod archive;
pub mod layout;
pub mod links;
pub mod pipeline;

pub use links::find_best_match_jdk;
pub use pipeline::{install, make_package_index, uninstall, InstallOutcome, PackageIndex};
