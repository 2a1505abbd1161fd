pub mod commands;
pub mod handlers;

pub use commands::{Cli, Commands, DiscoverCommands};
pub use handlers::CommandHandler;
