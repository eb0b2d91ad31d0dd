mod args;
mod commands;

pub use args::{ChatCommand, Cli, Commands, CommunityCommand, KidsCommand, RecordsCommand};
pub use commands::handle_command;
