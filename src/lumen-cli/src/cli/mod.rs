//! Command-line interface.

mod args;
mod handlers;

pub use args::{
    Cli, Commands, ConfigCommand, FormatCommand, GenerateCommand, LogLevel, OutputFormat,
};
pub use handlers::{default_config_path, dispatch_command, load_config};
