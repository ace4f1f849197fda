pub mod command;
pub mod config;
pub mod display;

pub use command::{execute, parse_line, tokenize, Output, Reply, Shell, ShellCommand, ShellError};
pub use config::{Cli, ConfigError, ShellConfig, UserSpec};
