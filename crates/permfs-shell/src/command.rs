//! Command language of the shell.
//!
//! A line is split into words (double quotes group words, backslash
//! escapes `"` and `\` inside quotes), then parsed with clap.

use clap::{Parser, Subcommand};
use permfs_core::{FsError, Listing, PermissionTriple, Session};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Unterminated quote in: {0}")]
    UnterminatedQuote(String),

    /// Rendered clap usage or help text
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Fs(#[from] FsError),
}

#[derive(Parser, Debug)]
#[command(name = "permfs", no_binary_name = true, disable_version_flag = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Switch user (no authentication)
    Su { user: String },
    /// Print the current user
    Whoami,
    /// Print the working directory
    Pwd,
    /// List a directory
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Create a directory
    Mkdir {
        path: String,
        #[arg(default_value = "755")]
        permissions: String,
    },
    /// Change the working directory
    Cd { path: String },
    /// Create a file
    #[command(alias = "touch")]
    Create {
        path: String,
        #[arg(default_value = "")]
        content: String,
        #[arg(default_value = "644")]
        permissions: String,
    },
    /// Print a file
    #[command(alias = "read")]
    Cat { path: String },
    /// Replace a file's content
    Write { path: String, content: String },
    /// Remove a file or an empty directory
    Rm { path: String },
    /// Change permissions (owner or root)
    Chmod { permissions: String, path: String },
    /// Change owner (root only)
    Chown { owner: String, path: String },
    /// List registered users
    Users,
    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Done,
    Text(String),
    Listing(Listing),
    Users(Vec<String>),
}

#[derive(Debug)]
pub enum Reply {
    Output(Output),
    Error(ShellError),
    Exit,
}

/// Split a line into words.
pub fn tokenize(line: &str) -> Result<Vec<String>, ShellError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped @ ('"' | '\\')) => current.push(escaped),
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(ShellError::UnterminatedQuote(line.to_string())),
                        },
                        Some(other) => current.push(other),
                        None => return Err(ShellError::UnterminatedQuote(line.to_string())),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, ShellError> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let words = tokenize(trimmed)?;
    CommandLine::try_parse_from(words)
        .map(|cl| Some(cl.command))
        .map_err(|e| ShellError::Usage(e.render().to_string()))
}

/// A malformed triple is [`FsError::InvalidPermissions`].
fn permissions_arg(text: &str) -> Result<PermissionTriple, FsError> {
    text.parse()
}

/// Run a parsed command against the session.
pub fn execute(session: &mut Session, command: ShellCommand) -> Result<Output, FsError> {
    let output = match command {
        ShellCommand::Su { user } => {
            session.su(&user)?;
            Output::Done
        }
        ShellCommand::Whoami => Output::Text(session.whoami()),
        ShellCommand::Pwd => Output::Text(session.pwd()?),
        ShellCommand::Ls { path } => Output::Listing(session.ls(&path)?),
        ShellCommand::Mkdir { path, permissions } => {
            session.mkdir(&path, permissions_arg(&permissions)?)?;
            Output::Done
        }
        ShellCommand::Cd { path } => {
            session.cd(&path)?;
            Output::Done
        }
        ShellCommand::Create {
            path,
            content,
            permissions,
        } => {
            let permissions = permissions_arg(&permissions)?;
            session.create_file(&path, content.as_bytes(), permissions)?;
            Output::Done
        }
        ShellCommand::Cat { path } => {
            let content = session.read(&path)?;
            Output::Text(String::from_utf8_lossy(&content).into_owned())
        }
        ShellCommand::Write { path, content } => {
            session.write(&path, content.as_bytes())?;
            Output::Done
        }
        ShellCommand::Rm { path } => {
            session.rm(&path)?;
            Output::Done
        }
        ShellCommand::Chmod { permissions, path } => {
            session.chmod(&path, permissions_arg(&permissions)?)?;
            Output::Done
        }
        ShellCommand::Chown { owner, path } => {
            session.chown(&path, &owner)?;
            Output::Done
        }
        ShellCommand::Users => Output::Users(session.list_users()),
        ShellCommand::Exit => Output::Done,
    };
    Ok(output)
}

/// A session plus the line-handling loop state.
pub struct Shell {
    session: Session,
}

impl Shell {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `user:cwd$ `
    pub fn prompt(&self) -> String {
        let cwd = self.session.pwd().unwrap_or_else(|_| "?".to_string());
        format!("{}:{}$ ", self.session.whoami(), cwd)
    }

    pub fn handle_line(&mut self, line: &str) -> Option<Reply> {
        let command = match parse_line(line) {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(e) => return Some(Reply::Error(e)),
        };

        if command == ShellCommand::Exit {
            return Some(Reply::Exit);
        }

        Some(match execute(&mut self.session, command) {
            Ok(output) => Reply::Output(output),
            Err(e) => Reply::Error(e.into()),
        })
    }
}
