//! permfs shell
//!
//! Drives one session over a fresh in-memory filesystem.
//!
//! ```bash
//! # Interactive, starting as usuario1
//! permfs-shell --user usuario1
//!
//! # Run a script and emit JSON lines
//! permfs-shell --script setup.txt --json
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, IsTerminal};

use anyhow::Context;
use clap::Parser;
use permfs_core::{Filesystem, Session};
use permfs_shell::display::{print_prompt, print_reply};
use permfs_shell::{Cli, Reply, Shell, ShellConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ShellConfig::resolve(&cli)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let fs = Filesystem::with_users(config.registry()?).into_shared();
    let session = Session::login(fs, &config.initial_user)
        .with_context(|| format!("cannot start session as {:?}", config.initial_user))?;
    info!("session started: user={}", config.initial_user);

    let mut shell = Shell::new(session);

    match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open script {}", path.display()))?;
            run(&mut shell, BufReader::new(file), false, config.json)?;
        }
        None => {
            let interactive = io::stdin().is_terminal() && !config.json;
            run(&mut shell, io::stdin().lock(), interactive, config.json)?;
        }
    }

    Ok(())
}

fn run(
    shell: &mut Shell,
    input: impl BufRead,
    interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    if interactive {
        print_prompt(&shell.prompt());
    }

    for line in input.lines() {
        let line = line.context("failed to read input")?;
        if let Some(reply) = shell.handle_line(&line) {
            if matches!(reply, Reply::Exit) {
                break;
            }
            print_reply(&reply, json);
        }
        if interactive {
            print_prompt(&shell.prompt());
        }
    }

    Ok(())
}
