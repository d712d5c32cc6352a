use anyhow::{Context, Result};
use clap::Parser;

use chordwatch::cli::{resolve_shortcuts_path, CliArgs, CliCommand};
use chordwatch::config::Settings;
use chordwatch::replay::{load_session_file, Replay};
use chordwatch::shortcuts::load_shortcuts_file;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    chordwatch::tracing::init(args.log_filter());
    if let Some(path) = chordwatch::config_paths::log_file() {
        tracing::debug!("Writing logs to {}", path.display());
    }

    match args.command {
        CliCommand::Replay { session, shortcuts } => {
            let shortcuts = resolve_shortcuts_path(shortcuts).map_err(anyhow::Error::msg)?;
            let specs = load_shortcuts_file(&shortcuts)
                .with_context(|| format!("Failed to load shortcuts from {}", shortcuts.display()))?;
            let session = load_session_file(&session)
                .with_context(|| format!("Failed to load session from {}", session.display()))?;

            tracing::info!(
                shortcuts = specs.len(),
                steps = session.steps.len(),
                "replaying session"
            );

            let replay = Replay::new(Settings::load(), &session.elements, &specs)
                .context("Failed to build the session's element tree")?;
            for line in replay.run(&session.steps).context("Replay failed")? {
                println!("{}", line);
            }
        }
        CliCommand::Check { shortcuts } => {
            let shortcuts = resolve_shortcuts_path(shortcuts).map_err(anyhow::Error::msg)?;
            let specs = load_shortcuts_file(&shortcuts)
                .with_context(|| format!("Failed to load shortcuts from {}", shortcuts.display()))?;

            println!("{}: {} bindings", shortcuts.display(), specs.len());
            for spec in &specs {
                println!("  {}", spec);
            }
        }
    }

    Ok(())
}
