//! Command handlers.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use lumen_stream::{
    EnvIdentity, GenerationSession, HttpTransport, IdentityProvider, LumenConfig, SessionState,
    StaticIdentity,
};

use super::args::{Cli, Commands, ConfigCommand, FormatCommand, GenerateCommand, OutputFormat};
use crate::render::StreamPrinter;

/// Dispatch the parsed command line.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone();
    match cli.command {
        Commands::Generate(cmd) => run_generate(cmd, config_path.as_deref()).await,
        Commands::Format(cmd) => run_format(cmd),
        Commands::Config(cmd) => show_config(cmd, config_path.as_deref()),
    }
}

/// `<config dir>/lumen/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lumen").join("config.toml"))
}

/// Load the configuration.
///
/// An explicitly given file must exist; the default location may be absent.
pub fn load_config(explicit: Option<&Path>) -> Result<LumenConfig> {
    if let Some(path) = explicit {
        return LumenConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }
    match default_config_path() {
        Some(path) => LumenConfig::load_or_default(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(LumenConfig::default()),
    }
}

async fn run_generate(cmd: GenerateCommand, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(endpoint) = &cmd.endpoint {
        config.transport.endpoint = endpoint.clone();
    }
    config.validate()?;

    let identity: Arc<dyn IdentityProvider> = match &cmd.identity {
        Some(token) => Arc::new(StaticIdentity::new(token.clone())),
        None => Arc::new(EnvIdentity::default()),
    };
    let transport = HttpTransport::new(config.transport.clone())?;
    tracing::debug!(endpoint = %transport.endpoint(), "Using generation endpoint");

    let mut session = GenerationSession::new(Arc::new(transport), identity, config);
    let mut updates = session.subscribe();

    if let Err(err) = session.start(&cmd.input()) {
        if err.requires_login() {
            bail!(
                "{}\nPass --identity or set LUMEN_IDENTITY to log in.",
                err.user_message()
            );
        }
        bail!("{}", err.user_message());
    }

    let mut printer = StreamPrinter::new(std::io::stdout());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                session.cancel();
                printer.finish()?;
                eprintln!("Cancelled.");
                return Ok(());
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("Generation session closed unexpectedly");
                }
                let snapshot = updates.borrow_and_update().clone();

                if cmd.no_animation && snapshot.pending_chars > 0 {
                    session.skip_animation();
                }
                if cmd.output == OutputFormat::Text {
                    printer.update(&snapshot.full_content)?;
                }

                match snapshot.state {
                    SessionState::Finished => {
                        match cmd.output {
                            OutputFormat::Text => printer.finish()?,
                            OutputFormat::Json => {
                                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                            }
                        }
                        return Ok(());
                    }
                    SessionState::Errored => {
                        printer.finish()?;
                        if cmd.output == OutputFormat::Json {
                            println!("{}", serde_json::to_string_pretty(&snapshot)?);
                        }
                        let Some(report) = snapshot.error else {
                            bail!("Generation failed");
                        };
                        if report.requires_login {
                            bail!(
                                "{}\nPass --identity or set LUMEN_IDENTITY to log in.",
                                report.error.user_message()
                            );
                        }
                        bail!("{}", report.error.user_message());
                    }
                    _ => {}
                }
            }
        }
    }
}

fn run_format(cmd: FormatCommand) -> Result<()> {
    let text = match &cmd.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let document = lumen_stream::format(&text);
    match cmd.output {
        OutputFormat::Text => print!("{}", document.to_plain_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&document)?),
    }
    Ok(())
}

fn show_config(cmd: ConfigCommand, config_path: Option<&Path>) -> Result<()> {
    if cmd.path {
        match config_path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => println!("{}", path.display()),
            None => bail!("No configuration directory on this platform"),
        }
        return Ok(());
    }

    let config = load_config(config_path)?;
    print!("{}", config.to_toml_string());
    Ok(())
}
