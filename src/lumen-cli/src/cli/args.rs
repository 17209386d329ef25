//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, revealed as it arrives
    #[default]
    Text,
    /// The final snapshot or document as JSON
    Json,
}

/// Lumen - streamed generations with a typewriter reveal
#[derive(Parser, Debug)]
#[command(name = "lumen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, short = 'c', global = true, env = "LUMEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(
        long,
        global = true,
        value_enum,
        env = "LUMEN_LOG_LEVEL",
        default_value_t = LogLevel::Warn
    )]
    pub log_level: LogLevel,

    /// Enable verbose output (same as --log-level debug)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a generation for the given text
    #[command(visible_alias = "g")]
    Generate(GenerateCommand),

    /// Render text (a file or stdin) into sections
    Format(FormatCommand),

    /// Show the effective configuration
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Text to send; several words are joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Override the generation endpoint
    #[arg(long, env = "LUMEN_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Identity token (falls back to LUMEN_IDENTITY)
    #[arg(long)]
    pub identity: Option<String>,

    /// Print text as soon as it arrives instead of at typing speed
    #[arg(long)]
    pub no_animation: bool,

    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl GenerateCommand {
    pub fn input(&self) -> String {
        self.text.join(" ")
    }
}

#[derive(Args, Debug)]
pub struct FormatCommand {
    /// File to read; stdin when omitted
    pub file: Option<PathBuf>,

    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Only print where the configuration file is looked up
    #[arg(long)]
    pub path: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_joins_words() {
        let cli = Cli::try_parse_from([
            "lumen",
            "generate",
            "Write",
            "an",
            "email",
            "--no-animation",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(cmd) => {
                assert_eq!(cmd.input(), "Write an email");
                assert!(cmd.no_animation);
                assert_eq!(cmd.output, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_generate_requires_text() {
        assert!(Cli::try_parse_from(["lumen", "generate"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lumen",
            "format",
            "notes.txt",
            "--log-level",
            "debug",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Commands::Format(cmd) => {
                assert_eq!(cmd.file, Some(PathBuf::from("notes.txt")));
                assert_eq!(cmd.output, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_level_filter_strings() {
        assert_eq!(LogLevel::default().as_filter_str(), "warn");
        assert_eq!(LogLevel::Trace.as_filter_str(), "trace");
    }
}
