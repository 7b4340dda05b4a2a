use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::extractors::StrategyKind;

#[derive(Parser)]
#[command(
    name = "ytjamak",
    about = "ytjamak - Extract YouTube captions and tidy them into sentences",
    version,
    long_about = "Retrieves captions for a YouTube video by trying several extraction strategies in turn (embedded player data, the official captions API, the timed-text endpoint) and normalizes the caption fragments into punctuated sentences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to ./ytjamak.yaml or the user config dir)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Key for the official YouTube captions API
    #[arg(long, global = true, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Retrieve captions for a video and print them as sentences
    Captions {
        /// Video URL or bare video id
        #[arg(value_name = "URL_OR_ID")]
        video: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Preferred caption language (overrides config)
        #[arg(short, long, value_name = "LANG")]
        language: Option<String>,

        /// Strategies to try, in order (repeatable; overrides config)
        #[arg(short, long = "strategy", value_enum, value_name = "STRATEGY")]
        strategies: Vec<StrategyKind>,

        /// Print the newline-joined cue text without sentence clean-up
        #[arg(long)]
        raw: bool,
    },

    /// Normalize caption text into punctuated sentences
    Fix {
        /// Text to normalize; reads stdin when omitted or `-`
        #[arg(value_name = "TEXT")]
        text: Option<String>,
    },

    /// Serve the caption HTTP endpoints
    Serve {
        /// Address to bind (overrides config)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },

    /// List the caption strategies in the order they will be tried
    Strategies,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with cue timings
    Json,
    /// SRT subtitle format
    Srt,
    /// WebVTT format
    Vtt,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Srt => write!(f, "srt"),
            OutputFormat::Vtt => write!(f, "vtt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_captions_with_strategies() {
        let cli = Cli::try_parse_from([
            "ytjamak",
            "captions",
            "https://youtu.be/abc123",
            "--strategy",
            "timedtext",
            "--strategy",
            "player_response",
            "--format",
            "srt",
        ])
        .unwrap();

        match cli.command {
            Commands::Captions { video, strategies, format, raw, .. } => {
                assert_eq!(video, "https://youtu.be/abc123");
                assert_eq!(strategies, vec![StrategyKind::Timedtext, StrategyKind::PlayerResponse]);
                assert!(matches!(format, OutputFormat::Srt));
                assert!(!raw);
            }
            _ => panic!("expected captions command"),
        }
    }

    #[test]
    fn test_config_flags_conflict() {
        assert!(Cli::try_parse_from(["ytjamak", "config", "--show", "--init"]).is_err());
    }
}
