use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytjamak::cli::{Cli, Commands};
use ytjamak::config::Config;
use ytjamak::extractors::VideoId;
use ytjamak::{normalize, output, server, utils, CaptionPipeline};

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "ytjamak=debug,tower_http=debug" } else { "ytjamak=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        progress.set_style(template);
    }
    progress.set_message(message);
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = Config::load(cli.config.as_deref()).await?;
    let file_api_key = config.youtube.api_key.clone();
    if let Some(key) = cli.api_key.clone() {
        config.youtube.api_key = Some(key);
    }

    match cli.command {
        Commands::Captions {
            video,
            output,
            format,
            language,
            strategies,
            raw,
        } => {
            if let Some(language) = language {
                config.youtube.preferred_language = language;
            }
            if !strategies.is_empty() {
                config.youtube.strategies = strategies;
            }
            config.validate()?;

            let video_id = VideoId::parse(&video)?;
            let pipeline = CaptionPipeline::from_config(&config)?;

            tracing::info!("Retrieving captions for video: {}", video_id);
            let progress = spinner(cli.quiet, format!("Retrieving captions for {}...", video_id));
            let result = pipeline.retrieve_captions(&video_id).await;
            progress.finish_and_clear();

            let captions = result?;
            if !cli.quiet {
                eprintln!(
                    "{} {} cues via {} ({})",
                    style("✔").green(),
                    captions.document.len(),
                    style(captions.strategy).cyan(),
                    captions.language
                );
            }

            match output {
                Some(path) => {
                    output::save_to_file(&captions, &path, &format, raw).await?;
                    println!("Captions saved to: {}", path.display());
                }
                None => {
                    output::print_to_console(&captions, &format, raw)?;
                }
            }
        }
        Commands::Fix { text } => {
            let raw = utils::read_text_argument(text)?;
            println!("{}", normalize(&raw));
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let pipeline = CaptionPipeline::from_config(&config)?;
            server::serve(&config, pipeline).await?;
        }
        Commands::Config { show, init } => {
            if init {
                // Keys from the flag or environment stay out of the file
                let mut persisted = config.clone();
                persisted.youtube.api_key = file_api_key;
                let path = persisted.save().await?;
                println!("Configuration written to: {}", path.display());
            } else if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Use --show to print it or --init to write the defaults.");
            }
        }
        Commands::Strategies => {
            let pipeline = CaptionPipeline::from_config(&config)?;
            println!("Caption strategies, in order:");
            for (index, name) in pipeline.strategy_names().iter().enumerate() {
                println!("  {}. {}", index + 1, name);
            }
        }
    }

    Ok(())
}
