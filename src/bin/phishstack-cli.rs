use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phishstack::config::ConfigManager;
use phishstack::features::FeatureExtractor;
use phishstack::ml::training::LogProgress;
use phishstack::pipeline::{train_from_csv, PhishingDetector, PredictionResult};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "phishstack-cli")]
#[command(author, version, about = "Stacked-ensemble phishing URL detector")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (defaults to ./phishstack.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Train a model from a labelled CSV file
    Train {
        /// CSV with the six feature columns and the label column
        csv: PathBuf,

        /// Where to write the model (defaults to serving.artifact_path)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Analyze one or more URLs
    Analyze {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Read URLs from stdin until 'quit' or 'exit' (the default)
    Interactive,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let manager = ConfigManager::new();
    manager.load_startup(cli.config.as_deref())?;
    let config = manager.get()?;

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Train { csv, out } => {
            let (pipeline, report, dataset) = train_from_csv(&csv, &config, &mut LogProgress)
                .with_context(|| format!("training on {} failed", csv.display()))?;
            println!(
                "Read {} rows, kept {} ({} skipped)",
                dataset.summary.rows_read,
                dataset.summary.rows_kept,
                dataset.summary.rows_skipped()
            );
            println!("{}", report);
            let out = out.unwrap_or_else(|| PathBuf::from(&config.serving.artifact_path));
            pipeline
                .save(&out)
                .with_context(|| format!("could not write {}", out.display()))?;
            println!("Model saved to {}", out.display());
        }
        Commands::Analyze { urls } => {
            let detector = load_detector(&config)?;
            for url in &urls {
                match detector.analyze(url) {
                    Ok(result) => print_result(&result),
                    Err(e) => eprintln!("{}: {}", url, e),
                }
            }
        }
        Commands::Interactive => interactive(&load_detector(&config)?)?,
    }
    Ok(())
}

fn load_detector(config: &phishstack::config::AppConfig) -> Result<PhishingDetector> {
    let extractor = FeatureExtractor::new(Arc::new(config.extraction.build_lookup()));
    let detector = PhishingDetector::load_with(&config.serving.artifact_path, extractor)
        .context("train a model first with `phishstack-cli train <csv>`")?;
    Ok(detector)
}

fn interactive(detector: &PhishingDetector) -> Result<()> {
    println!("Phishing URL detector. Type 'quit' or 'exit' to leave.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nEnter URL to analyze: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let input = line?;
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_ascii_lowercase().as_str(), "quit" | "exit") {
            break;
        }
        match detector.analyze(input) {
            Ok(result) => print_result(&result),
            Err(e) => eprintln!("Error: {}", e),
        }
    }
    Ok(())
}

fn print_result(result: &PredictionResult) {
    println!("URL: {}", result.url);
    let verdict = if result.is_phishing() {
        "PHISHING URL"
    } else {
        "LEGITIMATE URL"
    };
    println!("Result: {}", verdict);
    println!("Confidence: {:.2}%", result.confidence() * 100.0);
    println!("  legitimate: {:.4}", result.p_legitimate);
    println!("  phishing:   {:.4}", result.p_phishing);
    for (name, value) in result.features.named_values() {
        println!("  {:<24}{}", name, value);
    }
    for degraded in &result.degraded {
        println!("  note: {}", degraded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_with_out_and_global_config() {
        let cli = Cli::try_parse_from([
            "phishstack-cli",
            "train",
            "data.csv",
            "--out",
            "model.json",
            "--config",
            "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(
            cli.command,
            Some(Commands::Train {
                csv: PathBuf::from("data.csv"),
                out: Some(PathBuf::from("model.json")),
            })
        );
    }

    #[test]
    fn test_analyze_takes_urls_but_not_unknown_flags() {
        let cli = Cli::try_parse_from(["phishstack-cli", "analyze", "a.com", "https://b.org"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Analyze {
                urls: vec!["a.com".to_string(), "https://b.org".to_string()],
            })
        );

        assert!(Cli::try_parse_from(["phishstack-cli", "analyze", "-v", "https://x"]).is_err());
        assert!(Cli::try_parse_from(["phishstack-cli", "analyze"]).is_err());
        assert!(Cli::try_parse_from(["phishstack-cli", "--bogus"]).is_err());
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["phishstack-cli"]).unwrap();
        assert_eq!(cli.command, None);
        let cli = Cli::try_parse_from(["phishstack-cli", "interactive", "-c", "x.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Interactive));
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
