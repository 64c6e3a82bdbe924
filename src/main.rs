use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seed_unscrambler::config::SearchConfig;
use seed_unscrambler::error::RecoveryError;
use seed_unscrambler::monitor::utils;
use seed_unscrambler::search::{SearchDriver, SearchOutcome};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seed-unscrambler")]
#[command(version)]
#[command(about = "Recover a scrambled BIP-39 mnemonic by checkpointed permutation search")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search all orderings of the candidate words for the target address
    Search {
        /// JSON configuration file; command-line flags override its values
        #[arg(short, long)]
        config: Option<String>,

        /// Candidate words, comma separated
        #[arg(short, long, value_delimiter = ',')]
        words: Option<Vec<String>>,

        /// Target address the correct ordering must derive
        #[arg(short, long)]
        target: Option<String>,

        /// Derivation path to try; repeat for several paths
        #[arg(short, long = "path")]
        paths: Vec<String>,

        /// Passphrase for BIP39 seed generation (empty by default)
        #[arg(long)]
        passphrase: Option<String>,

        /// Worker threads for candidate evaluation (1 = sequential)
        #[arg(long)]
        threads: Option<usize>,

        /// Checkpoint file path
        #[arg(long)]
        checkpoint_file: Option<PathBuf>,

        /// Discard any saved checkpoint and start over
        #[arg(long, default_value_t = false)]
        fresh: bool,

        /// Disable the progress bar
        #[arg(long, default_value_t = false)]
        no_progress: bool,
    },

    /// Write a configuration template to fill in
    InitConfig {
        /// Output file
        #[arg(short, long, default_value = "recovery.json")]
        output: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            config,
            words,
            target,
            paths,
            passphrase,
            threads,
            checkpoint_file,
            fresh,
            no_progress,
        } => {
            let mut config = load_config(config, words, target)?;

            if !paths.is_empty() {
                config.derivation_paths = paths;
            }
            if let Some(passphrase) = passphrase {
                config.passphrase = passphrase;
            }
            if let Some(threads) = threads {
                config.num_threads = threads;
            }
            if let Some(path) = checkpoint_file {
                config.checkpoint_file = path;
            }
            if no_progress {
                config.show_progress_bar = false;
            }

            config.validate()?;
            run_search(config, fresh)
        }

        Commands::InitConfig { output } => {
            let template = SearchConfig::for_words_and_target(
                vec!["word1".to_string(), "word2".to_string()],
                "bc1q...".to_string(),
            );
            template.to_file(&output)?;
            println!("Configuration template written to {}", output);
            println!("Fill in the candidate words and the target address, then run:");
            println!("  seed-unscrambler search --config {}", output);
            Ok(())
        }
    }
}

fn load_config(
    config_file: Option<String>,
    words: Option<Vec<String>>,
    target: Option<String>,
) -> Result<SearchConfig> {
    if let Some(path) = config_file {
        let mut config = SearchConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?;
        // Inline flags beat the file.
        if let Some(words) = words {
            config.words = words;
        }
        if let Some(target) = target {
            config.target_address = target;
        }
        return Ok(config);
    }

    match (words, target) {
        (Some(words), Some(target)) => Ok(SearchConfig::for_words_and_target(words, target)),
        _ => anyhow::bail!(
            "Provide either --config FILE or both --words and --target.\n\
             Example: seed-unscrambler search --words grab,merit,chuckle,... --target bc1q..."
        ),
    }
}

fn run_search(config: SearchConfig, fresh: bool) -> Result<()> {
    println!("Starting permutation search for target address: {}", config.target_address);
    println!("Total words in list: {}", config.words.len());
    if let Some(total) = config.search_space() {
        println!("Total orderings to check: {}", utils::format_number(total));
    }
    println!("Checking derivation paths: {}", config.derivation_paths.join(", "));

    if fresh {
        seed_unscrambler::checkpoint::CheckpointStore::new(config.checkpoint_file.clone())
            .clear()
            .context("Failed to discard saved checkpoint")?;
    }

    if config.num_threads > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build_global()
            .context("Failed to build thread pool")?;
        println!("Evaluating with {} threads", config.num_threads);
    }

    // Ctrl-C requests a cooperative stop; the driver saves progress first.
    let stop = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let stop = stop.clone();
        move || {
            eprintln!("\nReceived interrupt signal, stopping after the current batch...");
            stop.store(true, Ordering::Relaxed);
        }
    })
    .context("Failed to install interrupt handler")?;

    let start_time = Instant::now();
    let mut driver = SearchDriver::new(config, stop)?;

    match driver.run() {
        Ok(SearchOutcome::Found {
            matched,
            permutations_checked,
        }) => {
            let elapsed = start_time.elapsed();
            println!("\n{}", "=".repeat(70));
            println!("MATCH FOUND");
            println!("Mnemonic phrase:   {}", matched.phrase);
            println!("Derived address:   {}", matched.address);
            println!("Derivation path:   {}", matched.derivation_path);
            println!(
                "Permutations:      {}",
                utils::format_number(permutations_checked)
            );
            println!("Time taken:        {}", utils::format_duration(elapsed));
            println!("{}", "=".repeat(70));
            Ok(())
        }
        Ok(SearchOutcome::Exhausted {
            permutations_checked,
        }) => {
            let elapsed = start_time.elapsed();
            println!(
                "\nSearch completed: target address not found after {} permutations ({}).",
                utils::format_number(permutations_checked),
                utils::format_duration(elapsed)
            );
            println!("Checkpoint file removed.");
            Ok(())
        }
        Err(RecoveryError::Cancelled) => {
            println!("\nSearch interrupted; progress saved. Run the same command to resume.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
