use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "kickdata")]
#[command(about = "Kickstarter campaign dataset pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge raw Web Robots exports into one deduplicated campaign table
    Merge {
        /// Folder holding one subdirectory of export files per period
        #[arg(long, default_value = "data/web_robots")]
        data_folder: PathBuf,

        /// Campaign table to (re)create
        #[arg(long, default_value = "data/raw_kickstarter_data.csv")]
        output_file: PathBuf,

        /// Compact the output after every N export files
        #[arg(long, default_value_t = 50)]
        dedup_every: usize,
    },
    /// Scrape campaign pages for pending rows and append the enriched results
    Collect {
        /// Working campaign table (carries the completion flags)
        #[arg(long, default_value = "data/raw_kickstarter_data.csv")]
        input_file: PathBuf,

        /// Enriched output table
        #[arg(long, default_value = "data/raw_kickstarter_data_with_campaign_info.csv")]
        output_file: PathBuf,

        /// Number of collection batches to run
        #[arg(long, default_value_t = 2)]
        batches: u32,

        /// Seconds to wait between batches
        #[arg(long, default_value_t = 250)]
        wait: u64,

        /// Maximum page requests per batch
        #[arg(long, default_value_t = 200)]
        max_requests: usize,
    },
    /// Derive the numeric feature table from the enriched campaign table
    Features {
        #[arg(long, default_value = "data/raw_kickstarter_data_with_campaign_info.csv")]
        input_file: PathBuf,

        #[arg(long, default_value = "data/kickstarter_data.csv")]
        output_file: PathBuf,
    },
    /// Reserved no-op mode for ad-hoc experiments
    Sandbox,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = kickdata_core::load_app_config_from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            data_folder,
            output_file,
            dedup_every,
        } => {
            kickdata_pipeline::merge_raw_exports(&data_folder, &output_file, dedup_every)?;
            kickdata_pipeline::collapse_project_duplicates(&output_file, &output_file)?;
            kickdata_pipeline::annotate_creator_history(&output_file, &output_file)?;
        }
        Commands::Collect {
            input_file,
            output_file,
            batches,
            wait,
            max_requests,
        } => {
            let client = kickdata_scraper::CampaignClient::new(
                config.scraper_request_timeout_secs,
                &config.scraper_user_agent,
            )?;
            kickdata_pipeline::collect_batches(
                &client,
                &input_file,
                &output_file,
                batches,
                wait,
                max_requests,
                Duration::from_millis(config.scraper_request_delay_ms),
            )
            .await?;
        }
        Commands::Features {
            input_file,
            output_file,
        } => {
            kickdata_pipeline::preprocess_features(&input_file, &output_file)?;
        }
        Commands::Sandbox => {
            tracing::info!("sandbox mode does nothing");
        }
    }

    Ok(())
}
