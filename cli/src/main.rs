use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "cropchat",
    version,
    about = "CropChat CLI — chat with the crop disease assistant and run image analysis"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "CROPCHAT_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Send one chat turn (text, an image file, or both)
    Chat {
        /// Free-text message
        #[arg(long)]
        message: Option<String>,
        /// Path to an image file to analyze before the assistant replies
        #[arg(long)]
        image: Option<PathBuf>,
        /// Session to continue (echoed by previous responses)
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Analyze an image against the identification provider and write a
    /// handoff file a new chat session can be seeded from
    Analyze {
        /// Path to the image file
        #[arg(long)]
        image: PathBuf,
        /// Where to write the interchange handoff JSON
        #[arg(long, default_value = "crop_analysis_data.json")]
        output: PathBuf,
        /// Identification provider endpoint
        #[arg(
            long,
            env = "CROPCHAT_IDENTIFICATION_URL",
            default_value = "https://api.deepleaf.io/analyze"
        )]
        provider_url: String,
        /// Identification provider API key
        #[arg(long, env = "CROPCHAT_IDENTIFICATION_API_KEY")]
        api_key: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Chat {
            message,
            image,
            session_id,
        } => {
            commands::chat::run(
                &cli.api_url,
                message.as_deref(),
                image.as_deref(),
                session_id.as_deref(),
            )
            .await
        }
        Commands::Analyze {
            image,
            output,
            provider_url,
            api_key,
        } => commands::analyze::run(&provider_url, &api_key, &image, &output).await,
    };

    std::process::exit(exit_code);
}
