mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "llmwrap")]
#[command(author, version, about = "Provider wrappers for text generation and feature extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull a model from HuggingFace for the local pipelines
    Pull {
        /// Model identifier (e.g., "microsoft/phi-2")
        model: String,

        /// Specific file to download
        #[arg(short, long)]
        file: Option<String>,
    },

    /// List downloaded models
    #[command(alias = "ls")]
    Models,

    /// Remove a downloaded model
    #[command(alias = "rm")]
    Remove {
        /// Model name to remove
        model: String,
    },

    /// View or set configuration
    Config {
        /// Config key (e.g., "openai.api_key", "inference.temperature")
        key: Option<String>,

        /// Value to set (if omitted, shows current value)
        value: Option<String>,
    },

    /// Generate text with a HuggingFace model
    Generate {
        /// Prompt to complete
        prompt: String,

        /// Model name (registry name, or repo id with --api)
        #[arg(short, long)]
        model: String,

        /// Use the hosted Inference API instead of a local pipeline
        #[arg(long)]
        api: bool,

        /// Max new tokens (default from config)
        #[arg(long)]
        max_new_tokens: Option<u32>,

        /// Sampling temperature (default from config)
        #[arg(short, long)]
        temperature: Option<f32>,
    },

    /// Embed texts with a HuggingFace feature-extraction model
    Extract {
        /// Texts to embed
        #[arg(required = true)]
        texts: Vec<String>,

        /// Model name (registry name, or repo id with --api)
        #[arg(short, long)]
        model: String,

        /// Use the hosted Inference API instead of a local pipeline
        #[arg(long)]
        api: bool,
    },

    /// Chat interactively with an OpenAI model
    Chat {
        /// Model name
        #[arg(short, long, default_value = "gpt-4o-mini")]
        model: String,
    },

    /// Embed texts with an OpenAI embedding model
    Embed {
        /// Texts to embed
        #[arg(required = true)]
        texts: Vec<String>,

        /// Model name
        #[arg(short, long, default_value = "text-embedding-3-small")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pull { model, file } => {
            commands::pull::execute(&model, file.as_deref()).await?;
        }
        Commands::Models => {
            commands::models::execute().await?;
        }
        Commands::Remove { model } => {
            commands::remove::execute(&model).await?;
        }
        Commands::Config { key, value } => {
            commands::config::execute(key.as_deref(), value.as_deref()).await?;
        }
        Commands::Generate {
            prompt,
            model,
            api,
            max_new_tokens,
            temperature,
        } => {
            commands::generate::execute(&model, &prompt, api, max_new_tokens, temperature).await?;
        }
        Commands::Extract { texts, model, api } => {
            commands::extract::execute(&model, &texts, api).await?;
        }
        Commands::Chat { model } => {
            commands::chat::execute(&model).await?;
        }
        Commands::Embed { texts, model } => {
            commands::embed::execute(&model, &texts).await?;
        }
    }

    Ok(())
}
