use std::path::PathBuf;

use clap::Parser;

/// Parley chat client
#[derive(Debug, Parser)]
#[command(name = "parley", about = "Chat with a local or remote language model")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "parley.toml", env = "PARLEY_CONFIG")]
    pub config: PathBuf,

    /// User prompt; read from stdin when omitted
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// System prompt prepended to the conversation
    #[arg(short, long)]
    pub system: Option<String>,

    /// Wait for the full answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Ask the model to reason before answering
    #[arg(long)]
    pub thinking: Option<bool>,
}
