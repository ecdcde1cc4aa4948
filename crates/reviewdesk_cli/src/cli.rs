use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reviewdesk")]
#[command(author, version, about = "Image batch review store")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot file to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display version information
    Version,

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that open the snapshot store.
#[derive(Subcommand)]
pub enum StoreCommand {
    /// Create or load the store and report its location
    Init,

    /// Create an empty batch with the given id
    CreateBatch { id: String },

    /// Add an asset to an existing batch
    AddAsset {
        id: String,
        batch_id: String,
        filename: String,
        filepath: String,
    },

    /// Create a batch with generated ids from `filename=filepath` pairs
    Upload {
        #[arg(required = true)]
        files: Vec<String>,
    },

    /// Set an asset's review status (pending, approved, rejected)
    SetStatus { asset_id: String, status: String },

    /// Add a comment to an asset
    Comment {
        asset_id: String,
        #[arg(long)]
        author: String,
        content: String,
    },

    /// Show a batch and its assets
    ShowBatch { id: String },

    /// Show an asset and its comments
    ShowAsset { id: String },

    /// Count assets per status in a batch
    Summary { batch_id: String },
}
