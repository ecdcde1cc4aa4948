//! Command-line front end for the review store.
//!
//! # Responsibility
//! - Wire config, logging and the storage engine together.
//! - Map each subcommand onto one core use case and print JSON.

mod cli;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use cli::{Cli, Commands, StoreCommand};
use log::info;
use reviewdesk_core::{
    core_version, load_config_or_default, AssetRepository, BatchRepository, NewAsset,
    ReviewService, SqliteAssetRepository, SqliteBatchRepository, StorageEngine, UploadedFile,
};
use serde::Serialize;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Version => {
            println!("reviewdesk_core version={}", core_version());
            return Ok(());
        }
        Commands::Store(command) => command,
    };

    let mut config = load_config_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    config.init_logging().map_err(|err| anyhow!(err))?;

    let engine = StorageEngine::open(&config.db_path)
        .with_context(|| format!("failed to open store at {}", config.db_path.display()))?;
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );

    run(&engine, command)
}

fn run(engine: &StorageEngine, command: StoreCommand) -> Result<()> {
    let service = ReviewService::with_engine(engine);

    match command {
        StoreCommand::Init => print_json(&serde_json::json!({
            "db_path": engine.snapshot_path(),
            "version": core_version(),
        })),
        StoreCommand::CreateBatch { id } => {
            print_json(&SqliteBatchRepository::new(engine).create_batch(&id)?)
        }
        StoreCommand::AddAsset {
            id,
            batch_id,
            filename,
            filepath,
        } => print_json(
            &SqliteAssetRepository::new(engine)
                .create_asset(&NewAsset::new(id, batch_id, filename, filepath))?,
        ),
        StoreCommand::Upload { files } => {
            let files = files
                .iter()
                .map(|pair| parse_upload_pair(pair))
                .collect::<Result<Vec<_>>>()?;
            print_json(&service.upload_batch(&files)?)
        }
        StoreCommand::SetStatus { asset_id, status } => {
            let change = service.set_status(&asset_id, &status)?;
            print_json(&serde_json::json!({
                "asset_id": change.asset_id,
                "previous": change.previous,
                "status": change.current,
            }))
        }
        StoreCommand::Comment {
            asset_id,
            author,
            content,
        } => print_json(&service.add_comment(&asset_id, &author, &content)?),
        StoreCommand::ShowBatch { id } => match service.batch_view(&id)? {
            Some(view) => print_json(&view),
            None => bail!("batch not found: {id}"),
        },
        StoreCommand::ShowAsset { id } => match service.asset_view(&id)? {
            Some(view) => print_json(&view),
            None => bail!("asset not found: {id}"),
        },
        StoreCommand::Summary { batch_id } => print_json(&service.review_summary(&batch_id)?),
    }
}

/// Splits `filename=filepath`; a bare value is used for both.
fn parse_upload_pair(pair: &str) -> Result<UploadedFile> {
    let (filename, filepath) = pair.split_once('=').unwrap_or((pair, pair));
    if filename.is_empty() || filepath.is_empty() {
        bail!("invalid upload entry `{pair}`; expected filename=filepath");
    }
    Ok(UploadedFile::new(filename, filepath))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_upload_pair;
    use crate::cli::{Cli, Commands, StoreCommand};
    use clap::Parser;

    #[test]
    fn version_is_parsed_apart_from_store_commands() {
        let cli = Cli::try_parse_from(["reviewdesk", "version"]).unwrap();
        assert!(matches!(cli.command, Commands::Version));

        let cli = Cli::try_parse_from(["reviewdesk", "--db", "x.db", "summary", "b1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Store(StoreCommand::Summary { ref batch_id }) if batch_id == "b1"
        ));
    }

    #[test]
    fn upload_pair_splits_on_equals() {
        let file = parse_upload_pair("cat.png=1700-uuid.png").unwrap();
        assert_eq!(file.filename, "cat.png");
        assert_eq!(file.filepath, "1700-uuid.png");
    }

    #[test]
    fn bare_upload_entry_is_used_for_both_fields() {
        let file = parse_upload_pair("cat.png").unwrap();
        assert_eq!(file.filename, "cat.png");
        assert_eq!(file.filepath, "cat.png");
        assert!(parse_upload_pair("=x").is_err());
    }
}
