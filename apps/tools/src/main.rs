use std::{fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{Difficulty, ItemId, LengthCategory},
    protocol::NewCatalogItem,
};
use server_api::validate_new_item;
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "APP__DATABASE_URL", default_value = "sqlite://./data/academy.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load tutorials from a JSON array, skipping ids already stored.
    Import { path: PathBuf },
    AddTutorial {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        topic: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        length: Option<LengthCategory>,
        #[arg(long)]
        thumbnail: Option<String>,
    },
    List,
    Remove { item_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Import { path } => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            let items: Vec<NewCatalogItem> = serde_json::from_str(&raw)
                .with_context(|| format!("'{}' is not a tutorial array", path.display()))?;
            check_import(&items)
                .with_context(|| format!("'{}' was not imported", path.display()))?;
            let written = storage.import_items(&items).await?;
            println!("imported {written} of {} tutorials", items.len());
        }
        Command::AddTutorial {
            title,
            description,
            topic,
            difficulty,
            length,
            thumbnail,
        } => {
            let new_item = NewCatalogItem {
                id: None,
                title,
                description,
                topic,
                difficulty,
                length_category: length,
                thumbnail,
            };
            if let Err(err) = validate_new_item(&new_item) {
                bail!("{}", err.message);
            }
            let created = storage
                .insert_item(&new_item)
                .await?
                .context("generated id collided with an existing tutorial")?;
            println!("created tutorial id={}", created.id);
        }
        Command::List => {
            for stored in storage.list_stored_items().await? {
                println!(
                    "{}\t{}\t{}",
                    stored.item.id,
                    stored.created_at.format("%Y-%m-%d %H:%M"),
                    stored.item.title
                );
            }
        }
        Command::Remove { item_id } => {
            if storage.delete_item(&ItemId(item_id.clone())).await? {
                println!("removed tutorial id={item_id}");
            } else {
                println!("no tutorial with id={item_id}");
            }
        }
    }

    Ok(())
}

/// Applies the same rules as `POST /tutorials` to every record before any
/// of them is written.
fn check_import(items: &[NewCatalogItem]) -> Result<()> {
    for (index, item) in items.iter().enumerate() {
        if let Err(err) = validate_new_item(item) {
            bail!("tutorial #{} ('{}'): {}", index + 1, item.title, err.message);
        }
    }
    Ok(())
}
