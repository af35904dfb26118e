use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use storage::{SlotStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/catalog.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListSlots,
    ShowSlot { name: String },
    ClearSlot { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::ListSlots => {
            let slots = storage.list_slots().await?;
            if slots.is_empty() {
                println!("no slots");
            }
            for slot in slots {
                println!(
                    "{}\t{} bytes\tupdated {}",
                    slot.name,
                    slot.size_bytes,
                    slot.updated_at.to_rfc3339()
                );
            }
        }
        Command::ShowSlot { name } => {
            let Some(raw) = storage.read_slot(&name).await? else {
                println!("slot {name:?} is empty");
                return Ok(());
            };
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => println!(
                    "{}",
                    serde_json::to_string_pretty(&value).context("failed to format slot")?
                ),
                Err(_) => println!("{raw}"),
            }
        }
        Command::ClearSlot { name } => {
            if storage.clear_slot(&name).await? {
                println!("cleared slot {name:?}");
            } else {
                println!("slot {name:?} was already empty");
            }
        }
    }

    Ok(())
}
