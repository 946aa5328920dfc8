use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use primdb::storage::{SnapshotManager, StoreSnapshot};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "primdb")]
#[command(about = "Developer tooling for primdb store files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the content of a store file as JSON
    Dump {
        path: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// Print object counts per type
    Stats { path: PathBuf },
    /// Report whether opening with the given schema version needs a migration
    Check {
        path: PathBuf,
        #[arg(long)]
        schema_version: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Dump { path, pretty } => dump(&path, pretty),
        Command::Stats { path } => stats(&path),
        Command::Check {
            path,
            schema_version,
        } => check(&path, schema_version),
    }
}

fn load(path: &Path) -> Result<StoreSnapshot> {
    SnapshotManager::new(path)
        .load()
        .with_context(|| format!("Failed to read store file '{}'", path.display()))?
        .ok_or_else(|| anyhow!("Store file '{}' does not exist", path.display()))
}

fn dump(path: &Path, pretty: bool) -> Result<()> {
    let snapshot = load(path)?;
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)
    } else {
        serde_json::to_string(&snapshot)
    }
    .context("Failed to encode store as JSON")?;

    println!("{}", json);
    Ok(())
}

fn stats(path: &Path) -> Result<()> {
    let snapshot = load(path)?;

    let mut per_type: BTreeMap<&str, (usize, usize)> = snapshot
        .schema
        .iter()
        .map(|schema| (schema.name(), (0, 0)))
        .collect();
    for (_, record) in &snapshot.objects {
        let entry = per_type.entry(record.type_name.as_str()).or_default();
        entry.0 += 1;
        entry.1 += record.value_count();
    }

    println!("Store:          {}", path.display());
    println!("Format version: {}", snapshot.format_version);
    println!("Schema version: {}", snapshot.schema_version);
    println!("Objects:        {}", snapshot.object_count());
    for (type_name, (objects, values)) in per_type {
        println!("  {:<20} {:>6} objects {:>8} values", type_name, objects, values);
    }
    Ok(())
}

fn check(path: &Path, schema_version: u64) -> Result<()> {
    let snapshot = load(path)?;
    let stored = snapshot.schema_version;

    if stored > schema_version {
        return Err(anyhow!(
            "Store '{}' is at schema version {}, newer than {}",
            path.display(),
            stored,
            schema_version
        ));
    }

    if stored < schema_version {
        println!(
            "Migration required: schema version {} -> {} ({} objects)",
            stored,
            schema_version,
            snapshot.object_count()
        );
    } else {
        println!("Up to date at schema version {}", stored);
    }
    Ok(())
}
