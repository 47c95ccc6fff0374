use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

use linxport::csv;
use linxport::import::{self, ImportResult};
use linxport::store::{DriverStore, JsonFileStore};

/// Import/export utility for AB_ETH driver address lists
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the driver store file
    #[arg(short, long, default_value = "drivers.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import drivers from a CSV file into the store
    Import {
        /// Path to the CSV file to import
        csv: PathBuf,

        /// How to reconcile imported drivers with existing ones
        #[arg(long, value_enum, default_value_t = Mode::Merge)]
        mode: Mode,
    },

    /// Export the store's drivers to a CSV file
    Export {
        /// Path of the CSV file to write
        csv: PathBuf,
    },

    /// List the drivers currently in the store
    List,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    /// Union imported nodes into existing drivers
    Merge,
    /// Replace existing drivers' node lists with the imported ones
    Overwrite,
}

fn run_import(store: &mut JsonFileStore, csv_path: &PathBuf, mode: Mode) -> Result<()> {
    let current = store
        .load_all()
        .wrap_err("Failed to load drivers from store")?;
    info!("Loaded {} driver(s) from store", current.len());

    let imported = csv::read_drivers_from_file(csv_path)
        .wrap_err_with(|| format!("Failed to read CSV file '{}'", csv_path.display()))?;
    info!(
        "Parsed {} driver(s) from '{}'",
        imported.len(),
        csv_path.display()
    );

    let result: ImportResult = match mode {
        Mode::Merge => import::merge_drivers(&current, &imported),
        Mode::Overwrite => import::overwrite_drivers(&current, &imported),
    };

    if !result.success {
        return Err(eyre!("Import failed: {}", result.errors.join("; ")));
    }
    // Non-fatal errors, e.g. a merge capped at the node limit
    for error in &result.errors {
        warn!("{}", error);
    }

    // One save per driver; the store has no multi-driver transaction
    for driver in result.updated_drivers.iter().chain(&result.new_drivers) {
        store
            .save(driver)
            .wrap_err_with(|| format!("Failed to save driver '{}'", driver.name))?;
    }

    info!(
        "Import complete: {} driver(s) updated, {} added",
        result.updated_drivers.len(),
        result.new_drivers.len()
    );
    Ok(())
}

fn run_export(store: &JsonFileStore, csv_path: &PathBuf) -> Result<()> {
    let drivers = store
        .load_all()
        .wrap_err("Failed to load drivers from store")?;

    csv::write_drivers_to_file(csv_path, &drivers)
        .wrap_err_with(|| format!("Failed to write CSV file '{}'", csv_path.display()))?;

    info!(
        "Exported {} driver(s) to '{}'",
        drivers.len(),
        csv_path.display()
    );
    Ok(())
}

fn run_list(store: &JsonFileStore) -> Result<()> {
    let drivers = store
        .load_all()
        .wrap_err("Failed to load drivers from store")?;

    if drivers.is_empty() {
        info!("Store is empty");
        return Ok(());
    }

    for driver in &drivers {
        info!(
            "{:<10} {:<15} {} node(s)",
            driver.key_name,
            driver.name,
            driver.nodes.len()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Driver store: {:?}", args.store);
    let mut store = JsonFileStore::new(&args.store);

    match args.command {
        Command::Import { ref csv, mode } => run_import(&mut store, csv, mode),
        Command::Export { ref csv } => run_export(&store, csv),
        Command::List => run_list(&store),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linxport::EthDriver;

    /// A refused reconciliation comes back as one error, with each
    /// underlying message appearing exactly once.
    #[test]
    fn test_run_import_reports_failure_once() {
        let dir = tempfile::tempdir().unwrap();
        let store_path = dir.path().join("drivers.json");
        let csv_path = dir.path().join("import.csv");
        std::fs::write(&csv_path, "Type,Name,Range\n").unwrap();

        let mut store = JsonFileStore::new(&store_path);
        let mut driver = EthDriver::new("A");
        driver.key_name = "AB_ETH-1".to_string();
        store.save(&driver).unwrap();

        let err = run_import(&mut store, &csv_path, Mode::Merge).unwrap_err();
        let message = format!("{}", err);
        assert_eq!(message.matches("No drivers found").count(), 1);

        // The failed import must not have touched the store
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
