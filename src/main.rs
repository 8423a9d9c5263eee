// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use carbon_calc::config::DEFAULT_CONFIG_FILE;
use carbon_calc::{format_kg, AppConfig, Calculator, IceDb, SessionStore};

#[derive(Parser)]
#[command(name = "carbon-calc", version, about = "Embodied carbon add/omit calculator")]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// ICE DB CSV file, overrides the config file
    #[arg(long)]
    ice_db: Option<PathBuf>,

    /// Folder holding saved calculations, overrides the config file
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive calculator (default)
    Tui,
    /// Print the Material / Sub-material / ICE DB Name tree
    Materials,
    /// List saved calculations
    List,
    /// Print a saved calculation with its totals
    Show { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?
        .with_overrides(cli.ice_db.clone(), cli.save_dir.clone());

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            init_file_logging(&config, cli.verbose)?;
            run_ui_mode(&config)?;
        }
        Commands::Materials => {
            init_logging(cli.verbose);
            run_materials(&config)?;
        }
        Commands::List => {
            init_logging(cli.verbose);
            run_list(&config)?;
        }
        Commands::Show { name } => {
            init_logging(cli.verbose);
            run_show(&config, &name)?;
        }
    }

    Ok(())
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn init_logging(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_writer(std::io::stderr)
        .try_init();
}

/// The UI owns the terminal, so logs go to a file next to the saved calculations.
fn init_file_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    std::fs::create_dir_all(&config.save_folder).with_context(|| {
        format!("Failed to create save folder {}", config.save_folder.display())
    })?;
    let path = config.log_path();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbose))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &AppConfig) -> Result<()> {
    println!("🌍 Loading ICE DB from {}...", config.ice_db_path.display());

    let calc = Calculator::from_config(config)?;
    println!("✓ Loaded {} materials", calc.db().len());

    let mut app = ui::App::new(calc);
    ui::run_ui(&mut app)?;

    println!("\n✅ Calculator closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: carbon-calc materials | list | show <name>");
    std::process::exit(1);
}

fn run_materials(config: &AppConfig) -> Result<()> {
    let db = IceDb::load(&config.ice_db_path)?;

    for material in db.materials() {
        println!("{}", material);
        for sub in db.sub_materials(&material) {
            println!("  {}", sub);
            for name in db.reference_names(&material, &sub) {
                let record = db.lookup(&name)?;
                println!(
                    "    {} ({} kgCO₂e per {})",
                    record.reference_name, record.carbon_per_unit, record.declared_unit
                );
            }
        }
    }

    Ok(())
}

fn run_list(config: &AppConfig) -> Result<()> {
    let store = SessionStore::open(&config.save_folder)?;
    let names = store.list()?;

    if names.is_empty() {
        println!("No saved calculations found.");
    }
    for name in names {
        println!("{}", name);
    }

    Ok(())
}

fn run_show(config: &AppConfig, name: &str) -> Result<()> {
    let store = SessionStore::open(&config.save_folder)?;
    let session = store.load(name)?;

    println!("📂 {}", session.name);
    if !session.description.is_empty() {
        println!("   {}", session.description);
    }

    println!("\nAdds");
    for (i, item) in session.adds.iter().enumerate() {
        println!("  {}", item.summary(i));
    }
    println!("\nOmits");
    for (i, item) in session.omits.iter().enumerate() {
        println!("  {}", item.summary(i));
    }

    let totals = session.totals();
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Total Adds (kgCO₂e):  {}", format_kg(totals.total_add));
    println!("Total Omits (kgCO₂e): {}", format_kg(totals.total_omit));
    println!("Net Change (kgCO₂e):  {}", format_kg(totals.net_change));

    Ok(())
}
