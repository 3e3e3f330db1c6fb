//! interest-advisor: batch interest simulation and a text viewer for results.
//!
//! Usage:
//!   interest-advisor one-account --input customers.csv --out-dir outputs
//!   interest-advisor stash --input stash.csv --out-dir outputs
//!   interest-advisor show --customers customers.csv --results outputs/one_account_interest_simulation_rows.csv
//!   interest-advisor schema

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use interest_advisor::report::{
    default_json_name, default_rows_name, export_result_json, read_customer_table_file,
    read_rows_csv, render, write_json, write_rows_csv, MergedView,
};
use interest_advisor::{process_customers_file, Advisor, AdvisorConfig, InterestReport, Product};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "interest-advisor", version, about = "Interest simulation for tiered savings accounts")]
struct Cli {
    /// JSON file overriding product tables, pacing or model settings
    #[arg(long, global = true, env = "INTEREST_ADVISOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate One Account customers
    OneAccount(RunArgs),
    /// Simulate Stash Account customers
    Stash(RunArgs),
    /// Show one customer's inputs next to their result
    Show(ShowArgs),
    /// Print the JSON Schema of a report
    Schema,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Write banker messages with the local Ollama model
    #[cfg(feature = "ollama")]
    #[arg(long)]
    narrate: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    #[arg(long)]
    customers: PathBuf,

    #[arg(long)]
    results: PathBuf,

    #[arg(long)]
    customer_id: Option<String>,

    /// Also write `<customer_id>_result.json` into this directory
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AdvisorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AdvisorConfig::default(),
    };

    match cli.command {
        Command::OneAccount(args) => run(config, Product::OneAccount, &args),
        Command::Stash(args) => run(config, Product::StashAccount, &args),
        Command::Show(args) => show(&args),
        Command::Schema => {
            println!("{}", InterestReport::schema_as_json()?);
            Ok(())
        }
    }
}

#[cfg(feature = "ollama")]
fn build_advisor(config: AdvisorConfig, args: &RunArgs) -> Result<Advisor> {
    if !args.narrate {
        return Ok(Advisor::new(config));
    }
    let narrator = interest_advisor::llm::OllamaNarrator::new(config.clone())?;
    Ok(Advisor::new(config).with_narrator(Box::new(narrator)))
}

#[cfg(not(feature = "ollama"))]
fn build_advisor(config: AdvisorConfig, _args: &RunArgs) -> Result<Advisor> {
    Ok(Advisor::new(config))
}

fn run(config: AdvisorConfig, product: Product, args: &RunArgs) -> Result<()> {
    let advisor = build_advisor(config, args)?;
    let outcomes = process_customers_file(&advisor, &args.input, product)
        .with_context(|| format!("reading {}", args.input.display()))?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let now = chrono::Local::now().naive_local();
    let json_path = args.out_dir.join(default_json_name(product, now));
    let rows_path = args.out_dir.join(default_rows_name(product));
    write_json(&json_path, &outcomes)?;
    write_rows_csv(&rows_path, &outcomes)?;

    let failed = outcomes.iter().filter(|o| o.is_failed()).count();
    println!(
        "Completed {} customers ({} failed). Saved {} and {}",
        outcomes.len(),
        failed,
        json_path.display(),
        rows_path.display()
    );
    Ok(())
}

fn show(args: &ShowArgs) -> Result<()> {
    let customers = read_customer_table_file(&args.customers)
        .with_context(|| format!("reading {}", args.customers.display()))?;
    let results = read_rows_csv(&args.results)
        .with_context(|| format!("reading {}", args.results.display()))?;
    let view = MergedView::left_join(customers, results);

    let row = match &args.customer_id {
        Some(id) => match view.find(id.trim()) {
            Some(row) => row,
            None => bail!("customer {} not found in {}", id, args.customers.display()),
        },
        None => match view.rows.first() {
            Some(row) => row,
            None => bail!("no customers in {}", args.customers.display()),
        },
    };

    print!("{}", render(row));

    if let Some(dir) = &args.export {
        export(row, dir)?;
    }
    Ok(())
}

fn export(row: &interest_advisor::MergedRow, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = export_result_json(row, dir)?;
    println!("Exported {}", path.display());
    Ok(())
}
