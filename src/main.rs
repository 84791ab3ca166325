//! Commodity storage intrinsic valuation CLI
//!
//! Usage:
//!   intrinsic --storage data/sample/storage.json \
//!       --forward-curve data/sample/forward_curve.csv \
//!       --interest-rates data/sample/interest_rates.csv \
//!       --valuation-date 2025-04-01 --inventory 0

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use cmdty_storage::curves::loader::{load_forward_curve, load_interest_rates};
use cmdty_storage::storage::loader::load_storage;
use cmdty_storage::{IntrinsicValuation, SettlementRule, Storage, ValuationConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

fn parse_settlement(text: &str) -> std::result::Result<SettlementRule, String> {
    SettlementRule::parse(text).ok_or_else(|| {
        format!(
            "unknown settlement rule '{}' (expected period-start, fixed:YYYY-MM-DD, following-month:N or days-after:N)",
            text
        )
    })
}

#[derive(Parser, Debug)]
#[command(name = "intrinsic")]
#[command(about = "Intrinsic valuation of a commodity storage facility")]
struct Args {
    /// Storage description (JSON)
    #[arg(long)]
    storage: PathBuf,

    /// Forward curve CSV with `period,price` rows
    #[arg(long)]
    forward_curve: PathBuf,

    /// Interest rate CSV with `date,rate` rows
    #[arg(long)]
    interest_rates: PathBuf,

    /// Valuation date (YYYY-MM-DD)
    #[arg(long)]
    valuation_date: NaiveDate,

    /// Inventory held on the valuation date
    #[arg(long, default_value = "0")]
    inventory: f64,

    /// Settlement convention
    #[arg(long, default_value = "period-start", value_parser = parse_settlement)]
    settlement: SettlementRule,

    /// Inventory grid points per period
    #[arg(long)]
    grid_points: Option<usize>,

    /// Decision search tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write the operating profile to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let storage = load_storage(&args.storage)?;
    let forward_curve = load_forward_curve(&args.forward_curve, storage.frequency())?;
    let interest_rates = load_interest_rates(&args.interest_rates)?;

    let mut config = ValuationConfig::default();
    if let Some(points) = args.grid_points {
        config = config.with_grid_points(points);
    }
    if let Some(tolerance) = args.tolerance {
        config = config.with_tolerance(tolerance);
    }

    let settlement = args.settlement;
    let result = IntrinsicValuation::new(config)
        .valuate(
            &storage,
            args.valuation_date,
            args.inventory,
            &forward_curve,
            &interest_rates,
            |p| settlement.settlement_date(p),
        )
        .context("valuation failed")?;

    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        result.write_profile_csv(BufWriter::new(file))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Intrinsic Storage Valuation");
    println!("===========================\n");
    println!("Valuation date: {}", result.valuation_date);
    println!("Storage: {} to {} ({})", storage.start(), storage.end(), storage.frequency());
    println!("Starting inventory: {:.4}", args.inventory);
    println!();

    println!(
        "{:>10} {:>12} {:>12} {:>10} {:>10} {:>12} {:>14} {:>10}",
        "Period", "Inventory", "Inj/Wd", "Consumed", "Loss", "NetPos", "CashFlow", "DF"
    );
    println!("{}", "-".repeat(98));
    for row in &result.profile {
        println!(
            "{:>10} {:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>12.4} {:>14.4} {:>10.6}",
            row.period.to_string(),
            row.inventory,
            row.inject_withdraw_volume,
            row.cmdty_consumed,
            row.inventory_loss,
            row.net_position,
            row.cash_flow,
            row.discount_factor,
        );
    }

    let summary = result.summary();
    println!("\nSummary:");
    println!("  Periods: {}", summary.num_periods);
    println!("  Total Injected: {:.4}", summary.total_injected);
    println!("  Total Withdrawn: {:.4}", summary.total_withdrawn);
    println!("  Total Consumed: {:.4}", summary.total_cmdty_consumed);
    println!("  Total Inventory Loss: {:.4}", summary.total_inventory_loss);
    println!("  Undiscounted Cash Flow: {:.2}", summary.undiscounted_cash_flow);
    println!("  Terminal Inventory: {:.4}", summary.terminal_inventory);
    println!("  Terminal Value PV: {:.2}", result.terminal_value_pv);
    println!("  NPV: {:.2}", summary.npv);

    if let Some(path) = &args.output {
        println!("\nProfile written to: {}", path.display());
    }

    Ok(())
}
