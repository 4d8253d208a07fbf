//! bopp-pricing CLI
//!
//! Price BOPP tape and maintain the rate table from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the current rate table (seeds defaults on first run)
//! bopp-pricing rates
//!
//! # Raise the profit rate as an admin
//! bopp-pricing update --actor-id u1 --actor-name Alice --set profit=12
//!
//! # Review the last five rate changes
//! bopp-pricing history --actor-id u1 --actor-name Alice
//!
//! # Price a tape and print the rate card
//! bopp-pricing calculate --film 24 --adhesive 18 --length 65 --meters 1000 \
//!     --print-type natural --paste-type transparent --rate-card --company "Acme"
//! ```
//!
//! The database path comes from `--db` or `BOPP_PRICING_DB`. Set `RUST_LOG`
//! to see store activity.

use anyhow::{bail, Context, Result};
use bopp_pricing::engine::{CalculatorInputs, RateCard};
use bopp_pricing::identity::{Actor, Role};
use bopp_pricing::rates::history::HistoryItem;
use bopp_pricing::rates::key::RateKey;
use bopp_pricing::rates::snapshot::RateSnapshot;
use bopp_pricing::service::PricingService;
use bopp_pricing::store::SqliteRateStore;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bopp-pricing", version, about = "BOPP tape pricing and rate table management")]
struct Cli {
    /// Rate database file
    #[arg(long, global = true, env = "BOPP_PRICING_DB", default_value = "bopp_rates.db")]
    db: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// List current rates grouped by category
    Rates,
    /// Print the built-in default rate table
    Defaults,
    /// Merge new rate values into the table (admin only)
    Update {
        #[command(flatten)]
        actor: ActorArgs,
        /// Rate assignment, e.g. `profit=12`; repeatable
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment, required = true)]
        assignments: Vec<(RateKey, Decimal)>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Show recent rate changes, newest first (admin only)
    History {
        #[command(flatten)]
        actor: ActorArgs,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Price a tape against the current rates
    Calculate {
        /// BOPP film thickness in microns
        #[arg(long)]
        film: f64,
        /// Adhesive thickness in microns
        #[arg(long)]
        adhesive: f64,
        /// Tape length in metres
        #[arg(long)]
        length: f64,
        /// Total metres for the batch calculation
        #[arg(long)]
        meters: f64,
        #[arg(long)]
        print_type: String,
        #[arg(long)]
        paste_type: String,
        /// Also render the printable rate card
        #[arg(long)]
        rate_card: bool,
        #[arg(long)]
        company: Option<String>,
    },
}

#[derive(Args)]
struct ActorArgs {
    #[arg(long)]
    actor_id: String,
    #[arg(long)]
    actor_name: String,
    #[arg(long, default_value = "admin")]
    role: Role,
}

impl ActorArgs {
    fn actor(&self) -> Actor {
        Actor::new(&self.actor_id, &self.actor_name, self.role)
    }
}

fn parse_assignment(raw: &str) -> Result<(RateKey, Decimal), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty rate key in `{}`", raw));
    }
    let value: Decimal = value
        .trim()
        .parse()
        .map_err(|e| format!("invalid value for {}: {}", key, e))?;
    Ok((RateKey::new(key), value))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rate_table(rates: &RateSnapshot) {
    for (group, members) in rates.grouped() {
        let title = group.map(|g| g.title()).unwrap_or("Other Rates");
        println!("{}", title);
        for rate in members {
            println!("  {:<28} {:>12}", rate.key.display_name(), rate.value);
        }
        println!();
    }
}

fn print_history(items: &[HistoryItem]) {
    if items.is_empty() {
        println!("No rate history yet.");
        return;
    }
    for item in items {
        let entry = &item.entry;
        println!(
            "[{}] {} ({}) archived {}",
            entry.changed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            entry.changed_by_name,
            entry.changed_by_id,
            entry.id
        );
        println!("{}", item.diff);
    }
}

fn open_service(cli: &Cli) -> Result<PricingService<SqliteRateStore>> {
    let store = SqliteRateStore::open(&cli.db)
        .with_context(|| format!("opening rate database {}", cli.db.display()))?;
    Ok(PricingService::new(store))
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Defaults => {
            let defaults = RateSnapshot::defaults();
            match cli.format {
                Format::Json => print_json(&defaults)?,
                Format::Text => print_rate_table(&defaults),
            }
        }
        Command::Rates => {
            let rates = open_service(&cli)?.current_rates()?;
            match cli.format {
                Format::Json => print_json(&rates)?,
                Format::Text => print_rate_table(&rates),
            }
        }
        Command::Update {
            actor,
            assignments,
            dry_run,
        } => {
            let service = open_service(&cli)?;
            let proposed: RateSnapshot = assignments.iter().cloned().collect();
            let changes = service.preview_changes(&proposed)?;

            if !*dry_run {
                service
                    .update_rates(&actor.actor(), &proposed)
                    .context("updating rates")?;
            }
            match cli.format {
                Format::Json => print_json(&changes)?,
                Format::Text => {
                    if changes.is_empty() {
                        println!("No changes.");
                    }
                    for change in &changes {
                        let old = change
                            .old_value
                            .map(|v| v.to_string())
                            .unwrap_or_else(|| "N/A".to_string());
                        println!(
                            "{:<28} {:>12} -> {:<12} {}",
                            change.key.display_name(),
                            old,
                            change.new_value,
                            change.change
                        );
                    }
                    if *dry_run {
                        println!("(dry run, nothing written)");
                    }
                }
            }
        }
        Command::History { actor, limit } => {
            let items = open_service(&cli)?
                .history(&actor.actor(), *limit)
                .context("reading rate history")?;
            match cli.format {
                Format::Json => print_json(&items)?,
                Format::Text => print_history(&items),
            }
        }
        Command::Calculate {
            film,
            adhesive,
            length,
            meters,
            print_type,
            paste_type,
            rate_card,
            company,
        } => {
            let inputs = CalculatorInputs {
                bopp_film_thickness: *film,
                adhesive_thickness: *adhesive,
                tape_length: *length,
                meters_for_coreless_calc: *meters,
                print_type: print_type.clone(),
                paste_type: paste_type.clone(),
            };
            let quote = open_service(&cli)?.calculate(&inputs)?;
            let card = rate_card.then(|| {
                RateCard::build(
                    &inputs,
                    &quote.result,
                    company.clone(),
                    chrono::Local::now().date_naive(),
                )
            });

            match cli.format {
                Format::Json => print_json(&serde_json::json!({
                    "result": quote.result,
                    "rateCard": card,
                }))?,
                Format::Text => {
                    let result = &quote.result;
                    println!("Print / Paste:   {} / {}", inputs.print_label(), inputs.paste_label());
                    println!("Cost per piece:  {:.2}", result.cost_per_piece);
                    println!("Total cost:      {:.2}", result.total_cost);
                    println!();
                    for (i, slot) in result.slots().iter().enumerate() {
                        match slot {
                            Some(v) => println!("  R{:<3} {:>18.4}", i + 1, v),
                            None => println!("  R{:<3} {:>18}", i + 1, "null"),
                        }
                    }
                    if let Some(card) = card {
                        println!();
                        print!("{}", card);
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
