//! Pricing a tape and changing a rate.
//!
//! Prices a natural transparent tape against the seeded rate table, raises
//! the profit rate as an admin, prices it again and shows the history diff.

use bopp_pricing::prelude::*;
use chrono::Local;
use rust_decimal_macros::dec;

fn main() {
    println!("╔════════════════════════════════════════╗");
    println!("║  bopp-pricing: Price a Tape Example    ║");
    println!("╚════════════════════════════════════════╝\n");

    let store = SqliteRateStore::in_memory().expect("in-memory database");
    let service = PricingService::new(store);
    let alice = Actor::admin("u1", "Alice");

    let inputs = CalculatorInputs::new(24.0, 18.0, 65.0, 1000.0, PrintType::Natural, PasteType::Transparent);

    // --- Scenario 1: Seeded rates ---
    println!("━━━ Scenario 1: Default Rates ━━━\n");

    let quote = service.calculate(&inputs).expect("valid inputs");
    println!("Cost per piece:  {:.2}", quote.result.cost_per_piece);
    println!("Total (1000 m):  {:.2}", quote.result.total_cost);
    println!();

    let card = RateCard::build(
        &inputs,
        &quote.result,
        Some("Acme Packaging".to_string()),
        Local::now().date_naive(),
    );
    println!("{}", card);

    // --- Scenario 2: Profit raised to 12% ---
    println!("━━━ Scenario 2: Profit 10 → 12 ━━━\n");

    let revision: RateSnapshot = [("profit", dec!(12))].into_iter().collect();
    for change in service.preview_changes(&revision).expect("rates readable") {
        println!(
            "Pending: {} {} → {} ({})",
            change.key.display_name(),
            change.old_value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".into()),
            change.new_value,
            change.change
        );
    }
    service.update_rates(&alice, &revision).expect("admin may update");

    let repriced = service.calculate(&inputs).expect("valid inputs");
    println!("Cost per piece:  {:.2}", repriced.result.cost_per_piece);
    println!("Total (1000 m):  {:.2}", repriced.result.total_cost);
    println!();

    // --- Scenario 3: What changed ---
    println!("━━━ Scenario 3: Rate Change ━━━\n");

    let history = service.history(&alice, 1).expect("admin may read history");
    let archived = &history[0].entry;
    println!(
        "Archived by {} at {}",
        archived.changed_by_name,
        archived.changed_at.format("%Y-%m-%d %H:%M:%S")
    );
    print!("{}", diff_snapshots(Some(&archived.rates_snapshot), &repriced.rates));

    // --- Scenario 4: Employee attempts a write ---
    println!("\n━━━ Scenario 4: Employee Write ━━━\n");

    let bob = Actor::employee("u2", "Bob");
    match service.update_rates(&bob, &revision) {
        Ok(()) => println!("Unexpectedly allowed"),
        Err(e) => println!("Rejected: {}", e),
    }
}
