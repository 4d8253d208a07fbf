use bopp_pricing::engine::result::RESERVED_SLOTS;
use bopp_pricing::engine::{calculate, CalculatorInputs};
use bopp_pricing::rates::history::{diff_snapshots, ChangeKind, SnapshotDiff};
use bopp_pricing::rates::key::{PasteType, PrintType, RateKey};
use bopp_pricing::rates::snapshot::RateSnapshot;
use bopp_pricing::store::{RateStore, SqliteRateStore};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Generate a plausible thickness in microns.
fn arb_thickness() -> impl Strategy<Value = f64> {
    1.0f64..120.0
}

fn arb_print_type() -> impl Strategy<Value = PrintType> {
    prop::sample::select(PrintType::ALL.to_vec())
}

fn arb_paste_type() -> impl Strategy<Value = PasteType> {
    prop::sample::select(PasteType::ALL.to_vec())
}

/// Generate valid calculator inputs.
fn arb_inputs() -> impl Strategy<Value = CalculatorInputs> {
    (
        arb_thickness(),
        arb_thickness(),
        1.0f64..1000.0,
        1.0f64..20_000.0,
        arb_print_type(),
        arb_paste_type(),
    )
        .prop_map(|(film, adhesive, length, meters, print, paste)| {
            CalculatorInputs::new(film, adhesive, length, meters, print, paste)
        })
}

/// Generate a non-negative rate with two decimal places.
fn arb_rate_value() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|n| Decimal::new(n, 2))
}

/// Keys drawn from a pool that overlaps the default table.
fn arb_key() -> impl Strategy<Value = RateKey> {
    prop::sample::select(vec![
        RateKey::new("profit"),
        RateKey::new("packing_cost"),
        RateKey::new("coating_exp"),
        RateKey::new("full_print"),
        RateKey::new("milky_white"),
        RateKey::new("lamination"),
        RateKey::new("core_charge"),
    ])
}

fn arb_snapshot() -> impl Strategy<Value = RateSnapshot> {
    prop::collection::btree_map(arb_key(), arb_rate_value(), 0..7)
        .prop_map(|rates| rates.into_iter().collect())
}

/// An input value that is either valid or not positive (including NaN).
fn arb_maybe_invalid() -> impl Strategy<Value = (f64, bool)> {
    prop_oneof![
        (1.0f64..100.0).prop_map(|v| (v, true)),
        (-100.0f64..=0.0).prop_map(|v| (v, false)),
        Just((f64::NAN, false)),
    ]
}

proptest! {
    // ===================================================================
    // Same inputs and rates always give bit-identical results.
    // ===================================================================
    #[test]
    fn calculation_is_deterministic(inputs in arb_inputs()) {
        let rates = RateSnapshot::defaults();
        let first = calculate(&inputs, &rates).unwrap();
        let second = calculate(&inputs, &rates).unwrap();

        let bits = |r: &bopp_pricing::engine::CalculationResult| -> Vec<Option<u64>> {
            r.slots().iter().map(|s| s.map(f64::to_bits)).collect()
        };
        prop_assert_eq!(bits(&first), bits(&second));
        prop_assert_eq!(first.total_cost.to_bits(), second.total_cost.to_bits());
        prop_assert_eq!(first.cost_per_piece.to_bits(), second.cost_per_piece.to_bits());
    }

    // ===================================================================
    // Reserved slots are present and null for every valid input.
    // ===================================================================
    #[test]
    fn reserved_slots_always_null(inputs in arb_inputs()) {
        let result = calculate(&inputs, &RateSnapshot::defaults()).unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for n in RESERVED_SLOTS {
            prop_assert_eq!(result.slot(n), Some(None));
            let key = format!("R{}", n);
            prop_assert!(json.get(&key).map(|v| v.is_null()).unwrap_or(false));
        }
    }

    // ===================================================================
    // Headline figures are the rounded piece price and its batch total.
    // ===================================================================
    #[test]
    fn headline_figures_follow_r2(inputs in arb_inputs()) {
        let result = calculate(&inputs, &RateSnapshot::defaults()).unwrap();
        let pieces = inputs.meters_for_coreless_calc / inputs.tape_length;

        prop_assert_eq!(result.cost_per_piece, (result.r2 * 100.0).round() / 100.0);
        prop_assert_eq!(result.total_cost, (result.r2 * pieces * 100.0).round() / 100.0);
        prop_assert_eq!(result.bopp_tape_mtrs, inputs.tape_length);
    }

    // ===================================================================
    // Every invalid numeric input is reported, never just the first.
    // ===================================================================
    #[test]
    fn validation_reports_every_bad_input(
        film in arb_maybe_invalid(),
        adhesive in arb_maybe_invalid(),
        length in arb_maybe_invalid(),
        meters in arb_maybe_invalid(),
    ) {
        let inputs = CalculatorInputs::new(
            film.0, adhesive.0, length.0, meters.0,
            PrintType::Natural, PasteType::Transparent,
        );
        let expected_bad = [film.1, adhesive.1, length.1, meters.1]
            .iter()
            .filter(|ok| !**ok)
            .count();

        match calculate(&inputs, &RateSnapshot::defaults()) {
            Ok(_) => prop_assert_eq!(expected_bad, 0),
            Err(err) => {
                let reported = err
                    .problems()
                    .iter()
                    .filter(|p| p.ends_with("(must be > 0)"))
                    .count();
                prop_assert_eq!(reported, expected_bad);
            }
        }
    }

    // ===================================================================
    // Merging overwrites or inserts revision keys and keeps the rest.
    // ===================================================================
    #[test]
    fn merge_is_key_by_key(base in arb_snapshot(), revision in arb_snapshot()) {
        let merged = base.merged_with(&revision);

        for (key, value) in revision.iter() {
            prop_assert_eq!(merged.get(key.as_str()), Some(*value));
        }
        for (key, value) in base.iter() {
            if !revision.contains(key.as_str()) {
                prop_assert_eq!(merged.get(key.as_str()), Some(*value));
            }
        }
        let union = base.keys().chain(revision.keys()).collect::<std::collections::BTreeSet<_>>();
        prop_assert_eq!(merged.len(), union.len());
    }

    // ===================================================================
    // A diff reports exactly the keys a revision actually changes.
    // ===================================================================
    #[test]
    fn diff_reports_only_real_changes(base in arb_snapshot(), revision in arb_snapshot()) {
        let after = base.merged_with(&revision);
        let diff = diff_snapshots(Some(&base), &after);

        let expected: Vec<&RateKey> = revision
            .iter()
            .filter(|(key, value)| base.get(key.as_str()) != Some(**value))
            .map(|(key, _)| key)
            .collect();
        let reported: Vec<&RateKey> = diff.differences().iter().map(|d| &d.key).collect();
        prop_assert_eq!(&reported, &expected);

        if expected.is_empty() {
            prop_assert_eq!(diff, SnapshotDiff::Unchanged);
        } else {
            for change in diff.differences() {
                let kind = match change.old_value {
                    None => ChangeKind::Added,
                    Some(old) if change.new_value > old => ChangeKind::Increased,
                    Some(_) => ChangeKind::Decreased,
                };
                prop_assert_eq!(change.change, kind);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // ===================================================================
    // A write archives exactly the table it overwrites.
    // ===================================================================
    #[test]
    fn update_archives_pre_image(first in arb_snapshot(), second in arb_snapshot()) {
        let store = SqliteRateStore::in_memory().unwrap();
        store.update_rates(&first, "u1", "Alice").unwrap();
        let s1 = store.current_rates().unwrap();

        store.update_rates(&second, "u2", "Bob").unwrap();

        let history = store.history(1).unwrap();
        prop_assert_eq!(&history[0].rates_snapshot, &s1);
        prop_assert_eq!(history[0].changed_by_id.as_str(), "u2");
        prop_assert_eq!(store.current_rates().unwrap(), s1.merged_with(&second));
    }
}
