use crate::engine::inputs::CalculatorInputs;
use crate::rates::key::{
    PasteType, PrintType, ADHESIVE_LESS_RATE, ADHESIVE_RATE, BOPP_FILM_RATE, COATING_EXP,
    PACKING_COST, PROFIT,
};
use crate::rates::snapshot::RateSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calculator inputs or rate table failed validation.
///
/// Every problem found is listed, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Missing or invalid inputs/rates: {}.", .problems.join(", "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

impl ValidationError {
    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.problems.iter().any(|p| p.contains(needle))
    }
}

/// Every rate the formula pipeline reads, already resolved to floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRates {
    pub print_type: PrintType,
    pub paste_type: PasteType,
    pub print_surcharge: f64,
    pub paste_surcharge: f64,
    pub adhesive: f64,
    pub bopp_film: f64,
    pub packing_cost: f64,
    pub coating_expense: f64,
    /// Profit as a percentage, e.g. `10.0` for 10%.
    pub profit: f64,
    pub adhesive_less: f64,
}

fn is_positive(value: f64) -> bool {
    // NaN fails this comparison as well.
    value > 0.0
}

/// Check inputs and rate table, collecting every problem.
///
/// Problems are ordered: physical inputs, selectors, required scalar rates,
/// then the rates the selectors point at.
pub fn validate(
    inputs: &CalculatorInputs,
    rates: &RateSnapshot,
) -> Result<ResolvedRates, ValidationError> {
    let mut problems = Vec::new();

    if !is_positive(inputs.bopp_film_thickness) {
        problems.push("BOPP Film Thickness (must be > 0)".to_string());
    }
    if !is_positive(inputs.adhesive_thickness) {
        problems.push("Adhesive Thickness (must be > 0)".to_string());
    }
    if !is_positive(inputs.tape_length) {
        problems.push("Tape Length (must be > 0)".to_string());
    }
    if !is_positive(inputs.meters_for_coreless_calc) {
        problems.push("Total Meters (for Batch Calc) (must be > 0)".to_string());
    }

    let print_type = if inputs.print_type.is_empty() {
        problems.push("Print Type Selection".to_string());
        None
    } else {
        match inputs.print_type.parse::<PrintType>() {
            Ok(p) => Some(p),
            Err(e) => {
                problems.push(format!("Unknown Print Type: {}", e.value));
                None
            }
        }
    };
    let paste_type = if inputs.paste_type.is_empty() {
        problems.push("Paste Type Selection".to_string());
        None
    } else {
        match inputs.paste_type.parse::<PasteType>() {
            Ok(p) => Some(p),
            Err(e) => {
                problems.push(format!("Unknown Paste Type: {}", e.value));
                None
            }
        }
    };

    let mut required = |key: &str| {
        let value = rates.get_f64(key);
        if value.is_none() {
            problems.push(format!("DB Rate: {}", key));
        }
        value
    };
    let adhesive = required(ADHESIVE_RATE);
    let bopp_film = required(BOPP_FILM_RATE);
    let packing_cost = required(PACKING_COST);
    let coating_expense = required(COATING_EXP);
    let profit = required(PROFIT);

    let adhesive_less = rates.get_f64(ADHESIVE_LESS_RATE).filter(|v| *v >= 0.0);
    if adhesive_less.is_none() {
        problems.push(format!("DB Rate: {} (must be >= 0)", ADHESIVE_LESS_RATE));
    }

    let print_surcharge = print_type.and_then(|p| {
        let value = rates.get_f64(p.rate_key());
        if value.is_none() {
            problems.push(format!("DB Rate for Print Type: {}", p.rate_key()));
        }
        value
    });
    let paste_surcharge = paste_type.and_then(|p| {
        let value = rates.get_f64(p.rate_key());
        if value.is_none() {
            problems.push(format!("DB Rate for Paste Type: {}", p.rate_key()));
        }
        value
    });

    match (
        print_type,
        paste_type,
        print_surcharge,
        paste_surcharge,
        adhesive,
        bopp_film,
        packing_cost,
        coating_expense,
        profit,
        adhesive_less,
    ) {
        (
            Some(print_type),
            Some(paste_type),
            Some(print_surcharge),
            Some(paste_surcharge),
            Some(adhesive),
            Some(bopp_film),
            Some(packing_cost),
            Some(coating_expense),
            Some(profit),
            Some(adhesive_less),
        ) if problems.is_empty() => Ok(ResolvedRates {
            print_type,
            paste_type,
            print_surcharge,
            paste_surcharge,
            adhesive,
            bopp_film,
            packing_cost,
            coating_expense,
            profit,
            adhesive_less,
        }),
        _ => Err(ValidationError { problems }),
    }
}
