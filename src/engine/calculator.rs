use crate::engine::inputs::CalculatorInputs;
use crate::engine::result::{round_cents, CalculationResult};
use crate::engine::validation::{validate, ResolvedRates, ValidationError};
use crate::rates::snapshot::RateSnapshot;
use serde::{Deserialize, Serialize};

/// Film weight per micron of film thickness.
const FILM_WEIGHT_PER_MICRON: f64 = 0.20925;
/// Density factor of the coated web.
const COATED_DENSITY: f64 = 0.94;
/// Coating width factor applied with the density.
const COATING_WIDTH: f64 = 225.0;
/// Adhesive solids content, percent.
const ADHESIVE_SOLIDS_PERCENT: f64 = 53.5;
/// Paste share of the adhesive weight; also the adhesive-less credit share.
const PASTE_FRACTION: f64 = 0.06;
/// Reference length in meters that batch prices are normalized to.
const REFERENCE_LENGTH: f64 = 65.0;
/// Pieces cut across a jumbo roll.
const JUMBO_WIDTH: f64 = 72.0;
/// Fixed per-box overhead added after profit.
const BOX_OVERHEAD: f64 = 20.0;
const JUMBO_DIAMETER_SMALL: f64 = 1315.0;
const JUMBO_DIAMETER_LARGE: f64 = 1610.0;
const JUMBO_WEIGHT_PER_MICRON: f64 = 4.873;
const JUMBO_LENGTH_WEIGHT_PER_MICRON: f64 = 0.2668;
const BATCH_OFFSET: f64 = -2.38;
const CORE_RATIO: f64 = 20.0 / 10.5;

/// Intermediate quantities shared by every derived slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialBreakdown {
    /// Film thickness plus adhesive thickness plus one micron of overhang.
    pub total_thickness: f64,
    pub film_weight: f64,
    pub adhesive_weight: f64,
    pub paste_weight: f64,
    /// Material cost of one reference length before packing and profit.
    pub material_cost: f64,
}

impl MaterialBreakdown {
    pub fn new(bopp_film_thickness: f64, adhesive_thickness: f64, rates: &ResolvedRates) -> Self {
        let adhesive_overhang = adhesive_thickness + 1.0;
        let total_thickness = bopp_film_thickness + adhesive_overhang;

        let film_weight = FILM_WEIGHT_PER_MICRON * bopp_film_thickness;
        let adhesive_weight = (((total_thickness * COATED_DENSITY * COATING_WIDTH) / 1000.0)
            - film_weight)
            / ADHESIVE_SOLIDS_PERCENT
            * 100.0;
        let paste_weight = adhesive_weight * PASTE_FRACTION;

        let material_cost = (film_weight * rates.bopp_film)
            + (adhesive_weight * rates.adhesive)
            + rates.print_surcharge
            + rates.coating_expense
            - (adhesive_weight * PASTE_FRACTION * rates.adhesive_less)
            + (paste_weight * rates.paste_surcharge);

        Self {
            total_thickness,
            film_weight,
            adhesive_weight,
            paste_weight,
            material_cost,
        }
    }

    /// Price of one box of pieces of `length` meters, after packing,
    /// profit and the fixed overhead.
    fn box_price(&self, length: f64, rates: &ResolvedRates) -> f64 {
        let profit_fraction = rates.profit / 100.0;
        ((self.material_cost / REFERENCE_LENGTH) * length + rates.packing_cost) / JUMBO_WIDTH
            * (1.0 + profit_fraction)
            * JUMBO_WIDTH
            + BOX_OVERHEAD
    }
}

/// The BOPP tape cost calculator.
///
/// Stateless: every call receives the full rate snapshot, performs no I/O,
/// and returns the same result for the same arguments.
pub struct BoppCalculator;

impl BoppCalculator {
    /// Validate `inputs` against `rates` and run the formula pipeline.
    ///
    /// # Examples
    ///
    /// ```
    /// use bopp_pricing::engine::{BoppCalculator, CalculatorInputs};
    /// use bopp_pricing::rates::key::{PasteType, PrintType};
    /// use bopp_pricing::rates::snapshot::RateSnapshot;
    ///
    /// let inputs = CalculatorInputs::new(
    ///     24.0, 18.0, 65.0, 1000.0,
    ///     PrintType::Natural,
    ///     PasteType::Transparent,
    /// );
    /// let result = BoppCalculator::calculate(&inputs, &RateSnapshot::defaults()).unwrap();
    /// assert_eq!(result.cost_per_piece, 1693.27);
    /// assert_eq!(result.r5, None);
    /// ```
    pub fn calculate(
        inputs: &CalculatorInputs,
        rates: &RateSnapshot,
    ) -> Result<CalculationResult, ValidationError> {
        let resolved = validate(inputs, rates)?;
        Ok(Self::price(inputs, &resolved))
    }

    /// Run the pipeline on already-validated rates.
    pub fn price(inputs: &CalculatorInputs, rates: &ResolvedRates) -> CalculationResult {
        let tape_length = inputs.tape_length;
        let batch_meters = inputs.meters_for_coreless_calc;

        let material =
            MaterialBreakdown::new(inputs.bopp_film_thickness, inputs.adhesive_thickness, rates);
        let x = material.total_thickness;

        let r2 = material.box_price(tape_length, rates);
        let r45 = material.box_price(REFERENCE_LENGTH, rates);

        let r1 = x - 1.0;
        let r3 = JUMBO_DIAMETER_SMALL;
        let r4 = (material.material_cost
            / ((material.adhesive_weight * 0.54) + material.film_weight))
            * 1.05;
        let r6 = r4 + 5.0;

        let r7 = x * JUMBO_WEIGHT_PER_MICRON;
        let r8 = r7 / JUMBO_DIAMETER_SMALL * JUMBO_DIAMETER_LARGE;
        let r9 = x * JUMBO_LENGTH_WEIGHT_PER_MICRON;

        let r11 = (x * 0.00027115 * tape_length) + (tape_length / 6500.0) + 0.16;
        let r12 = r11 * 12.0 + 0.75;
        let r13 = (r7 * r4) / 5260.0;
        let r14 = r11 / 6.0;

        // Piece prices by width, relative to the 48 mm price R18.
        let r16 = r2 / 144.0;
        let r15 = r16 / 2.0;
        let r17 = r2 / 96.0;
        let r18 = r2 / JUMBO_WIDTH;
        let r20 = r18 * 1.5;
        let r19 = r2 / JUMBO_WIDTH / 48.0 * 60.0;
        let r21 = r18 * 2.0;

        let r34 = JUMBO_WIDTH;
        let r35 = tape_length;
        let r36 = batch_meters;
        let r37 = r36 / REFERENCE_LENGTH;
        let r38 = BATCH_OFFSET;
        let r39 = r37 + r38;
        let r40 = CORE_RATIO;

        // Batch pricing always starts from the 65 m reference price R45.
        let r46 = r45 / r34 / REFERENCE_LENGTH * r36;
        let r47 = r39 - r40;
        let r48 = r46 - r47;

        let r22 = r48 * 3.0;
        let r23 = r48;
        let r27 = r48 * 0.375;
        let r25 = r27 * 2.0;
        let r24 = r23 * 1.5;
        let r28 = r48 / 48.0 * 20.0;
        let r26 = r28 * 3.0;
        let r49 = r48 * 3.0;

        let pieces = if batch_meters > 0.0 && tape_length > 0.0 {
            batch_meters / tape_length
        } else {
            0.0
        };
        let total_cost = r2 * pieces;

        CalculationResult {
            cost_per_piece: round_cents(r2),
            total_cost: round_cents(total_cost),
            bopp_tape_mtrs: tape_length,
            r1,
            r2,
            r3,
            r4,
            r5: None,
            r6,
            r7,
            r8,
            r9,
            r10: None,
            r11,
            r12,
            r13,
            r14,
            r15,
            r16,
            r17,
            r18,
            r19,
            r20,
            r21,
            r22,
            r23,
            r24,
            r25,
            r26,
            r27,
            r28,
            r29: None,
            r30: None,
            r31: None,
            r32: None,
            r33: None,
            r34,
            r35,
            r36,
            r37,
            r38,
            r39,
            r40,
            r41: None,
            r42: None,
            r43: None,
            r44: None,
            r45,
            r46,
            r47,
            r48,
            r49,
        }
    }
}

/// Shorthand for [`BoppCalculator::calculate`].
pub fn calculate(
    inputs: &CalculatorInputs,
    rates: &RateSnapshot,
) -> Result<CalculationResult, ValidationError> {
    BoppCalculator::calculate(inputs, rates)
}
