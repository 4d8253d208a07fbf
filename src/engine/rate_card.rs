//! Printable rate card built from a calculation result.

use crate::engine::inputs::CalculatorInputs;
use crate::engine::result::CalculationResult;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Piece-price slots by tape width in millimetres.
const PIECE_WIDTHS: [(u32, usize); 7] = [
    (12, 15),
    (24, 16),
    (36, 17),
    (48, 18),
    (60, 19),
    (72, 20),
    (96, 21),
];

/// Batch-price slots by tape width in millimetres.
const BATCH_WIDTHS: [(u32, usize); 4] = [(36, 25), (48, 23), (60, 26), (72, 24)];

/// Price of one tape width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthPrice {
    pub sr: usize,
    pub width_mm: u32,
    pub price: Option<f64>,
}

/// A labelled value on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLine {
    pub label: String,
    pub value: Option<f64>,
    pub decimals: usize,
}

impl CardLine {
    fn new(label: &str, value: Option<f64>, decimals: usize) -> Self {
        Self {
            label: label.to_string(),
            value,
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCard {
    pub company_name: Option<String>,
    pub date: NaiveDate,
    pub print_type: String,
    pub paste_type: String,
    pub microns: f64,
    pub tape_length: f64,
    pub batch_meters: f64,
    pub manufacturing: Vec<CardLine>,
    pub weights: Vec<CardLine>,
    pub piece_prices: Vec<WidthPrice>,
    pub batch_prices: Vec<WidthPrice>,
}

fn width_prices(result: &CalculationResult, widths: &[(u32, usize)]) -> Vec<WidthPrice> {
    widths
        .iter()
        .enumerate()
        .map(|(i, (width_mm, slot))| WidthPrice {
            sr: i + 1,
            width_mm: *width_mm,
            price: result.slot(*slot).flatten(),
        })
        .collect()
}

impl RateCard {
    pub fn build(
        inputs: &CalculatorInputs,
        result: &CalculationResult,
        company_name: Option<String>,
        date: NaiveDate,
    ) -> Self {
        let manufacturing = vec![
            CardLine::new("Microns", Some(result.r1), 2),
            CardLine::new("Of MIC", Some(result.r2), 2),
            CardLine::new("Jumbo Rate", Some(result.r4), 2),
            CardLine::new("288 MM Rate", Some(result.r6), 2),
            CardLine::new("Jumbo Wt 1315", Some(result.r7), 2),
            CardLine::new("Jumbo Wt 1610", Some(result.r8), 2),
        ];
        let weights = vec![
            CardLine::new("Scale Weight", Some(result.r11), 2),
            CardLine::new("Box Weight", Some(result.r12), 2),
            CardLine::new("Sq Mtrs Rate", Some(result.r13), 4),
            CardLine::new("Per Pcs Wt (48mm)", Some(result.r14), 4),
        ];

        Self {
            company_name,
            date,
            print_type: inputs.print_label(),
            paste_type: inputs.paste_label(),
            microns: result.r1,
            tape_length: result.bopp_tape_mtrs,
            batch_meters: result.r36,
            manufacturing,
            weights,
            piece_prices: width_prices(result, &PIECE_WIDTHS),
            batch_prices: width_prices(result, &BATCH_WIDTHS),
        }
    }
}

fn format_value(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "N/A".to_string(),
    }
}

impl fmt::Display for RateCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== BOPP Tape Rate Card ===")?;
        if let Some(company) = &self.company_name {
            writeln!(f, "Company: {}", company)?;
        }
        writeln!(f, "Date:    {}", self.date.format("%d/%m/%Y"))?;
        writeln!(f, "Print:   {}", self.print_type)?;
        writeln!(f, "Paste:   {}", self.paste_type)?;
        writeln!(
            f,
            "(Microns: {:.2}, Tape Length: {:.0} Mtrs)",
            self.microns, self.tape_length
        )?;

        writeln!(f, "\nSr  Size     Rate / Pc")?;
        for row in &self.piece_prices {
            writeln!(
                f,
                "{:<3} {:>2}MM  {:>12}",
                row.sr,
                row.width_mm,
                format_value(row.price, 2)
            )?;
        }

        writeln!(f, "\nPer {:.0} Meters", self.batch_meters)?;
        for row in &self.batch_prices {
            writeln!(
                f,
                "{:<3} {:>2}MM  {:>12}",
                row.sr,
                row.width_mm,
                format_value(row.price, 2)
            )?;
        }

        writeln!(f, "\nManufacturing")?;
        for line in self.manufacturing.iter().chain(&self.weights) {
            writeln!(
                f,
                "  {:<20} {:>12}",
                line.label,
                format_value(line.value, line.decimals)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::calculate;
    use crate::rates::key::{PasteType, PrintType};
    use crate::rates::snapshot::RateSnapshot;

    fn card() -> RateCard {
        let inputs =
            CalculatorInputs::new(24.0, 18.0, 65.0, 1000.0, PrintType::FullPrint, PasteType::BrownTape);
        let result = calculate(&inputs, &RateSnapshot::defaults()).unwrap();
        RateCard::build(
            &inputs,
            &result,
            Some("Acme Packaging".to_string()),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        )
    }

    #[test]
    fn test_widths_map_to_slots() {
        let card = card();
        assert_eq!(card.piece_prices.len(), 7);
        assert_eq!(card.piece_prices[3].width_mm, 48);
        assert_eq!(card.batch_prices[0].width_mm, 36);
        assert!(card.piece_prices.iter().all(|p| p.price.is_some()));

        // 96 mm is twice the 48 mm piece.
        let p48 = card.piece_prices[3].price.unwrap();
        let p96 = card.piece_prices[6].price.unwrap();
        assert!((p96 - 2.0 * p48).abs() < 1e-9);
    }

    #[test]
    fn test_render() {
        let text = card().to_string();
        assert!(text.contains("Company: Acme Packaging"));
        assert!(text.contains("Date:    01/03/2024"));
        assert!(text.contains("Print:   Full Print"));
        assert!(text.contains("Paste:   Brown Tape"));
        assert!(text.contains("Per 1000 Meters"));
        assert!(text.contains("96MM"));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(None, 2), "N/A");
        assert_eq!(format_value(Some(f64::NAN), 2), "N/A");
        assert_eq!(format_value(Some(5.95941), 4), "5.9594");
    }
}
