use crate::rates::key::{PasteType, PrintType};
use serde::{Deserialize, Serialize};

/// User-supplied physical inputs for one calculation.
///
/// Selectors are carried as the raw strings the presentation layer sends;
/// validation resolves them into [`PrintType`] and [`PasteType`] so that an
/// unknown selector is reported rather than rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorInputs {
    /// Film thickness in microns.
    pub bopp_film_thickness: f64,
    /// Adhesive coat thickness in microns.
    pub adhesive_thickness: f64,
    /// Length of one finished tape piece in meters.
    pub tape_length: f64,
    /// Batch quantity in meters driving the width-scaled batch prices.
    pub meters_for_coreless_calc: f64,
    pub print_type: String,
    pub paste_type: String,
}

impl CalculatorInputs {
    pub fn new(
        bopp_film_thickness: f64,
        adhesive_thickness: f64,
        tape_length: f64,
        meters_for_coreless_calc: f64,
        print_type: PrintType,
        paste_type: PasteType,
    ) -> Self {
        Self {
            bopp_film_thickness,
            adhesive_thickness,
            tape_length,
            meters_for_coreless_calc,
            print_type: print_type.rate_key().to_string(),
            paste_type: paste_type.rate_key().to_string(),
        }
    }

    /// Display label for the print selector, falling back to the raw value.
    pub fn print_label(&self) -> String {
        self.print_type
            .parse::<PrintType>()
            .map(|p| p.label().to_string())
            .unwrap_or_else(|_| self.print_type.clone())
    }

    /// Display label for the paste selector, falling back to the raw value.
    pub fn paste_label(&self) -> String {
        self.paste_type
            .parse::<PasteType>()
            .map(|p| p.label().to_string())
            .unwrap_or_else(|_| self.paste_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_camel_case() {
        let json = r#"{
            "boppFilmThickness": 24,
            "adhesiveThickness": 18,
            "tapeLength": 65,
            "metersForCorelessCalc": 1000,
            "printType": "natural",
            "pasteType": "transparent"
        }"#;
        let inputs: CalculatorInputs = serde_json::from_str(json).unwrap();
        assert_eq!(
            inputs,
            CalculatorInputs::new(24.0, 18.0, 65.0, 1000.0, PrintType::Natural, PasteType::Transparent)
        );
    }

    #[test]
    fn test_labels() {
        let mut inputs =
            CalculatorInputs::new(24.0, 18.0, 65.0, 1000.0, PrintType::FullPrint, PasteType::MilkyWhite);
        assert_eq!(inputs.print_label(), "Full Print");
        assert_eq!(inputs.paste_label(), "Milky White Tape");

        inputs.print_type = "neon".to_string();
        assert_eq!(inputs.print_label(), "neon");
    }
}
