use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of a named pricing rate (e.g. `"bopp_film_rate"`).
///
/// Keys are the unit of storage, diffing and lookup. The set used by the
/// calculator is fixed, but the store accepts and round-trips any key.
///
/// # Examples
///
/// ```
/// use bopp_pricing::rates::key::RateKey;
///
/// let film = RateKey::new("bopp_film_rate");
/// assert_eq!(film.display_name(), "bopp film rate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateKey(String);

impl RateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable form used in listings: underscores become spaces.
    pub fn display_name(&self) -> String {
        self.0.replace('_', " ")
    }
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RateKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RateKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<PrintType> for RateKey {
    fn from(p: PrintType) -> Self {
        Self::new(p.rate_key())
    }
}

impl From<PasteType> for RateKey {
    fn from(p: PasteType) -> Self {
        Self::new(p.rate_key())
    }
}

pub const ADHESIVE_RATE: &str = "adhesive_rate";
pub const BOPP_FILM_RATE: &str = "bopp_film_rate";
pub const PACKING_COST: &str = "packing_cost";
pub const COATING_EXP: &str = "coating_exp";
pub const PROFIT: &str = "profit";
pub const ADHESIVE_LESS_RATE: &str = "adhesive_less_rate";

/// The 19 rates seeded into an empty store, as `(key, value)`.
///
/// The last three paste keys are never read by the calculator but are
/// part of the seeded table and must survive every update.
pub const DEFAULT_RATE_TABLE: [(&str, i64); 19] = [
    (ADHESIVE_LESS_RATE, 80),
    (ADHESIVE_RATE, 90),
    (BOPP_FILM_RATE, 118),
    ("brown_tape", 105),
    (COATING_EXP, 60),
    ("color_tape", 250),
    ("double_colour_printed", 225),
    ("four_colour_printed", 350),
    ("full_print", 1000),
    ("milky_white", 160),
    ("natural", 0),
    (PACKING_COST, 220),
    (PROFIT, 10),
    ("single_colour_printed", 150),
    ("three_colour_printed", 300),
    ("transparent", 0),
    ("normal_paste_rate", 0),
    ("waterproof_paste_rate", 15),
    ("super_strong_paste_rate", 30),
];

/// A selector string did not name a known print or paste type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownSelector {
    pub kind: &'static str,
    pub value: String,
}

/// Print finish of the tape; selects a print-surcharge rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintType {
    Natural,
    SingleColourPrinted,
    DoubleColourPrinted,
    ThreeColourPrinted,
    FourColourPrinted,
    FullPrint,
}

impl PrintType {
    pub const ALL: [PrintType; 6] = [
        PrintType::Natural,
        PrintType::SingleColourPrinted,
        PrintType::DoubleColourPrinted,
        PrintType::ThreeColourPrinted,
        PrintType::FourColourPrinted,
        PrintType::FullPrint,
    ];

    pub fn rate_key(self) -> &'static str {
        match self {
            PrintType::Natural => "natural",
            PrintType::SingleColourPrinted => "single_colour_printed",
            PrintType::DoubleColourPrinted => "double_colour_printed",
            PrintType::ThreeColourPrinted => "three_colour_printed",
            PrintType::FourColourPrinted => "four_colour_printed",
            PrintType::FullPrint => "full_print",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrintType::Natural => "Natural",
            PrintType::SingleColourPrinted => "Single Colour Printed",
            PrintType::DoubleColourPrinted => "Double Colour Printed",
            PrintType::ThreeColourPrinted => "Three Colour Printed",
            PrintType::FourColourPrinted => "Four Colour Printed",
            PrintType::FullPrint => "Full Print",
        }
    }
}

impl FromStr for PrintType {
    type Err = UnknownSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.rate_key() == s)
            .ok_or_else(|| UnknownSelector {
                kind: "Print Type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PrintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rate_key())
    }
}

/// Adhesive paste / tape colour; selects a paste-surcharge rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteType {
    Transparent,
    MilkyWhite,
    BrownTape,
    ColorTape,
}

impl PasteType {
    pub const ALL: [PasteType; 4] = [
        PasteType::Transparent,
        PasteType::MilkyWhite,
        PasteType::BrownTape,
        PasteType::ColorTape,
    ];

    pub fn rate_key(self) -> &'static str {
        match self {
            PasteType::Transparent => "transparent",
            PasteType::MilkyWhite => "milky_white",
            PasteType::BrownTape => "brown_tape",
            PasteType::ColorTape => "color_tape",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PasteType::Transparent => "Transparent Tape",
            PasteType::MilkyWhite => "Milky White Tape",
            PasteType::BrownTape => "Brown Tape",
            PasteType::ColorTape => "Color Tape",
        }
    }
}

impl FromStr for PasteType {
    type Err = UnknownSelector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.rate_key() == s)
            .ok_or_else(|| UnknownSelector {
                kind: "Paste Type",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rate_key())
    }
}

/// Semantic grouping of the rate table, in the order an editor presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateGroup {
    PrintSurcharge,
    PasteSurcharge,
    BaseMaterial,
    ProcessOverhead,
}

impl RateGroup {
    pub const ALL: [RateGroup; 4] = [
        RateGroup::PrintSurcharge,
        RateGroup::PasteSurcharge,
        RateGroup::BaseMaterial,
        RateGroup::ProcessOverhead,
    ];

    pub fn title(self) -> &'static str {
        match self {
            RateGroup::PrintSurcharge => "Print Type Rates",
            RateGroup::PasteSurcharge => "Tape/Paste Type Rates",
            RateGroup::BaseMaterial => "Base Material Rates",
            RateGroup::ProcessOverhead => "Process & Overhead Rates",
        }
    }

    pub fn keys(self) -> Vec<&'static str> {
        match self {
            RateGroup::PrintSurcharge => PrintType::ALL.iter().map(|p| p.rate_key()).collect(),
            RateGroup::PasteSurcharge => PasteType::ALL.iter().map(|p| p.rate_key()).collect(),
            RateGroup::BaseMaterial => vec![BOPP_FILM_RATE, ADHESIVE_RATE],
            RateGroup::ProcessOverhead => {
                vec![ADHESIVE_LESS_RATE, COATING_EXP, PACKING_COST, PROFIT]
            }
        }
    }

    /// Group a key belongs to, or `None` for keys outside the four groups.
    pub fn of(key: &RateKey) -> Option<RateGroup> {
        Self::ALL
            .into_iter()
            .find(|group| group.keys().contains(&key.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_type_round_trips_through_rate_key() {
        for print in PrintType::ALL {
            assert_eq!(print.rate_key().parse::<PrintType>().unwrap(), print);
        }
        assert_eq!(
            "full_print".parse::<PrintType>().unwrap(),
            PrintType::FullPrint
        );
    }

    #[test]
    fn test_key_from_owned_string() {
        let key: RateKey = String::from("coating_exp").into();
        assert_eq!(key, RateKey::from("coating_exp"));
    }

    #[test]
    fn test_unknown_paste_type() {
        let err = "glitter".parse::<PasteType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown Paste Type: glitter");
    }

    #[test]
    fn test_groups_cover_sixteen_keys() {
        let grouped: usize = RateGroup::ALL.iter().map(|g| g.keys().len()).sum();
        assert_eq!(grouped, 16);
        assert_eq!(
            RateGroup::of(&RateKey::new("profit")),
            Some(RateGroup::ProcessOverhead)
        );
        assert_eq!(RateGroup::of(&RateKey::new("waterproof_paste_rate")), None);
    }

    #[test]
    fn test_default_table_keys_are_unique() {
        let mut keys: Vec<&str> = DEFAULT_RATE_TABLE.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 19);
    }
}
