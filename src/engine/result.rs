use serde::{Deserialize, Serialize};

/// Number of `R` slots in a calculation result.
pub const SLOT_COUNT: usize = 49;

/// Slots that are reserved and always `null`.
pub const RESERVED_SLOTS: [usize; 11] = [5, 10, 29, 30, 31, 32, 33, 41, 42, 43, 44];

/// Full output of one calculation.
///
/// Serialized under the slot names downstream consumers index by (`R1` to
/// `R49`, `totalCost`, `costPerPiece`, `bopp_tape_mtrs`). Reserved slots are
/// always present and always `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    /// `R2` rounded to two decimals.
    #[serde(rename = "costPerPiece")]
    pub cost_per_piece: f64,
    /// `R2` scaled to the batch quantity, rounded to two decimals.
    #[serde(rename = "totalCost")]
    pub total_cost: f64,
    /// Echo of the tape length input.
    pub bopp_tape_mtrs: f64,

    /// Microns: film plus adhesive thickness.
    #[serde(rename = "R1")]
    pub r1: f64,
    /// Price per box at the requested tape length.
    #[serde(rename = "R2")]
    pub r2: f64,
    /// Reference jumbo roll diameter (mm).
    #[serde(rename = "R3")]
    pub r3: f64,
    /// Jumbo rate per kg of coated film.
    #[serde(rename = "R4")]
    pub r4: f64,
    #[serde(rename = "R5")]
    pub r5: Option<f64>,
    /// 288 mm rate.
    #[serde(rename = "R6")]
    pub r6: f64,
    /// Jumbo roll weight at 1315 mm.
    #[serde(rename = "R7")]
    pub r7: f64,
    /// Jumbo roll weight at 1610 mm.
    #[serde(rename = "R8")]
    pub r8: f64,
    #[serde(rename = "R9")]
    pub r9: f64,
    #[serde(rename = "R10")]
    pub r10: Option<f64>,
    /// Scale weight.
    #[serde(rename = "R11")]
    pub r11: f64,
    /// Box weight.
    #[serde(rename = "R12")]
    pub r12: f64,
    /// Square meter rate.
    #[serde(rename = "R13")]
    pub r13: f64,
    /// Per piece weight at 48 mm.
    #[serde(rename = "R14")]
    pub r14: f64,
    /// Piece price, 12 mm.
    #[serde(rename = "R15")]
    pub r15: f64,
    /// Piece price, 24 mm.
    #[serde(rename = "R16")]
    pub r16: f64,
    /// Piece price, 36 mm.
    #[serde(rename = "R17")]
    pub r17: f64,
    /// Piece price, 48 mm.
    #[serde(rename = "R18")]
    pub r18: f64,
    /// Piece price, 60 mm.
    #[serde(rename = "R19")]
    pub r19: f64,
    /// Piece price, 72 mm.
    #[serde(rename = "R20")]
    pub r20: f64,
    /// Piece price, 96 mm.
    #[serde(rename = "R21")]
    pub r21: f64,
    #[serde(rename = "R22")]
    pub r22: f64,
    /// Batch price, 48 mm.
    #[serde(rename = "R23")]
    pub r23: f64,
    /// Batch price, 72 mm.
    #[serde(rename = "R24")]
    pub r24: f64,
    /// Batch price, 36 mm.
    #[serde(rename = "R25")]
    pub r25: f64,
    /// Batch price, 60 mm.
    #[serde(rename = "R26")]
    pub r26: f64,
    /// Batch price, 18 mm.
    #[serde(rename = "R27")]
    pub r27: f64,
    /// Batch price, 20 mm.
    #[serde(rename = "R28")]
    pub r28: f64,
    #[serde(rename = "R29")]
    pub r29: Option<f64>,
    #[serde(rename = "R30")]
    pub r30: Option<f64>,
    #[serde(rename = "R31")]
    pub r31: Option<f64>,
    #[serde(rename = "R32")]
    pub r32: Option<f64>,
    #[serde(rename = "R33")]
    pub r33: Option<f64>,
    /// Jumbo width divisor.
    #[serde(rename = "R34")]
    pub r34: f64,
    /// Tape length.
    #[serde(rename = "R35")]
    pub r35: f64,
    /// Batch quantity in meters.
    #[serde(rename = "R36")]
    pub r36: f64,
    #[serde(rename = "R37")]
    pub r37: f64,
    #[serde(rename = "R38")]
    pub r38: f64,
    #[serde(rename = "R39")]
    pub r39: f64,
    #[serde(rename = "R40")]
    pub r40: f64,
    #[serde(rename = "R41")]
    pub r41: Option<f64>,
    #[serde(rename = "R42")]
    pub r42: Option<f64>,
    #[serde(rename = "R43")]
    pub r43: Option<f64>,
    #[serde(rename = "R44")]
    pub r44: Option<f64>,
    /// Price per box at the 65 m reference length.
    #[serde(rename = "R45")]
    pub r45: f64,
    /// Batch price derived from `R45`.
    #[serde(rename = "R46")]
    pub r46: f64,
    #[serde(rename = "R47")]
    pub r47: f64,
    /// Net batch price, base of the batch width prices.
    #[serde(rename = "R48")]
    pub r48: f64,
    #[serde(rename = "R49")]
    pub r49: f64,
}

impl CalculationResult {
    /// All slots in order, `slots()[0]` being `R1`.
    pub fn slots(&self) -> [Option<f64>; SLOT_COUNT] {
        [
            Some(self.r1),
            Some(self.r2),
            Some(self.r3),
            Some(self.r4),
            self.r5,
            Some(self.r6),
            Some(self.r7),
            Some(self.r8),
            Some(self.r9),
            self.r10,
            Some(self.r11),
            Some(self.r12),
            Some(self.r13),
            Some(self.r14),
            Some(self.r15),
            Some(self.r16),
            Some(self.r17),
            Some(self.r18),
            Some(self.r19),
            Some(self.r20),
            Some(self.r21),
            Some(self.r22),
            Some(self.r23),
            Some(self.r24),
            Some(self.r25),
            Some(self.r26),
            Some(self.r27),
            Some(self.r28),
            self.r29,
            self.r30,
            self.r31,
            self.r32,
            self.r33,
            Some(self.r34),
            Some(self.r35),
            Some(self.r36),
            Some(self.r37),
            Some(self.r38),
            Some(self.r39),
            Some(self.r40),
            self.r41,
            self.r42,
            self.r43,
            self.r44,
            Some(self.r45),
            Some(self.r46),
            Some(self.r47),
            Some(self.r48),
            Some(self.r49),
        ]
    }

    /// Value of slot `R{n}`.
    ///
    /// Returns `None` if `n` is outside `1..=49`, `Some(None)` for a
    /// reserved slot.
    pub fn slot(&self, n: usize) -> Option<Option<f64>> {
        if n == 0 || n > SLOT_COUNT {
            return None;
        }
        Some(self.slots()[n - 1])
    }
}

/// Round to two decimals for display and echo fields.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
