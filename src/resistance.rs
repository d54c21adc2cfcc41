use std::fmt;

use crate::model::{Exercise, WeightEncoding, WeightUnit};

/// Total resistance of a set, derived from the recorded number and the
/// exercise's weight encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalResistance {
    Weight { value: f32, unit: WeightUnit },
    Bodyweight,
    BodyweightPlus { extra: f32, unit: WeightUnit },
}

impl TotalResistance {
    /// Numeric load, if the resistance is not bodyweight based.
    pub fn weight(&self) -> Option<f32> {
        match self {
            TotalResistance::Weight { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// False when a non-numeric raw input turned into NaN or infinity.
    pub fn is_finite(&self) -> bool {
        match self {
            TotalResistance::Weight { value, .. } => value.is_finite(),
            TotalResistance::Bodyweight => true,
            TotalResistance::BodyweightPlus { extra, .. } => extra.is_finite(),
        }
    }
}

fn format_weight(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

impl fmt::Display for TotalResistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalResistance::Weight { value, unit } => {
                write!(f, "{} {}", format_weight(*value), unit)
            }
            TotalResistance::Bodyweight => f.write_str("BW"),
            TotalResistance::BodyweightPlus { extra, unit } => {
                write!(f, "BW + {} {}", format_weight(*extra), unit)
            }
        }
    }
}

/// Map a raw recorded weight to the total resistance for `exercise`.
///
/// The input is not validated: negative values pass through and NaN
/// propagates, so callers should clean user input first.
pub fn compute_total_resistance(exercise: &Exercise, raw: f32) -> TotalResistance {
    resistance_for(exercise.weight_encoding, raw, exercise.weight_unit)
}

pub fn resistance_for(encoding: WeightEncoding, raw: f32, unit: WeightUnit) -> TotalResistance {
    let weight = |value| TotalResistance::Weight { value, unit };
    match encoding {
        WeightEncoding::Direct => weight(raw),
        WeightEncoding::PerSidePlateOnly => weight(raw * 2.0),
        WeightEncoding::PerSidePlusBar => weight(raw * 2.0 + unit.bar_weight()),
        WeightEncoding::BodyweightOnly => TotalResistance::Bodyweight,
        WeightEncoding::BodyweightPlusExtra => TotalResistance::BodyweightPlus { extra: raw, unit },
    }
}

/// Convert a weight between unit systems.
pub fn convert_weight(value: f32, from: WeightUnit, to: WeightUnit) -> f32 {
    value * from.factor_to(to)
}
