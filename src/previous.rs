//! Historical "previous attempt" data and merging it into live sets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::EditorError;
use crate::model::{Exercise, ExerciseId, SetKey, SetValues, WeightUnit};
use crate::resistance::convert_weight;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviousSet {
    pub weight: Option<f32>,
    pub reps: Option<u32>,
}

/// Read-only snapshot of the most recent performance of a named exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousAttempt {
    pub exercise_name: String,
    #[serde(default)]
    pub performed_on: Option<NaiveDate>,
    pub unit: WeightUnit,
    pub sets: BTreeMap<SetKey, PreviousSet>,
}

impl PreviousAttempt {
    pub fn get(&self, key: &SetKey) -> Option<&PreviousSet> {
        self.sets.get(key)
    }

    /// Weight of `key` expressed in `unit`.
    pub fn weight_in(&self, key: &SetKey, unit: WeightUnit) -> Option<f32> {
        self.get(key)?
            .weight
            .map(|w| convert_weight(w, self.unit, unit))
    }
}

/// Handle for an outstanding previous-attempt fetch.
///
/// The result may only be applied while the exercise still exists and no
/// newer fetch has been requested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub exercise_id: ExerciseId,
    pub exercise_name: String,
    pub(crate) generation: u64,
}

fn copy_into(values: &mut SetValues, prev: &PreviousSet, from: WeightUnit, to: WeightUnit) {
    // absent fields leave the live value alone
    if let Some(w) = prev.weight {
        values.weight = Some(convert_weight(w, from, to));
    }
    if let Some(r) = prev.reps {
        values.reps = Some(r);
    }
}

/// Copy the previous entry for the set at `set_index` into the live set.
///
/// Returns `Ok(false)` without touching anything when the attempt has no
/// entry for that set's key. The attempt itself is never modified.
pub fn merge_previous_into(
    exercise: &mut Exercise,
    set_index: usize,
    previous: &PreviousAttempt,
) -> Result<bool, EditorError> {
    let unit = exercise.weight_unit;
    let set = exercise.set_at_mut(set_index)?;
    let Some(prev) = previous.get(&set.key) else {
        return Ok(false);
    };
    copy_into(&mut set.values, prev, previous.unit, unit);
    Ok(true)
}

/// Prefill every set and drop-set the user has not typed into yet.
pub(crate) fn prefill_untouched(exercise: &mut Exercise, previous: &PreviousAttempt) -> usize {
    let unit = exercise.weight_unit;
    let mut filled = 0;
    for set in &mut exercise.sets {
        let entries = std::iter::once((set.key, &mut set.values))
            .chain(set.drop_sets.iter_mut().map(|d| (d.key, &mut d.values)));
        for (key, values) in entries {
            if values.touched {
                continue;
            }
            if let Some(prev) = previous.get(&key) {
                copy_into(values, prev, previous.unit, unit);
                filled += 1;
            }
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SetEdit, WorkoutSet};
    use crate::presets::ExercisePreset;

    fn attempt(unit: WeightUnit) -> PreviousAttempt {
        let mut sets = BTreeMap::new();
        sets.insert(
            SetKey::set(1),
            PreviousSet {
                weight: Some(50.0),
                reps: Some(8),
            },
        );
        sets.insert(
            SetKey::drop_set(1, 1),
            PreviousSet {
                weight: Some(30.0),
                reps: Some(10),
            },
        );
        PreviousAttempt {
            exercise_name: "Bench Press (Barbell)".into(),
            performed_on: NaiveDate::from_ymd_opt(2024, 5, 1),
            unit,
            sets,
        }
    }

    #[test]
    fn merge_converts_kilograms_to_pounds() {
        let mut ex = Exercise::new("Bench", WeightUnit::Lbs, ExercisePreset::default());
        let prev = attempt(WeightUnit::Kg);
        let before = prev.clone();

        assert!(merge_previous_into(&mut ex, 0, &prev).unwrap());
        let w = ex.sets[0].values.weight.unwrap();
        assert!((w - 110.231).abs() < 1e-2);
        assert_eq!(ex.sets[0].values.reps, Some(8));
        assert_eq!(prev, before);
    }

    #[test]
    fn merge_keeps_fields_missing_from_history() {
        let mut ex = Exercise::new("Pull Up", WeightUnit::Kg, ExercisePreset::default());
        ex.sets[0].values.apply(SetEdit::Weight(Some(10.0)));
        let mut sets = BTreeMap::new();
        sets.insert(
            SetKey::set(1),
            PreviousSet {
                weight: None,
                reps: Some(6),
            },
        );
        let prev = PreviousAttempt {
            exercise_name: "Pull Up".into(),
            performed_on: None,
            unit: WeightUnit::Kg,
            sets,
        };

        assert!(merge_previous_into(&mut ex, 0, &prev).unwrap());
        assert_eq!(ex.sets[0].values.weight, Some(10.0));
        assert_eq!(ex.sets[0].values.reps, Some(6));
    }

    #[test]
    fn merge_without_previous_entry_is_noop() {
        let mut ex = Exercise::new("Bench", WeightUnit::Kg, ExercisePreset::default());
        ex.sets.push(WorkoutSet::new(SetKey::set(2)));
        ex.sets[1].values.apply(SetEdit::Weight(Some(60.0)));

        assert!(!merge_previous_into(&mut ex, 1, &attempt(WeightUnit::Kg)).unwrap());
        assert_eq!(ex.sets[1].values.weight, Some(60.0));
    }

    #[test]
    fn merge_on_missing_set_is_an_error() {
        let mut ex = Exercise::new("Bench", WeightUnit::Kg, ExercisePreset::default());
        let err = merge_previous_into(&mut ex, 3, &attempt(WeightUnit::Kg)).unwrap_err();
        assert!(matches!(err, EditorError::InvalidIndex { index: 3, .. }));
    }

    #[test]
    fn prefill_skips_touched_entries() {
        let mut ex = Exercise::new("Bench", WeightUnit::Kg, ExercisePreset::default());
        ex.sets[0].drop_sets.push(crate::model::DropSet {
            key: SetKey::drop_set(1, 1),
            values: SetValues::default(),
        });
        ex.sets[0].values.apply(SetEdit::Reps(Some(3)));

        let filled = prefill_untouched(&mut ex, &attempt(WeightUnit::Kg));
        assert_eq!(filled, 1);
        assert_eq!(ex.sets[0].values.reps, Some(3));
        assert_eq!(ex.sets[0].values.weight, None);
        assert_eq!(ex.sets[0].drop_sets[0].values.weight, Some(30.0));
    }

    #[test]
    fn attempt_decodes_flat_keys() {
        let json = r#"{
            "exerciseName": "Squat (Barbell)",
            "unit": "kg",
            "sets": {"set1": {"weight": 100.0, "reps": 5}, "set1_dropset1": {"weight": 80.0, "reps": null}}
        }"#;
        let prev: PreviousAttempt = serde_json::from_str(json).unwrap();
        assert_eq!(prev.performed_on, None);
        assert_eq!(prev.weight_in(&SetKey::drop_set(1, 1), WeightUnit::Kg), Some(80.0));
    }
}
