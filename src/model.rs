//! Core data types of a workout template: exercises, their sets and drop-sets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EditorError;
use crate::presets::ExercisePreset;
use crate::previous::PreviousAttempt;

/// Opaque identifier of an exercise, unique within and across templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseId(Uuid);

impl ExerciseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExerciseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Lbs,
    Kg,
}

impl WeightUnit {
    /// Multiplier turning a value in `self` into the same mass in `to`.
    pub fn factor_to(self, to: WeightUnit) -> f32 {
        match (self, to) {
            (WeightUnit::Lbs, WeightUnit::Kg) => 0.453_592,
            (WeightUnit::Kg, WeightUnit::Lbs) => 2.204_62,
            _ => 1.0,
        }
    }

    /// Weight of a standard Olympic bar in this unit system.
    pub fn bar_weight(self) -> f32 {
        match self {
            WeightUnit::Lbs => 45.0,
            WeightUnit::Kg => 20.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            WeightUnit::Lbs => "lbs",
            WeightUnit::Kg => "kg",
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// How the number a user records for a set maps to total resistance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightEncoding {
    #[default]
    Direct,
    /// Plates loaded on one side, no bar.
    PerSidePlateOnly,
    /// Plates loaded on one side of a standard bar.
    PerSidePlusBar,
    BodyweightOnly,
    BodyweightPlusExtra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepsEncoding {
    #[default]
    Count,
    /// Reps hold seconds of an isometric hold.
    TimedHold,
    /// Reps hold seconds of a cardio interval.
    TimedCardio,
}

static KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^set(\d+)(?:_dropset(\d+))?$").expect("set key pattern is valid")
});

/// Identifier of a set within its exercise.
///
/// Stored documents use the flat forms `set3` and `set3_dropset2`; inside the
/// editor the hierarchy is carried by [`WorkoutSet::drop_sets`] and the key is
/// only an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SetKey {
    pub set: u32,
    pub drop: Option<u32>,
}

impl SetKey {
    pub fn set(set: u32) -> Self {
        Self { set, drop: None }
    }

    pub fn drop_set(set: u32, drop: u32) -> Self {
        Self {
            set,
            drop: Some(drop),
        }
    }

    pub fn is_drop_set(&self) -> bool {
        self.drop.is_some()
    }

    /// Key of the ordinary set this key belongs to.
    pub fn parent(&self) -> SetKey {
        SetKey::set(self.set)
    }
}

impl fmt::Display for SetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.drop {
            Some(d) => write!(f, "set{}_dropset{}", self.set, d),
            None => write!(f, "set{}", self.set),
        }
    }
}

impl FromStr for SetKey {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EditorError::InvalidSetKey(s.to_string());
        let caps = KEY_RE.captures(s).ok_or_else(invalid)?;
        let set = caps[1].parse().map_err(|_| invalid())?;
        let drop = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
            None => None,
        };
        Ok(SetKey { set, drop })
    }
}

impl TryFrom<String> for SetKey {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SetKey> for String {
    fn from(key: SetKey) -> Self {
        key.to_string()
    }
}

/// Values recorded for one set or drop-set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetValues {
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    pub completed: bool,
    /// Trained to failure. `false` covers both "not failed" and "not marked".
    pub failure: bool,
    /// Set once the user has typed a weight or rep count.
    pub touched: bool,
}

impl SetValues {
    /// Whether the entry carries anything worth persisting.
    pub fn has_data(&self) -> bool {
        self.weight.is_some() || self.reps.is_some() || self.failure
    }

    pub fn apply(&mut self, edit: SetEdit) {
        match edit {
            SetEdit::Weight(w) => {
                self.weight = w;
                self.touched = true;
            }
            SetEdit::Reps(r) => {
                self.reps = r;
                self.touched = true;
            }
            SetEdit::Completed(c) => self.completed = c,
            SetEdit::Failure(f) => self.failure = f,
        }
    }

    pub(crate) fn convert_weight(&mut self, from: WeightUnit, to: WeightUnit) {
        if let Some(w) = self.weight.as_mut() {
            *w *= from.factor_to(to);
        }
    }
}

/// A single user edit to a set or drop-set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetEdit {
    Weight(Option<f32>),
    Reps(Option<u32>),
    Completed(bool),
    Failure(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropSet {
    pub key: SetKey,
    pub values: SetValues,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutSet {
    pub key: SetKey,
    pub values: SetValues,
    pub drop_sets: Vec<DropSet>,
}

impl WorkoutSet {
    pub fn new(key: SetKey) -> Self {
        Self {
            key,
            values: SetValues::default(),
            drop_sets: Vec::new(),
        }
    }

    /// True if this set or any of its drop-sets has data.
    pub fn has_data(&self) -> bool {
        self.values.has_data() || self.drop_sets.iter().any(|d| d.values.has_data())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub weight_unit: WeightUnit,
    pub weight_encoding: WeightEncoding,
    pub reps_encoding: RepsEncoding,
    pub sets: Vec<WorkoutSet>,
    /// Next exercise of the superset chain, if any. Chains are singly linked
    /// lists; they never branch or loop.
    pub linked_superset_id: Option<ExerciseId>,
    /// Created as the target of a superset link.
    pub is_superset_member: bool,
    /// Latest historical attempt, for the "previous" column.
    pub previous: Option<PreviousAttempt>,
    pub(crate) fetch_generation: u64,
}

impl Exercise {
    /// A fresh exercise with a single empty `set1`.
    pub fn new(name: impl Into<String>, unit: WeightUnit, preset: ExercisePreset) -> Self {
        Self {
            id: ExerciseId::new(),
            name: name.into(),
            weight_unit: unit,
            weight_encoding: preset.weight_encoding,
            reps_encoding: preset.reps_encoding,
            sets: vec![WorkoutSet::new(SetKey::set(1))],
            linked_superset_id: None,
            is_superset_member: false,
            previous: None,
            fetch_generation: 0,
        }
    }

    /// Display label of the set at `index`, from its position.
    pub fn set_label(index: usize) -> String {
        format!("Set {}", index + 1)
    }

    /// Display label of the drop-set at `index` under its parent.
    pub fn drop_set_label(index: usize) -> String {
        format!("Drop {}", index + 1)
    }

    pub fn set_at(&self, index: usize) -> Result<&WorkoutSet, EditorError> {
        self.sets.get(index).ok_or(EditorError::InvalidIndex {
            what: "set",
            index,
            len: self.sets.len(),
        })
    }

    pub(crate) fn set_at_mut(&mut self, index: usize) -> Result<&mut WorkoutSet, EditorError> {
        let len = self.sets.len();
        self.sets.get_mut(index).ok_or(EditorError::InvalidIndex {
            what: "set",
            index,
            len,
        })
    }

    /// Number of ordinary sets. Drop-sets never count.
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Iterate every key, ordinary sets followed by their drop-sets.
    pub fn keys(&self) -> impl Iterator<Item = SetKey> + '_ {
        self.sets
            .iter()
            .flat_map(|s| std::iter::once(s.key).chain(s.drop_sets.iter().map(|d| d.key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keys_parse_and_print() {
        let key: SetKey = "set2_dropset4".parse().unwrap();
        assert_eq!(key, SetKey::drop_set(2, 4));
        assert_eq!(key.parent(), SetKey::set(2));
        assert_eq!(key.to_string(), "set2_dropset4");
        assert_eq!("set11".parse::<SetKey>().unwrap(), SetKey::set(11));
    }

    #[test]
    fn malformed_set_keys_are_rejected() {
        for bad in ["set", "set2_drop1", "dropset1", "set-1", "set2_dropset"] {
            assert_eq!(
                bad.parse::<SetKey>(),
                Err(EditorError::InvalidSetKey(bad.to_string()))
            );
        }
    }

    #[test]
    fn set_key_serializes_as_flat_string() {
        let json = serde_json::to_string(&SetKey::drop_set(1, 2)).unwrap();
        assert_eq!(json, "\"set1_dropset2\"");
        let back: SetKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SetKey::drop_set(1, 2));
    }

    #[test]
    fn unit_factors() {
        assert!((WeightUnit::Kg.factor_to(WeightUnit::Lbs) * 50.0 - 110.231).abs() < 1e-3);
        assert!((WeightUnit::Lbs.factor_to(WeightUnit::Kg) * 100.0 - 45.3592).abs() < 1e-3);
        assert_eq!(WeightUnit::Kg.factor_to(WeightUnit::Kg), 1.0);
    }

    #[test]
    fn edits_mark_weight_and_reps_as_touched() {
        let mut v = SetValues::default();
        v.apply(SetEdit::Completed(true));
        assert!(!v.touched);
        v.apply(SetEdit::Reps(Some(8)));
        assert!(v.touched);
        assert!(v.has_data());
    }

    #[test]
    fn labels_come_from_position() {
        assert_eq!(Exercise::set_label(0), "Set 1");
        assert_eq!(Exercise::drop_set_label(2), "Drop 3");
    }
}
