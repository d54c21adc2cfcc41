//! Flat document form of a template, as written to and read from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::editor::TemplateEditor;
use crate::error::EditorError;
use crate::model::{
    DropSet, Exercise, ExerciseId, RepsEncoding, SetKey, SetValues, WeightEncoding, WeightUnit,
    WorkoutSet,
};
use crate::settings::EditorSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub key: SetKey,
    pub weight: Option<f32>,
    pub reps: Option<u32>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_failure: bool,
}

impl SetRecord {
    fn from_values(key: SetKey, v: &SetValues) -> Self {
        Self {
            key,
            weight: v.weight,
            reps: v.reps,
            completed: v.completed,
            is_failure: v.failure,
        }
    }

    fn values(&self) -> SetValues {
        SetValues {
            weight: self.weight,
            reps: self.reps,
            completed: self.completed,
            failure: self.is_failure,
            // saved values count as user input
            touched: self.weight.is_some() || self.reps.is_some(),
        }
    }
}

/// One exercise with its sets flattened in display order, drop-sets
/// directly after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseRecord {
    pub id: ExerciseId,
    pub name: String,
    #[serde(default)]
    pub weight_unit: WeightUnit,
    #[serde(default)]
    pub weight_encoding: WeightEncoding,
    #[serde(default)]
    pub reps_encoding: RepsEncoding,
    #[serde(default)]
    pub is_superset_member: bool,
    pub linked_superset_id: Option<ExerciseId>,
    pub sets: Vec<SetRecord>,
}

impl ExerciseRecord {
    pub fn set_keys(&self) -> Vec<SetKey> {
        self.sets.iter().map(|s| s.key).collect()
    }
}

/// A finished workout as sent to the workout store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDocument {
    pub id: Uuid,
    pub template_id: Option<String>,
    pub finished_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseRecord>,
}

fn record_for(ex: &Exercise) -> ExerciseRecord {
    let mut sets = Vec::new();
    for set in ex.sets.iter().filter(|s| s.has_data()) {
        sets.push(SetRecord::from_values(set.key, &set.values));
        sets.extend(
            set.drop_sets
                .iter()
                .filter(|d| d.values.has_data())
                .map(|d| SetRecord::from_values(d.key, &d.values)),
        );
    }
    ExerciseRecord {
        id: ex.id,
        name: ex.name.clone(),
        weight_unit: ex.weight_unit,
        weight_encoding: ex.weight_encoding,
        reps_encoding: ex.reps_encoding,
        is_superset_member: ex.is_superset_member,
        linked_superset_id: ex.linked_superset_id,
        sets,
    }
}

fn exercise_from(record: &ExerciseRecord) -> Exercise {
    let mut sets: Vec<WorkoutSet> = Vec::new();
    let mut seen = HashSet::new();
    for s in &record.sets {
        if !seen.insert(s.key) {
            log::warn!("Skipping duplicate {} of {}", s.key, record.name);
            continue;
        }
        if s.key.is_drop_set() {
            match sets.iter_mut().find(|p| p.key == s.key.parent()) {
                Some(parent) => parent.drop_sets.push(DropSet {
                    key: s.key,
                    values: s.values(),
                }),
                None => log::warn!("Dropping orphan {} of {}", s.key, record.name),
            }
        } else {
            let mut set = WorkoutSet::new(s.key);
            set.values = s.values();
            sets.push(set);
        }
    }
    Exercise {
        id: record.id,
        name: record.name.clone(),
        weight_unit: record.weight_unit,
        weight_encoding: record.weight_encoding,
        reps_encoding: record.reps_encoding,
        sets,
        linked_superset_id: record.linked_superset_id,
        is_superset_member: record.is_superset_member,
        previous: None,
        fetch_generation: 0,
    }
}

impl TemplateEditor {
    /// Flatten the tree for saving. Sets with no weight, reps or failure
    /// flag are left out, unless one of their drop-sets has data.
    pub fn to_records(&self) -> Vec<ExerciseRecord> {
        self.exercises.iter().map(record_for).collect()
    }

    /// Rebuild an editor from stored records.
    ///
    /// Links to exercises that are not part of the template are cleared and a
    /// second link into the same exercise is dropped, keeping chains linear.
    /// A chain that loops back on itself is rejected.
    pub fn from_records(
        records: &[ExerciseRecord],
        settings: &EditorSettings,
    ) -> Result<Self, EditorError> {
        let mut editor = TemplateEditor::new(settings);
        let mut seen = HashSet::new();
        for r in records {
            if !seen.insert(r.id) {
                log::warn!("Skipping duplicate exercise id {}", r.id);
                continue;
            }
            editor.exercises.push(exercise_from(r));
        }

        let mut targets = HashSet::new();
        for i in 0..editor.exercises.len() {
            let Some(link) = editor.exercises[i].linked_superset_id else {
                continue;
            };
            if !seen.contains(&link) {
                log::warn!("Clearing link to missing exercise {link}");
                editor.exercises[i].linked_superset_id = None;
            } else if !targets.insert(link) {
                log::warn!("Clearing second link into exercise {link}");
                editor.exercises[i].linked_superset_id = None;
            }
        }

        for ex in &editor.exercises {
            editor.superset_chain(ex.id)?;
        }
        Ok(editor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SetEdit;

    fn filled_editor() -> (TemplateEditor, ExerciseId, ExerciseId) {
        let mut ed = TemplateEditor::new(&EditorSettings::default());
        let a = ed.add_exercise("Bench Press (Barbell)", None).unwrap();
        let b = ed.add_exercise("Tricep Pushdown", Some(0)).unwrap();
        ed.add_set(a).unwrap();
        ed.add_set(a).unwrap();
        ed.update_set(a, 0, SetEdit::Weight(Some(95.0))).unwrap();
        ed.update_set(a, 0, SetEdit::Reps(Some(8))).unwrap();
        // set2 stays empty but gets a drop-set with data
        ed.add_drop_set(a, 1).unwrap();
        ed.update_drop_set(a, 1, 0, SetEdit::Reps(Some(12))).unwrap();
        // set3 only failed
        ed.update_set(a, 2, SetEdit::Failure(true)).unwrap();
        ed.add_set(b).unwrap();
        ed.update_set(b, 1, SetEdit::Reps(Some(15))).unwrap();
        (ed, a, b)
    }

    #[test]
    fn save_filter_keeps_sets_with_data() {
        let (ed, a, b) = filled_editor();
        let records = ed.to_records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].set_keys(),
            vec![
                SetKey::set(1),
                SetKey::set(2),
                SetKey::drop_set(2, 1),
                SetKey::set(3)
            ]
        );
        assert_eq!(records[0].linked_superset_id, Some(b));
        assert_eq!(records[1].set_keys(), vec![SetKey::set(2)]);
        assert!(records[1].is_superset_member);
        assert_eq!(records[0].id, a);
    }

    #[test]
    fn records_rebuild_nested_tree() {
        let (ed, a, b) = filled_editor();
        let json = serde_json::to_string(&ed.to_records()).unwrap();
        assert!(json.contains("\"set2_dropset1\""));

        let records: Vec<ExerciseRecord> = serde_json::from_str(&json).unwrap();
        let loaded = TemplateEditor::from_records(&records, &EditorSettings::default()).unwrap();
        let bench = loaded.exercise(a).unwrap();
        assert_eq!(bench.sets.len(), 3);
        assert_eq!(bench.sets[1].drop_sets.len(), 1);
        assert_eq!(bench.sets[1].drop_sets[0].values.reps, Some(12));
        assert!(bench.sets[0].values.touched);
        assert!(bench.sets[1].drop_sets[0].values.touched);
        assert_eq!(loaded.superset_chain(a).unwrap(), vec![a, b]);
    }

    fn record(id: ExerciseId, link: Option<ExerciseId>, keys: &[&str]) -> ExerciseRecord {
        ExerciseRecord {
            id,
            name: "X".into(),
            weight_unit: WeightUnit::Lbs,
            weight_encoding: WeightEncoding::Direct,
            reps_encoding: RepsEncoding::Count,
            is_superset_member: false,
            linked_superset_id: link,
            sets: keys
                .iter()
                .map(|k| SetRecord {
                    key: k.parse().unwrap(),
                    weight: Some(10.0),
                    reps: None,
                    completed: false,
                    is_failure: false,
                })
                .collect(),
        }
    }

    #[test]
    fn cycles_are_rejected() {
        let a = ExerciseId::new();
        let b = ExerciseId::new();
        let records = vec![record(a, Some(b), &["set1"]), record(b, Some(a), &["set1"])];
        let err = TemplateEditor::from_records(&records, &EditorSettings::default()).unwrap_err();
        assert!(matches!(err, EditorError::SupersetCycle(_)));
    }

    #[test]
    fn dangling_links_and_orphan_drop_sets_are_repaired() {
        let a = ExerciseId::new();
        let records = vec![record(
            a,
            Some(ExerciseId::new()),
            &["set1", "set4_dropset1", "set1_dropset1"],
        )];
        let ed = TemplateEditor::from_records(&records, &EditorSettings::default()).unwrap();
        let ex = ed.exercise(a).unwrap();
        assert_eq!(ex.linked_superset_id, None);
        assert_eq!(ex.sets.len(), 1);
        assert_eq!(ex.sets[0].drop_sets.len(), 1);
    }

    #[test]
    fn loaded_values_survive_history_prefill() {
        let a = ExerciseId::new();
        let mut rec = record(a, None, &["set1"]);
        rec.sets[0].weight = Some(135.0);
        rec.sets[0].reps = Some(5);
        let mut ed = TemplateEditor::from_records(&[rec], &EditorSettings::default()).unwrap();

        let mut sets = std::collections::BTreeMap::new();
        sets.insert(
            SetKey::set(1),
            crate::previous::PreviousSet {
                weight: Some(50.0),
                reps: Some(3),
            },
        );
        let attempt = crate::previous::PreviousAttempt {
            exercise_name: "X".into(),
            performed_on: None,
            unit: WeightUnit::Kg,
            sets,
        };
        let ticket = ed.request_previous_attempt(a).unwrap();
        assert_eq!(ed.apply_previous_attempt(&ticket, Some(attempt)).unwrap(), 0);
        let set = &ed.exercise(a).unwrap().sets[0];
        assert_eq!(set.values.weight, Some(135.0));
        assert_eq!(set.values.reps, Some(5));
    }

    #[test]
    fn repeated_set_keys_keep_first_entry() {
        let a = ExerciseId::new();
        let mut rec = record(a, None, &["set1", "set1", "set1_dropset1", "set1_dropset1"]);
        rec.sets[1].weight = Some(99.0);
        rec.sets[3].weight = Some(77.0);
        let ed = TemplateEditor::from_records(&[rec], &EditorSettings::default()).unwrap();
        let ex = ed.exercise(a).unwrap();
        let keys: Vec<SetKey> = ex.keys().collect();
        assert_eq!(keys, vec![SetKey::set(1), SetKey::drop_set(1, 1)]);
        assert_eq!(ex.sets[0].values.weight, Some(10.0));
        assert_eq!(ex.sets[0].drop_sets[0].values.weight, Some(10.0));
        assert_eq!(ed.to_records()[0].set_keys(), keys);
    }

    #[test]
    fn branching_links_are_trimmed() {
        let a = ExerciseId::new();
        let b = ExerciseId::new();
        let c = ExerciseId::new();
        let records = vec![
            record(a, Some(c), &["set1"]),
            record(b, Some(c), &["set1"]),
            record(c, None, &["set1"]),
        ];
        let ed = TemplateEditor::from_records(&records, &EditorSettings::default()).unwrap();
        assert_eq!(ed.exercise(a).unwrap().linked_superset_id, Some(c));
        assert_eq!(ed.exercise(b).unwrap().linked_superset_id, None);
    }
}
