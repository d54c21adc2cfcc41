use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::editor::TemplateEditor;
use crate::model::{Exercise, ExerciseId, SetKey, SetValues, WeightUnit};
use crate::resistance::{compute_total_resistance, convert_weight};

/// One set in the Hevy-style CSV layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub title: String,
    pub exercise_title: String,
    pub superset_id: Option<usize>,
    pub set_index: usize,
    pub set_key: String,
    pub set_type: &'static str,
    pub weight_lbs: Option<f32>,
    pub weight_kg: Option<f32>,
    pub reps: Option<u32>,
    pub total_resistance: Option<String>,
}

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(std::io::Error::other)
}

pub fn write_csv<T: Serialize>(writer: impl Write, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in records {
        wtr.serialize(r)?;
    }
    wtr.flush().map_err(Into::into)
}

// Number each superset chain from its head; exercises outside a chain get none.
fn superset_groups(editor: &TemplateEditor) -> HashMap<ExerciseId, usize> {
    let mut groups = HashMap::new();
    let mut next = 0;
    for ex in editor.exercises() {
        if ex.linked_superset_id.is_none() || editor.predecessor_of(ex.id).is_some() {
            continue;
        }
        if let Ok(chain) = editor.superset_chain(ex.id) {
            for id in chain {
                groups.insert(id, next);
            }
            next += 1;
        }
    }
    groups
}

fn row(
    title: &str,
    ex: &Exercise,
    group: Option<usize>,
    set_index: usize,
    key: SetKey,
    v: &SetValues,
) -> ExportRow {
    let set_type = if key.is_drop_set() {
        "dropset"
    } else if v.failure {
        "failure"
    } else {
        "normal"
    };
    let in_unit = |to| v.weight.map(|w| convert_weight(w, ex.weight_unit, to));
    ExportRow {
        title: title.to_string(),
        exercise_title: ex.name.clone(),
        superset_id: group,
        set_index,
        set_key: key.to_string(),
        set_type,
        weight_lbs: in_unit(WeightUnit::Lbs),
        weight_kg: in_unit(WeightUnit::Kg),
        reps: v.reps,
        total_resistance: v
            .weight
            .map(|w| compute_total_resistance(ex, w).to_string()),
    }
}

/// Rows for every set and drop-set that has data, in display order.
pub fn export_rows(editor: &TemplateEditor, title: &str) -> Vec<ExportRow> {
    let groups = superset_groups(editor);
    let mut rows = Vec::new();
    for ex in editor.exercises() {
        let group = groups.get(&ex.id).copied();
        let mut index = 0;
        for set in &ex.sets {
            let entries = std::iter::once((set.key, &set.values))
                .chain(set.drop_sets.iter().map(|d| (d.key, &d.values)));
            for (key, values) in entries.filter(|(_, v)| v.has_data()) {
                rows.push(row(title, ex, group, index, key, values));
                index += 1;
            }
        }
    }
    rows
}

pub fn save_template_csv<P: AsRef<Path>>(
    path: P,
    editor: &TemplateEditor,
    title: &str,
) -> csv::Result<()> {
    write_csv(std::fs::File::create(path)?, &export_rows(editor, title))
}

pub fn save_template_json<P: AsRef<Path>>(path: P, editor: &TemplateEditor) -> std::io::Result<()> {
    write_json(&editor.to_records(), path)
}
