//! In-memory editing of a workout template's exercise tree.
//!
//! The editor owns an ordered list of exercises. Each exercise owns its sets,
//! each set owns its drop-sets, and exercises may be chained into supersets
//! through [`Exercise::linked_superset_id`]. Every operation either applies
//! completely or fails with an [`EditorError`] leaving the state untouched.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::EditorError;
use crate::model::{
    DropSet, Exercise, ExerciseId, RepsEncoding, SetEdit, SetKey, SetValues, WeightEncoding,
    WeightUnit, WorkoutSet,
};
use crate::presets::PresetCatalog;
use crate::previous::{FetchTicket, PreviousAttempt, merge_previous_into, prefill_untouched};
use crate::settings::EditorSettings;

/// What "add superset" does when the parent already has a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SupersetLinkMode {
    /// Replace the parent's existing link.
    #[default]
    Overwrite,
    /// Link from the last exercise of the parent's chain instead.
    AppendToChainEnd,
}

#[derive(Debug, Clone, Default)]
pub struct TemplateEditor {
    pub(crate) exercises: Vec<Exercise>,
    catalog: PresetCatalog,
    unit: WeightUnit,
    link_mode: SupersetLinkMode,
}

impl TemplateEditor {
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            exercises: Vec::new(),
            catalog: PresetCatalog::default(),
            unit: settings.weight_unit,
            link_mode: settings.superset_link_mode,
        }
    }

    pub fn with_catalog(mut self, catalog: PresetCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn set_catalog(&mut self, catalog: PresetCatalog) {
        self.catalog = catalog;
    }

    pub fn catalog(&self) -> &PresetCatalog {
        &self.catalog
    }

    pub fn default_unit(&self) -> WeightUnit {
        self.unit
    }

    pub fn link_mode(&self) -> SupersetLinkMode {
        self.link_mode
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    pub fn index_of(&self, id: ExerciseId) -> Result<usize, EditorError> {
        self.exercises
            .iter()
            .position(|e| e.id == id)
            .ok_or(EditorError::UnknownExercise(id))
    }

    pub fn exercise(&self, id: ExerciseId) -> Result<&Exercise, EditorError> {
        let idx = self.index_of(id)?;
        Ok(&self.exercises[idx])
    }

    fn exercise_mut(&mut self, id: ExerciseId) -> Result<&mut Exercise, EditorError> {
        let idx = self.index_of(id)?;
        Ok(&mut self.exercises[idx])
    }

    fn exercise_index_checked(&self, index: usize) -> Result<&Exercise, EditorError> {
        self.exercises.get(index).ok_or(EditorError::InvalidIndex {
            what: "exercise",
            index,
            len: self.exercises.len(),
        })
    }

    /// Exercise whose superset link points at `id`.
    pub fn predecessor_of(&self, id: ExerciseId) -> Option<ExerciseId> {
        self.exercises
            .iter()
            .find(|e| e.linked_superset_id == Some(id))
            .map(|e| e.id)
    }

    /// `id` followed by every exercise reachable through superset links.
    pub fn superset_chain(&self, id: ExerciseId) -> Result<Vec<ExerciseId>, EditorError> {
        self.index_of(id)?;
        let mut chain = vec![id];
        let mut seen: HashSet<ExerciseId> = HashSet::from([id]);
        let mut current = id;
        while let Some(next) = self
            .exercises
            .iter()
            .find(|e| e.id == current)
            .and_then(|e| e.linked_superset_id)
        {
            if !seen.insert(next) {
                return Err(EditorError::SupersetCycle(id));
            }
            chain.push(next);
            current = next;
        }
        Ok(chain)
    }

    /// Append a new exercise with a single empty set.
    ///
    /// With `parent_index`, the new exercise becomes the superset partner of
    /// the exercise at that position, which must not itself be a partner.
    pub fn add_exercise(
        &mut self,
        name: &str,
        parent_index: Option<usize>,
    ) -> Result<ExerciseId, EditorError> {
        let link_from = match parent_index {
            Some(pi) => {
                let parent = self.exercise_index_checked(pi)?;
                if parent.is_superset_member {
                    return Err(EditorError::NotSupersetRoot(pi));
                }
                let from = match self.link_mode {
                    SupersetLinkMode::Overwrite => {
                        if let Some(old) = parent.linked_superset_id {
                            log::debug!("Replacing superset partner {old} of {}", parent.name);
                        }
                        parent.id
                    }
                    SupersetLinkMode::AppendToChainEnd => {
                        let chain = self.superset_chain(parent.id)?;
                        chain.last().copied().unwrap_or(parent.id)
                    }
                };
                Some(from)
            }
            None => None,
        };

        let preset = self.catalog.preset_or_default(name);
        let mut exercise = Exercise::new(name, self.unit, preset);
        exercise.is_superset_member = link_from.is_some();
        let id = exercise.id;
        self.exercises.push(exercise);

        if let Some(from) = link_from {
            self.exercise_mut(from)?.linked_superset_id = Some(id);
        }
        log::info!("Added exercise {name} ({id})");
        Ok(id)
    }

    /// Append an ordinary set. Its numeral is the number of ordinary sets
    /// including the new one, skipping numerals still held by other sets.
    pub fn add_set(&mut self, id: ExerciseId) -> Result<SetKey, EditorError> {
        let ex = self.exercise_mut(id)?;
        let mut n = ex.sets.len() as u32 + 1;
        while ex.sets.iter().any(|s| s.key.set == n) {
            n += 1;
        }
        let key = SetKey::set(n);
        ex.sets.push(WorkoutSet::new(key));
        Ok(key)
    }

    /// Append a drop-set under the set at `parent_set_index`.
    pub fn add_drop_set(
        &mut self,
        id: ExerciseId,
        parent_set_index: usize,
    ) -> Result<SetKey, EditorError> {
        let parent = self.exercise_mut(id)?.set_at_mut(parent_set_index)?;
        let mut k = parent.drop_sets.len() as u32 + 1;
        while parent.drop_sets.iter().any(|d| d.key.drop == Some(k)) {
            k += 1;
        }
        let key = SetKey::drop_set(parent.key.set, k);
        parent.drop_sets.push(DropSet {
            key,
            values: SetValues::default(),
        });
        Ok(key)
    }

    /// Remove the set at `set_index` together with its drop-sets. Keys of the
    /// remaining sets are left as they are.
    pub fn delete_set(
        &mut self,
        id: ExerciseId,
        set_index: usize,
    ) -> Result<WorkoutSet, EditorError> {
        let ex = self.exercise_mut(id)?;
        ex.set_at(set_index)?;
        Ok(ex.sets.remove(set_index))
    }

    pub fn delete_drop_set(
        &mut self,
        id: ExerciseId,
        set_index: usize,
        drop_index: usize,
    ) -> Result<DropSet, EditorError> {
        let set = self.exercise_mut(id)?.set_at_mut(set_index)?;
        if drop_index >= set.drop_sets.len() {
            return Err(EditorError::InvalidIndex {
                what: "drop-set",
                index: drop_index,
                len: set.drop_sets.len(),
            });
        }
        Ok(set.drop_sets.remove(drop_index))
    }

    /// Remove an exercise and repair superset links.
    ///
    /// A chain head takes its whole chain with it. A chained partner is
    /// spliced out so its predecessor links to its successor. Returns the ids
    /// of every removed exercise.
    pub fn delete_exercise(&mut self, id: ExerciseId) -> Result<Vec<ExerciseId>, EditorError> {
        let idx = self.index_of(id)?;
        let removed = match self.predecessor_of(id) {
            None => self.chain_lenient(id),
            Some(pred) => {
                let next = self.exercises[idx].linked_superset_id;
                self.exercise_mut(pred)?.linked_superset_id = next;
                vec![id]
            }
        };

        self.exercises.retain(|e| !removed.contains(&e.id));
        for e in &mut self.exercises {
            if e.linked_superset_id.is_some_and(|l| removed.contains(&l)) {
                e.linked_superset_id = None;
            }
        }
        log::info!("Deleted {} exercise(s) starting at {id}", removed.len());
        Ok(removed)
    }

    // Chain walk that stops at a revisit instead of failing; deletion must
    // always make progress.
    fn chain_lenient(&self, id: ExerciseId) -> Vec<ExerciseId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(next) = self
            .exercises
            .iter()
            .find(|e| e.id == current)
            .and_then(|e| e.linked_superset_id)
        {
            if chain.contains(&next) {
                break;
            }
            chain.push(next);
            current = next;
        }
        chain
    }

    pub fn update_set(
        &mut self,
        id: ExerciseId,
        set_index: usize,
        edit: SetEdit,
    ) -> Result<(), EditorError> {
        self.exercise_mut(id)?
            .set_at_mut(set_index)?
            .values
            .apply(edit);
        Ok(())
    }

    pub fn update_drop_set(
        &mut self,
        id: ExerciseId,
        set_index: usize,
        drop_index: usize,
        edit: SetEdit,
    ) -> Result<(), EditorError> {
        let set = self.exercise_mut(id)?.set_at_mut(set_index)?;
        let len = set.drop_sets.len();
        let drop = set
            .drop_sets
            .get_mut(drop_index)
            .ok_or(EditorError::InvalidIndex {
                what: "drop-set",
                index: drop_index,
                len,
            })?;
        drop.values.apply(edit);
        Ok(())
    }

    /// Switch the exercise's unit, converting every recorded weight.
    pub fn set_weight_unit(&mut self, id: ExerciseId, unit: WeightUnit) -> Result<(), EditorError> {
        let ex = self.exercise_mut(id)?;
        let from = ex.weight_unit;
        if from == unit {
            return Ok(());
        }
        for set in &mut ex.sets {
            set.values.convert_weight(from, unit);
            for d in &mut set.drop_sets {
                d.values.convert_weight(from, unit);
            }
        }
        ex.weight_unit = unit;
        Ok(())
    }

    pub fn set_weight_encoding(
        &mut self,
        id: ExerciseId,
        encoding: WeightEncoding,
    ) -> Result<(), EditorError> {
        self.exercise_mut(id)?.weight_encoding = encoding;
        Ok(())
    }

    pub fn set_reps_encoding(
        &mut self,
        id: ExerciseId,
        encoding: RepsEncoding,
    ) -> Result<(), EditorError> {
        self.exercise_mut(id)?.reps_encoding = encoding;
        Ok(())
    }

    /// Rename an exercise. History fetched for the old name no longer applies.
    pub fn rename_exercise(&mut self, id: ExerciseId, name: &str) -> Result<(), EditorError> {
        let ex = self.exercise_mut(id)?;
        ex.name = name.to_string();
        ex.previous = None;
        ex.fetch_generation += 1;
        Ok(())
    }

    /// Move the exercise at `from` so it ends up at position `to`.
    pub fn move_exercise(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.exercises.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditorError::InvalidIndex {
                    what: "exercise",
                    index,
                    len,
                });
            }
        }
        let ex = self.exercises.remove(from);
        self.exercises.insert(to, ex);
        Ok(())
    }

    /// Copy `previous`'s entry for the set at `set_index` into that set,
    /// converting units. `Ok(false)` if there is no matching entry.
    pub fn merge_previous_attempt(
        &mut self,
        id: ExerciseId,
        set_index: usize,
        previous: &PreviousAttempt,
    ) -> Result<bool, EditorError> {
        merge_previous_into(self.exercise_mut(id)?, set_index, previous)
    }

    /// Like [`merge_previous_attempt`](Self::merge_previous_attempt) using the
    /// attempt already stored on the exercise.
    pub fn use_previous(&mut self, id: ExerciseId, set_index: usize) -> Result<bool, EditorError> {
        let ex = self.exercise_mut(id)?;
        let Some(prev) = ex.previous.take() else {
            ex.set_at(set_index)?;
            return Ok(false);
        };
        let merged = merge_previous_into(ex, set_index, &prev);
        ex.previous = Some(prev);
        merged
    }

    /// Start a previous-attempt fetch. Any ticket issued earlier for the same
    /// exercise becomes stale.
    pub fn request_previous_attempt(&mut self, id: ExerciseId) -> Result<FetchTicket, EditorError> {
        let ex = self.exercise_mut(id)?;
        ex.fetch_generation += 1;
        Ok(FetchTicket {
            exercise_id: id,
            exercise_name: ex.name.clone(),
            generation: ex.fetch_generation,
        })
    }

    /// Apply a fetch result. Sets the user already typed into keep their
    /// values; returns how many entries were prefilled.
    pub fn apply_previous_attempt(
        &mut self,
        ticket: &FetchTicket,
        attempt: Option<PreviousAttempt>,
    ) -> Result<usize, EditorError> {
        let stale = EditorError::StaleAsyncResult(ticket.exercise_id);
        let ex = self.exercise_mut(ticket.exercise_id).map_err(|_| stale.clone())?;
        if ex.fetch_generation != ticket.generation {
            log::debug!("Dropping stale previous attempt for {}", ticket.exercise_name);
            return Err(stale);
        }
        let filled = match &attempt {
            Some(prev) => prefill_untouched(ex, prev),
            None => 0,
        };
        ex.previous = attempt;
        Ok(filled)
    }
}
