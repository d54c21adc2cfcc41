//! Collaborator interfaces the editor talks to. Implementations decide the
//! transport; see [`crate::sync::HttpDocumentStore`] for the HTTP one.

use crate::error::StoreError;
use crate::presets::PresetCatalog;
use crate::previous::PreviousAttempt;
use crate::record::{ExerciseRecord, WorkoutDocument};

pub trait ExercisePresetCatalog {
    fn fetch_all(&self) -> Result<PresetCatalog, StoreError>;
}

pub trait WorkoutHistoryStore {
    /// Latest recorded attempt of `exercise_name`, if it was ever performed.
    fn fetch_latest_attempt(
        &self,
        exercise_name: &str,
    ) -> Result<Option<PreviousAttempt>, StoreError>;
}

pub trait TemplateStore {
    fn save_template(&self, template_id: &str, exercises: &[ExerciseRecord])
    -> Result<(), StoreError>;

    fn load_template(&self, template_id: &str) -> Result<Option<Vec<ExerciseRecord>>, StoreError>;
}

pub trait WorkoutStore {
    fn save_workout(&self, workout: &WorkoutDocument) -> Result<(), StoreError>;
}
