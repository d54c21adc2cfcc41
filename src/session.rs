use chrono::Utc;
use uuid::Uuid;

use crate::editor::TemplateEditor;
use crate::error::{EditorError, StoreError};
use crate::presets::PresetCatalog;
use crate::record::WorkoutDocument;
use crate::settings::EditorSettings;
use crate::store::{ExercisePresetCatalog, TemplateStore, WorkoutHistoryStore, WorkoutStore};

/// One editing session of a template: the editor plus the calls that move
/// its contents to and from the collaborators.
///
/// Save calls only read the editor, so a failed save leaves everything in
/// place for a retry.
#[derive(Debug, Clone)]
pub struct EditingSession {
    pub editor: TemplateEditor,
    template_id: String,
}

impl EditingSession {
    pub fn new(template_id: impl Into<String>, settings: &EditorSettings) -> Self {
        Self {
            editor: TemplateEditor::new(settings),
            template_id: template_id.into(),
        }
    }

    /// Open a stored template, or start an empty one if none exists.
    pub fn open(
        template_id: impl Into<String>,
        settings: &EditorSettings,
        store: &impl TemplateStore,
    ) -> Result<Self, StoreError> {
        let template_id = template_id.into();
        let editor = match store.load_template(&template_id)? {
            Some(records) => TemplateEditor::from_records(&records, settings)?,
            None => TemplateEditor::new(settings),
        };
        Ok(Self {
            editor,
            template_id,
        })
    }

    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Replace the preset catalog with a fresh fetch. On failure the cached
    /// catalog from the last successful fetch is used, if there is one.
    pub fn load_presets(&mut self, source: &impl ExercisePresetCatalog) -> Result<(), StoreError> {
        match source.fetch_all() {
            Ok(catalog) => {
                if let Err(e) = catalog.save_cached() {
                    log::debug!("Could not cache presets: {e}");
                }
                self.editor.set_catalog(catalog);
                Ok(())
            }
            Err(e) => {
                log::warn!("Preset fetch failed: {e}");
                match PresetCatalog::load_cached() {
                    Some(cached) => {
                        self.editor.set_catalog(cached);
                        Ok(())
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Fetch the previous attempt of every exercise. Returns how many set
    /// entries were prefilled; individual failures are logged and skipped.
    pub fn refresh_previous(&mut self, history: &impl WorkoutHistoryStore) -> usize {
        let ids: Vec<_> = self.editor.exercises().iter().map(|e| e.id).collect();
        let mut tickets = Vec::new();
        for id in ids {
            match self.editor.request_previous_attempt(id) {
                Ok(t) => tickets.push(t),
                Err(e) => log::warn!("{e}"),
            }
        }

        let mut filled = 0;
        for ticket in tickets {
            let attempt = match history.fetch_latest_attempt(&ticket.exercise_name) {
                Ok(a) => a,
                Err(e) => {
                    log::warn!("History fetch for {} failed: {e}", ticket.exercise_name);
                    continue;
                }
            };
            match self.editor.apply_previous_attempt(&ticket, attempt) {
                Ok(n) => filled += n,
                Err(e @ EditorError::StaleAsyncResult(_)) => log::debug!("{e}"),
                Err(e) => log::warn!("{e}"),
            }
        }
        filled
    }

    pub fn save_template(&self, store: &impl TemplateStore) -> Result<(), StoreError> {
        store
            .save_template(&self.template_id, &self.editor.to_records())
            .inspect_err(|e| log::error!("{}", e.save_failed_notice()))
    }

    /// Record the session as a finished workout.
    pub fn finish_workout(&self, store: &impl WorkoutStore) -> Result<WorkoutDocument, StoreError> {
        let doc = WorkoutDocument {
            id: Uuid::new_v4(),
            template_id: Some(self.template_id.clone()),
            finished_at: Utc::now(),
            exercises: self.editor.to_records(),
        };
        store
            .save_workout(&doc)
            .inspect_err(|e| log::error!("{}", e.save_failed_notice()))?;
        Ok(doc)
    }
}
