use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::presets::PresetCatalog;
use crate::previous::PreviousAttempt;
use crate::record::{ExerciseRecord, WorkoutDocument};
use crate::settings::EditorSettings;
use crate::store::{ExercisePresetCatalog, TemplateStore, WorkoutHistoryStore, WorkoutStore};

const PRESETS: &str = "exercisePresets";
const HISTORY: &str = "workoutHistory";
const TEMPLATES: &str = "templates";
const WORKOUTS: &str = "workouts";

#[derive(Serialize, Deserialize)]
struct TemplateDoc {
    exercises: Vec<ExerciseRecord>,
}

/// Minimal client for a JSON document store addressed by collection paths.
///
/// `get` reads a document, `set` replaces it and `update` merges fields into
/// it. Requests carry the API key in the `X-API-Key` header.
#[derive(Debug, Clone)]
pub struct HttpDocumentStore {
    base_url: String,
    api_key: String,
}

fn map_error(err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(401, r) => StoreError::Unauthorized(r.into_string().unwrap_or_default()),
        ureq::Error::Status(403, r) => StoreError::Forbidden(r.into_string().unwrap_or_default()),
        ureq::Error::Status(code, r) => {
            let body = r.into_string().unwrap_or_default();
            StoreError::Http(format!("status {code}: {body}"))
        }
        e => StoreError::Http(e.to_string()),
    }
}

impl HttpDocumentStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Build a store from settings, or `None` when no API key is configured.
    pub fn from_settings(settings: &EditorSettings) -> Option<Self> {
        settings
            .resolve_api_key()
            .map(|key| Self::new(settings.store_url.clone(), key))
    }

    fn url(&self, path: &[&str]) -> String {
        let segments: Vec<_> = path.iter().map(|s| urlencoding::encode(s)).collect();
        format!("{}/{}", self.base_url, segments.join("/"))
    }

    fn request(&self, method: &str, path: &[&str]) -> ureq::Request {
        ureq::request(method, &self.url(path))
            .set("X-API-Key", &self.api_key)
            .set("Accept", "application/json")
    }

    /// Fetch a document. A missing document is `Ok(None)`.
    pub fn get(&self, path: &[&str]) -> Result<Option<Value>, StoreError> {
        let resp = match self.request("GET", path).call() {
            Ok(r) => r,
            Err(ureq::Error::Status(404, _)) => return Ok(None),
            Err(e) => return Err(map_error(e)),
        };
        let body = resp
            .into_string()
            .map_err(|e| StoreError::Http(e.to_string()))?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub fn set(&self, path: &[&str], doc: &Value) -> Result<(), StoreError> {
        self.request("PUT", path).send_json(doc).map_err(map_error)?;
        Ok(())
    }

    pub fn update(&self, path: &[&str], fields: &Value) -> Result<(), StoreError> {
        self.request("PATCH", path)
            .send_json(fields)
            .map_err(map_error)?;
        Ok(())
    }
}

impl ExercisePresetCatalog for HttpDocumentStore {
    fn fetch_all(&self) -> Result<PresetCatalog, StoreError> {
        log::info!("Fetching exercise presets");
        match self.get(&[PRESETS])? {
            Some(doc) => Ok(PresetCatalog::from_value(doc)?),
            None => Ok(PresetCatalog::default()),
        }
    }
}

impl WorkoutHistoryStore for HttpDocumentStore {
    fn fetch_latest_attempt(
        &self,
        exercise_name: &str,
    ) -> Result<Option<PreviousAttempt>, StoreError> {
        match self.get(&[HISTORY, exercise_name, "latest"])? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }
}

impl TemplateStore for HttpDocumentStore {
    fn save_template(
        &self,
        template_id: &str,
        exercises: &[ExerciseRecord],
    ) -> Result<(), StoreError> {
        log::info!("Saving template {template_id} ({} exercises)", exercises.len());
        let doc = serde_json::to_value(TemplateDoc {
            exercises: exercises.to_vec(),
        })?;
        self.set(&[TEMPLATES, template_id], &doc)
    }

    fn load_template(&self, template_id: &str) -> Result<Option<Vec<ExerciseRecord>>, StoreError> {
        match self.get(&[TEMPLATES, template_id])? {
            Some(doc) => {
                let doc: TemplateDoc = serde_json::from_value(doc)?;
                Ok(Some(doc.exercises))
            }
            None => Ok(None),
        }
    }
}

impl WorkoutStore for HttpDocumentStore {
    fn save_workout(&self, workout: &WorkoutDocument) -> Result<(), StoreError> {
        let id = workout.id.to_string();
        log::info!("Saving workout {id}");
        self.set(&[WORKOUTS, &id], &serde_json::to_value(workout)?)
    }
}
