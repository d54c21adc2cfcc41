use dirs_next as dirs;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::Path;

use crate::error::EditorError;
use crate::model::{RepsEncoding, WeightEncoding};
use crate::settings::require_config_path;

/// Encoding defaults applied when an exercise is added by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExercisePreset {
    pub weight_encoding: WeightEncoding,
    pub reps_encoding: RepsEncoding,
}

const fn preset(weight_encoding: WeightEncoding, reps_encoding: RepsEncoding) -> ExercisePreset {
    ExercisePreset {
        weight_encoding,
        reps_encoding,
    }
}

/// Presets known without a catalog fetch.
pub static BUILTIN_PRESETS: phf::Map<&'static str, ExercisePreset> = phf_map! {
    "Bench Press (Barbell)" => preset(WeightEncoding::PerSidePlusBar, RepsEncoding::Count),
    "Squat (Barbell)" => preset(WeightEncoding::PerSidePlusBar, RepsEncoding::Count),
    "Deadlift (Barbell)" => preset(WeightEncoding::PerSidePlusBar, RepsEncoding::Count),
    "Leg Press (Machine)" => preset(WeightEncoding::PerSidePlateOnly, RepsEncoding::Count),
    "Tricep Pushdown" => preset(WeightEncoding::Direct, RepsEncoding::Count),
    "Pull Up" => preset(WeightEncoding::BodyweightOnly, RepsEncoding::Count),
    "Weighted Pull Up" => preset(WeightEncoding::BodyweightPlusExtra, RepsEncoding::Count),
    "Dips" => preset(WeightEncoding::BodyweightPlusExtra, RepsEncoding::Count),
    "Plank" => preset(WeightEncoding::BodyweightOnly, RepsEncoding::TimedHold),
    "Treadmill" => preset(WeightEncoding::Direct, RepsEncoding::TimedCardio),
};

const FILE: &str = "workout_template_presets.json";

fn path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|p| p.join(FILE))
}

/// Exercise name to preset mapping as delivered by the remote catalog.
///
/// Entries that fail to decode are remembered so a lookup can report them as
/// [`EditorError::MalformedPreset`] instead of silently treating them as
/// unknown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresetCatalog {
    presets: HashMap<String, ExercisePreset>,
    malformed: HashMap<String, String>,
}

impl PresetCatalog {
    /// Decode a catalog document of the form `{ name: { weightEncoding, repsEncoding } }`.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, Value> = serde_json::from_value(value)?;
        let mut catalog = PresetCatalog::default();
        for (name, entry) in entries {
            match serde_json::from_value::<ExercisePreset>(entry) {
                Ok(p) => {
                    catalog.presets.insert(name, p);
                }
                Err(e) => {
                    log::warn!("Malformed preset for {name}: {e}");
                    catalog.malformed.insert(name, e.to_string());
                }
            }
        }
        Ok(catalog)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(data)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, preset: ExercisePreset) {
        let name = name.into();
        self.malformed.remove(&name);
        self.presets.insert(name, preset);
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Find the preset for `name`: catalog entries first, then built-ins.
    pub fn lookup(&self, name: &str) -> Result<Option<ExercisePreset>, EditorError> {
        if let Some(p) = self.presets.get(name) {
            return Ok(Some(*p));
        }
        if let Some(reason) = self.malformed.get(name) {
            return Err(EditorError::MalformedPreset {
                name: name.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(BUILTIN_PRESETS.get(name).copied())
    }

    /// Like [`lookup`](Self::lookup) but falls back to `Direct`/`Count`.
    pub fn preset_or_default(&self, name: &str) -> ExercisePreset {
        match self.lookup(name) {
            Ok(p) => p.unwrap_or_default(),
            Err(e) => {
                log::warn!("{e}; using default encodings");
                ExercisePreset::default()
            }
        }
    }

    /// All names known to the catalog or the built-ins, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut set = BTreeSet::new();
        set.extend(self.presets.keys().cloned());
        set.extend(BUILTIN_PRESETS.keys().map(|k| k.to_string()));
        set.into_iter().collect()
    }

    /// Names closest to `query`, best match first.
    pub fn suggest(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.to_lowercase();
        let mut scored: Vec<(f64, String)> = self
            .names()
            .into_iter()
            .map(|n| (strsim::jaro_winkler(&query, &n.to_lowercase()), n))
            .filter(|(score, _)| *score >= 0.7)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        scored.into_iter().take(limit).map(|(_, n)| n).collect()
    }

    /// Load the catalog cached by the last successful fetch, if any.
    pub fn load_cached() -> Option<Self> {
        let p = path()?;
        let data = std::fs::read_to_string(p).ok()?;
        Self::from_json(&data).ok()
    }

    /// Cache the catalog in the user's config directory.
    pub fn save_cached(&self) -> io::Result<()> {
        self.export(require_config_path(path())?)
    }

    pub fn export<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let sorted: BTreeMap<&String, &ExercisePreset> = self.presets.iter().collect();
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&sorted).map_err(io::Error::other)?;
        std::fs::write(path, data)
    }
}
