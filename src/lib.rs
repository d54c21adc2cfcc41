//! Editing model for workout templates: exercises with sets and drop-sets,
//! superset chains, weight-encoding arithmetic and previous-attempt merging,
//! plus adapters for the stores a template is loaded from and saved to.

pub mod editor;
pub mod error;
pub mod export;
pub mod model;
pub mod presets;
pub mod previous;
pub mod record;
pub mod resistance;
pub mod session;
pub mod settings;
pub mod store;
pub mod sync;

pub use editor::{SupersetLinkMode, TemplateEditor};
pub use error::{EditorError, StoreError};
pub use model::{
    DropSet, Exercise, ExerciseId, RepsEncoding, SetEdit, SetKey, SetValues, WeightEncoding,
    WeightUnit, WorkoutSet,
};
pub use presets::{ExercisePreset, PresetCatalog};
pub use previous::{FetchTicket, PreviousAttempt, PreviousSet, merge_previous_into};
pub use record::{ExerciseRecord, SetRecord, WorkoutDocument};
pub use resistance::{TotalResistance, compute_total_resistance, convert_weight};
pub use session::EditingSession;
pub use settings::EditorSettings;
pub use store::{ExercisePresetCatalog, TemplateStore, WorkoutHistoryStore, WorkoutStore};
pub use sync::HttpDocumentStore;
