//! Paydesk Core Library
//!
//! Client-side state shared by every paydesk front end: period keys for
//! week-scoped documents, the filter editor and its presets, the key-value
//! store abstraction, and configuration. Nothing in this crate talks to the
//! network; see `paydesk-api-client` for that.

pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod notify;
pub mod period;
pub mod presets;
pub mod session;
pub mod store;
pub mod table;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{
    CoreError, ErrorMetadata, FilterError, LogLevel, PeriodError, PresetError, StoreError,
};
pub use filters::{
    EditorState, Filter, FilterDraft, FilterManager, FilterOperator, FilterSchema,
    FilterSubscriber, FilterValue,
};
pub use notify::{NoOpNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use period::{
    period_keys_for_range, resolve_period_key, weeks_in_month, Month, PeriodKey, PeriodSelection,
};
pub use presets::{FilterPreset, PresetFilter, PresetStore};
pub use session::SessionContext;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use table::{TableQuery, TableState};
