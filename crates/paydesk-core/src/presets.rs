//! Named filter presets persisted in a [`KeyValueStore`].
//!
//! The whole collection lives as one JSON array under a fixed key and is
//! rewritten on every change. Preset filters are value snapshots: later edits
//! to the live filters never reach a saved preset.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FilterError, PresetError};
use crate::filters::{Filter, FilterOperator, FilterValue};
use crate::store::KeyValueStore;

/// Storage key of the preset collection.
pub const PRESETS_KEY: &str = "paydesk.filterPresets";

/// A filter without identity, as stored inside a preset.
///
/// Decoding rejects a value whose shape does not fit the operator, so a
/// tampered collection reads as corrupt instead of reaching the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredPresetFilter")]
pub struct PresetFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

#[derive(Deserialize)]
struct StoredPresetFilter {
    field: String,
    operator: FilterOperator,
    value: FilterValue,
}

impl TryFrom<StoredPresetFilter> for PresetFilter {
    type Error = FilterError;

    fn try_from(stored: StoredPresetFilter) -> Result<Self, Self::Error> {
        if stored.operator.takes_range() != stored.value.is_range() {
            return Err(FilterError::ValueShapeMismatch {
                operator: stored.operator,
            });
        }
        Ok(Self::new(stored.field, stored.operator, stored.value))
    }
}

impl PresetFilter {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Live filter with a fresh identifier.
    pub fn to_filter(&self) -> Filter {
        Filter::new(self.field.clone(), self.operator, self.value.clone())
    }
}

impl From<&Filter> for PresetFilter {
    fn from(filter: &Filter) -> Self {
        Self {
            field: filter.field.clone(),
            operator: filter.operator,
            value: filter.value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub id: Uuid,
    pub name: String,
    pub filters: Vec<PresetFilter>,
}

pub struct PresetStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> PresetStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: PRESETS_KEY.to_string(),
        }
    }

    /// Presets scoped to one table, e.g. `"employees"`.
    pub fn namespaced(store: S, namespace: &str) -> Self {
        Self {
            store,
            key: format!("{}.{}", PRESETS_KEY, namespace),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Missing or corrupt data reads as "no presets".
    pub fn load(&self) -> Vec<FilterPreset> {
        let Some(raw) = self.store.get(&self.key) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "Ignoring corrupt filter presets");
            Vec::new()
        })
    }

    pub fn find(&self, name: &str) -> Option<FilterPreset> {
        self.load().into_iter().find(|preset| preset.name == name)
    }

    pub fn save_preset(&self, name: &str, filters: &[Filter]) -> Result<FilterPreset, PresetError> {
        if filters.is_empty() {
            return Err(PresetError::NoFilters);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }

        let preset = FilterPreset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            filters: filters.iter().map(PresetFilter::from).collect(),
        };
        let mut presets = self.load();
        presets.push(preset.clone());
        self.write(&presets)?;
        tracing::info!(preset = %preset.name, filters = preset.filters.len(), "Saved filter preset");
        Ok(preset)
    }

    /// Returns whether a preset was removed.
    pub fn delete_preset(&self, id: Uuid) -> Result<bool, PresetError> {
        let mut presets = self.load();
        let before = presets.len();
        presets.retain(|preset| preset.id != id);
        if presets.len() == before {
            return Ok(false);
        }
        self.write(&presets)?;
        Ok(true)
    }

    fn write(&self, presets: &[FilterPreset]) -> Result<(), PresetError> {
        let raw = serde_json::to_string(presets).map_err(crate::error::StoreError::from)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }
}
