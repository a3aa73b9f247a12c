//! Committed filters plus the add/edit draft state machine.

use std::sync::Arc;

use uuid::Uuid;

use super::{Filter, FilterDraft, FilterOperator, FilterSchema, FilterValue};
use crate::error::FilterError;
use crate::presets::{FilterPreset, PresetFilter};

/// Receives the full ordered filter set after every committed change.
pub trait FilterSubscriber: Send + Sync {
    fn on_filters_changed(&self, filters: &[Filter]);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Adding(FilterDraft),
    Editing { id: Uuid, draft: FilterDraft },
}

impl EditorState {
    pub fn draft(&self) -> Option<&FilterDraft> {
        match self {
            EditorState::Idle => None,
            EditorState::Adding(draft) | EditorState::Editing { draft, .. } => Some(draft),
        }
    }
}

pub struct FilterManager {
    schema: FilterSchema,
    defaults: Vec<PresetFilter>,
    filters: Vec<Filter>,
    state: EditorState,
    subscribers: Vec<Arc<dyn FilterSubscriber>>,
}

impl FilterManager {
    /// Starts with fresh copies of `defaults` committed.
    pub fn new(schema: FilterSchema, defaults: Vec<PresetFilter>) -> Self {
        let filters = defaults.iter().map(PresetFilter::to_filter).collect();
        Self {
            schema,
            defaults,
            filters,
            state: EditorState::Idle,
            subscribers: Vec::new(),
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn FilterSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Open the popup for a new filter. Any open draft is discarded.
    pub fn begin_add(&mut self) {
        self.state = EditorState::Adding(FilterDraft::default());
    }

    /// Load a committed filter into the draft for editing.
    pub fn begin_edit(&mut self, id: Uuid) -> Result<(), FilterError> {
        let filter = self
            .filters
            .iter()
            .find(|f| f.id == id)
            .ok_or(FilterError::UnknownFilter(id))?;
        self.state = EditorState::Editing {
            id,
            draft: FilterDraft::from_filter(filter),
        };
        Ok(())
    }

    pub fn set_draft_field(&mut self, field: impl Into<String>) -> Result<(), FilterError> {
        self.draft_mut()?.field = Some(field.into());
        Ok(())
    }

    /// Changing between a scalar operator and "is between" drops the value,
    /// since the two shapes cannot be converted into each other.
    pub fn set_draft_operator(&mut self, operator: FilterOperator) -> Result<(), FilterError> {
        let draft = self.draft_mut()?;
        if draft.operator.takes_range() != operator.takes_range() {
            draft.value = None;
        }
        draft.operator = operator;
        Ok(())
    }

    pub fn set_draft_value(&mut self, value: impl Into<String>) -> Result<(), FilterError> {
        let draft = self.draft_mut()?;
        if draft.operator.takes_range() {
            return Err(FilterError::ValueShapeMismatch {
                operator: draft.operator,
            });
        }
        draft.value = Some(FilterValue::Scalar(value.into()));
        Ok(())
    }

    pub fn set_draft_range(
        &mut self,
        min: impl Into<String>,
        max: impl Into<String>,
    ) -> Result<(), FilterError> {
        let draft = self.draft_mut()?;
        if !draft.operator.takes_range() {
            return Err(FilterError::ValueShapeMismatch {
                operator: draft.operator,
            });
        }
        draft.value = Some(FilterValue::range(min, max));
        Ok(())
    }

    /// Commit the draft. Returns the id of the added or edited filter.
    ///
    /// An incomplete draft is refused and left open so the user can finish it.
    pub fn confirm(&mut self) -> Result<Uuid, FilterError> {
        let (editing, draft) = match &self.state {
            EditorState::Idle => return Err(FilterError::NoDraft),
            EditorState::Adding(draft) => (None, draft),
            EditorState::Editing { id, draft } => (Some(*id), draft),
        };

        if !draft.is_complete() {
            tracing::warn!("Refusing to commit filter without field and value");
            return Err(FilterError::IncompleteDraft);
        }
        let (Some(field), Some(value)) = (draft.field.as_deref(), draft.value.as_ref()) else {
            return Err(FilterError::IncompleteDraft);
        };
        let field = field.trim().to_string();
        if !self.schema.allows(&field) {
            return Err(FilterError::UnknownField(field));
        }
        let operator = draft.operator;
        let value = value.clone();

        let id = match editing {
            None => {
                let filter = Filter::new(field, operator, value);
                let id = filter.id;
                self.filters.push(filter);
                id
            }
            Some(id) => {
                let filter = self
                    .filters
                    .iter_mut()
                    .find(|f| f.id == id)
                    .ok_or(FilterError::UnknownFilter(id))?;
                filter.field = field;
                filter.operator = operator;
                filter.value = value;
                id
            }
        };

        self.state = EditorState::Idle;
        self.notify();
        Ok(id)
    }

    /// Close the popup without touching the committed filters.
    pub fn cancel(&mut self) {
        self.state = EditorState::Idle;
    }

    pub fn remove(&mut self, id: Uuid) -> Result<(), FilterError> {
        let index = self
            .filters
            .iter()
            .position(|f| f.id == id)
            .ok_or(FilterError::UnknownFilter(id))?;
        self.filters.remove(index);
        if matches!(self.state, EditorState::Editing { id: editing, .. } if editing == id) {
            self.state = EditorState::Idle;
        }
        self.notify();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.filters.clear();
        self.state = EditorState::Idle;
        self.notify();
    }

    pub fn reset_to_default(&mut self) {
        self.filters = self.defaults.iter().map(PresetFilter::to_filter).collect();
        self.state = EditorState::Idle;
        self.notify();
    }

    /// Replace every committed filter with fresh copies of the preset's.
    ///
    /// Filters on fields this table does not know are skipped, as `confirm`
    /// would refuse them.
    pub fn apply_preset(&mut self, preset: &FilterPreset) {
        let (known, unknown): (Vec<&PresetFilter>, Vec<&PresetFilter>) = preset
            .filters
            .iter()
            .partition(|filter| self.schema.allows(&filter.field));
        for filter in &unknown {
            tracing::warn!(preset = %preset.name, field = %filter.field, "Skipping preset filter on unknown field");
        }
        self.filters = known.into_iter().map(PresetFilter::to_filter).collect();
        self.state = EditorState::Idle;
        tracing::debug!(preset = %preset.name, count = self.filters.len(), "Applied filter preset");
        self.notify();
    }

    fn draft_mut(&mut self) -> Result<&mut FilterDraft, FilterError> {
        match &mut self.state {
            EditorState::Idle => Err(FilterError::NoDraft),
            EditorState::Adding(draft) | EditorState::Editing { draft, .. } => Ok(draft),
        }
    }

    fn notify(&self) {
        for subscriber in &self.subscribers {
            subscriber.on_filters_changed(&self.filters);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Vec<Filter>>>,
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn last(&self) -> Vec<Filter> {
            self.calls.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    impl FilterSubscriber for Recorder {
        fn on_filters_changed(&self, filters: &[Filter]) {
            self.calls.lock().unwrap().push(filters.to_vec());
        }
    }

    fn manager() -> (FilterManager, Arc<Recorder>) {
        let mut manager = FilterManager::new(
            FilterSchema::new(["Status", "Department", "Salary"]),
            Vec::new(),
        );
        let recorder = Arc::new(Recorder::default());
        manager.subscribe(recorder.clone());
        (manager, recorder)
    }

    fn add(manager: &mut FilterManager, field: &str, value: &str) -> Uuid {
        manager.begin_add();
        manager.set_draft_field(field).unwrap();
        manager.set_draft_value(value).unwrap();
        manager.confirm().unwrap()
    }

    #[test]
    fn test_add_filter_commits_and_notifies_once() {
        let (mut manager, recorder) = manager();
        let id = add(&mut manager, "Status", "Active");

        assert_eq!(manager.filters().len(), 1);
        assert_eq!(manager.filters()[0].id, id);
        assert_eq!(manager.filters()[0].operator, FilterOperator::Is);
        assert_eq!(manager.state(), &EditorState::Idle);
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.last(), manager.filters());
    }

    #[test]
    fn test_confirm_with_empty_field_or_value_is_refused() {
        let (mut manager, recorder) = manager();

        manager.begin_add();
        manager.set_draft_value("Active").unwrap();
        assert_eq!(manager.confirm(), Err(FilterError::IncompleteDraft));

        manager.set_draft_field("Status").unwrap();
        manager.set_draft_value("   ").unwrap();
        assert_eq!(manager.confirm(), Err(FilterError::IncompleteDraft));

        assert!(manager.filters().is_empty());
        assert_eq!(recorder.count(), 0);
        assert!(matches!(manager.state(), EditorState::Adding(_)));
    }

    #[test]
    fn test_confirm_without_draft() {
        let (mut manager, _) = manager();
        assert_eq!(manager.confirm(), Err(FilterError::NoDraft));
        assert_eq!(manager.set_draft_field("Status"), Err(FilterError::NoDraft));
    }

    #[test]
    fn test_unknown_field_is_refused() {
        let (mut manager, recorder) = manager();
        manager.begin_add();
        manager.set_draft_field("Shoe size").unwrap();
        manager.set_draft_value("42").unwrap();
        assert_eq!(
            manager.confirm(),
            Err(FilterError::UnknownField("Shoe size".to_string()))
        );
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_operator_switch_reshapes_value() {
        let (mut manager, _) = manager();
        manager.begin_add();
        manager.set_draft_field("Salary").unwrap();
        manager.set_draft_value("5000").unwrap();

        manager.set_draft_operator(FilterOperator::IsBetween).unwrap();
        assert_eq!(manager.state().draft().unwrap().value, None);
        assert_eq!(
            manager.set_draft_value("1"),
            Err(FilterError::ValueShapeMismatch {
                operator: FilterOperator::IsBetween
            })
        );
        manager.set_draft_range("1000", "2000").unwrap();

        manager.set_draft_operator(FilterOperator::Is).unwrap();
        assert_eq!(manager.state().draft().unwrap().value, None);
        assert!(manager.set_draft_range("1", "2").is_err());
    }

    #[test]
    fn test_switch_between_scalar_operators_keeps_value() {
        let (mut manager, _) = manager();
        manager.begin_add();
        manager.set_draft_value("Sales").unwrap();
        manager.set_draft_operator(FilterOperator::Contains).unwrap();
        assert_eq!(
            manager.state().draft().unwrap().value,
            Some(FilterValue::scalar("Sales"))
        );
    }

    #[test]
    fn test_between_filter_commits_range() {
        let (mut manager, _) = manager();
        manager.begin_add();
        manager.set_draft_field("Salary").unwrap();
        manager.set_draft_operator(FilterOperator::IsBetween).unwrap();
        manager.set_draft_range("1000", "").unwrap();
        assert_eq!(manager.confirm(), Err(FilterError::IncompleteDraft));
        manager.set_draft_range("1000", "2000").unwrap();
        manager.confirm().unwrap();
        assert_eq!(manager.filters()[0].value, FilterValue::range("1000", "2000"));
    }

    #[test]
    fn test_edit_replaces_in_place() {
        let (mut manager, recorder) = manager();
        let first = add(&mut manager, "Status", "Active");
        let second = add(&mut manager, "Department", "Sales");

        manager.begin_edit(first).unwrap();
        manager.set_draft_operator(FilterOperator::IsNot).unwrap();
        manager.set_draft_value("Terminated").unwrap();
        assert_eq!(manager.confirm().unwrap(), first);

        let filters = manager.filters();
        assert_eq!(filters[0].id, first);
        assert_eq!(filters[0].operator, FilterOperator::IsNot);
        assert_eq!(filters[0].value, FilterValue::scalar("Terminated"));
        assert_eq!(filters[1].id, second);
        assert_eq!(recorder.count(), 3);
    }

    #[test]
    fn test_cancel_edit_leaves_filter_unchanged() {
        let (mut manager, recorder) = manager();
        let id = add(&mut manager, "Status", "Active");
        let before = manager.filters().to_vec();

        manager.begin_edit(id).unwrap();
        manager.set_draft_value("Inactive").unwrap();
        manager.cancel();

        assert_eq!(manager.filters(), before.as_slice());
        assert_eq!(manager.state(), &EditorState::Idle);
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn test_begin_edit_unknown_filter() {
        let (mut manager, _) = manager();
        let id = Uuid::new_v4();
        assert_eq!(manager.begin_edit(id), Err(FilterError::UnknownFilter(id)));
        assert_eq!(manager.state(), &EditorState::Idle);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let (mut manager, recorder) = manager();
        let a = add(&mut manager, "Status", "Active");
        let b = add(&mut manager, "Department", "Sales");
        let c = add(&mut manager, "Status", "Probation");

        manager.remove(b).unwrap();
        let ids: Vec<Uuid> = manager.filters().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(recorder.count(), 4);
        assert_eq!(recorder.last().len(), 2);

        assert_eq!(manager.remove(b), Err(FilterError::UnknownFilter(b)));
        assert_eq!(recorder.count(), 4);
    }

    #[test]
    fn test_removing_filter_under_edit_closes_editor() {
        let (mut manager, _) = manager();
        let id = add(&mut manager, "Status", "Active");
        manager.begin_edit(id).unwrap();
        manager.remove(id).unwrap();
        assert_eq!(manager.state(), &EditorState::Idle);
    }

    #[test]
    fn test_clear_and_reset_to_default() {
        let defaults = vec![PresetFilter::new(
            "Status",
            FilterOperator::Is,
            FilterValue::scalar("Active"),
        )];
        let mut manager = FilterManager::new(FilterSchema::any(), defaults);
        let recorder = Arc::new(Recorder::default());
        manager.subscribe(recorder.clone());
        let original_id = manager.filters()[0].id;

        manager.clear_all();
        assert!(manager.filters().is_empty());
        assert_eq!(recorder.count(), 1);
        assert!(recorder.last().is_empty());

        manager.reset_to_default();
        assert_eq!(manager.filters().len(), 1);
        assert_eq!(manager.filters()[0].field, "Status");
        assert_ne!(manager.filters()[0].id, original_id);
        assert_eq!(recorder.count(), 2);
    }

    #[test]
    fn test_apply_preset_skips_fields_outside_schema() {
        let (mut manager, recorder) = manager();
        let preset = FilterPreset {
            id: Uuid::new_v4(),
            name: "Mixed".to_string(),
            filters: vec![
                PresetFilter::new("Visa type", FilterOperator::Is, FilterValue::scalar("H-1B")),
                PresetFilter::new("Status", FilterOperator::IsNot, FilterValue::scalar("Terminated")),
            ],
        };

        manager.apply_preset(&preset);

        assert_eq!(manager.filters().len(), 1);
        assert_eq!(manager.filters()[0].field, "Status");
        assert_eq!(recorder.count(), 1);
        assert_eq!(recorder.last().len(), 1);
    }
}
