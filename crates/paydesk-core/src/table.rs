//! Remote table state driven by filter notifications.

use std::sync::{Mutex, PoisonError};

use crate::filters::{Filter, FilterOperator, FilterSubscriber, FilterValue};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    pub page: u32,
    pub size: u32,
    pub sort: Option<String>,
    pub filters: Vec<Filter>,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
            filters: Vec::new(),
        }
    }
}

impl TableQuery {
    /// Query string pairs: `page`, `size`, optional `sort`, then one
    /// `filter=<field>:<op>[:<value>]` per filter, in order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs.extend(self.filters.iter().map(|f| ("filter", encode_filter(f))));
        pairs
    }
}

fn encode_filter(filter: &Filter) -> String {
    let code = filter.operator.query_code();
    match (&filter.operator, &filter.value) {
        (FilterOperator::HasAnyValue, _) => format!("{}:{}", filter.field, code),
        (_, FilterValue::Scalar(value)) => format!("{}:{}:{}", filter.field, code, value),
        (_, FilterValue::Range { min, max }) => {
            format!("{}:{}:{}..{}", filter.field, code, min, max)
        }
    }
}

#[derive(Debug, Default)]
struct TableStateInner {
    page: u32,
    filters: Vec<Filter>,
    revision: u64,
}

/// Page index and filter set of one paginated table.
///
/// Every notification replaces the filter set wholesale and jumps back to the
/// first page.
#[derive(Debug)]
pub struct TableState {
    size: u32,
    sort: Option<String>,
    inner: Mutex<TableStateInner>,
}

impl TableState {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            sort: None,
            inner: Mutex::new(TableStateInner::default()),
        }
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn page(&self) -> u32 {
        self.lock().page
    }

    pub fn set_page(&self, page: u32) {
        self.lock().page = page;
    }

    pub fn filters(&self) -> Vec<Filter> {
        self.lock().filters.clone()
    }

    /// Number of filter notifications received so far.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub fn query(&self) -> TableQuery {
        let inner = self.lock();
        TableQuery {
            page: inner.page,
            size: self.size,
            sort: self.sort.clone(),
            filters: inner.filters.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableStateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TableState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl FilterSubscriber for TableState {
    fn on_filters_changed(&self, filters: &[Filter]) {
        let mut inner = self.lock();
        inner.filters = filters.to_vec();
        inner.page = 0;
        inner.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterManager, FilterSchema};
    use std::sync::Arc;

    #[test]
    fn test_query_pairs_encode_filters_in_order() {
        let query = TableQuery {
            page: 2,
            size: 50,
            sort: Some("lastName,asc".to_string()),
            filters: vec![
                Filter::new("Status", FilterOperator::Is, FilterValue::scalar("Active")),
                Filter::new("Salary", FilterOperator::IsBetween, FilterValue::range("10", "20")),
                Filter::new("Visa", FilterOperator::HasAnyValue, FilterValue::scalar("x")),
            ],
        };
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("size", "50".to_string()),
                ("sort", "lastName,asc".to_string()),
                ("filter", "Status:eq:Active".to_string()),
                ("filter", "Salary:between:10..20".to_string()),
                ("filter", "Visa:exists".to_string()),
            ]
        );
    }

    #[test]
    fn test_table_state_follows_filter_manager() {
        let table = Arc::new(TableState::new(25));
        let mut manager = FilterManager::new(FilterSchema::any(), Vec::new());
        manager.subscribe(table.clone());

        table.set_page(3);
        manager.begin_add();
        manager.set_draft_field("Department").unwrap();
        manager.set_draft_value("Payroll").unwrap();
        manager.confirm().unwrap();

        assert_eq!(table.page(), 0);
        assert_eq!(table.revision(), 1);
        let query = table.query();
        assert_eq!(query.size, 25);
        assert_eq!(query.filters, manager.filters());

        manager.clear_all();
        assert!(table.filters().is_empty());
        assert_eq!(table.revision(), 2);
    }
}
