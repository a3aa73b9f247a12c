use paydesk_core::{
    CoreError, ErrorMetadata, FilterError, FilterManager, FilterOperator, FilterPreset,
    FilterValue, KeyValueStore, LogLevel, Notice, NoticeLevel, PresetStore,
};
use uuid::Uuid;

/// One `--filter field:operator:value` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Parse `field:operator:value`. The operator is a label (`is not`) or a
/// query code (`ne`); "is between" values are written `min..max`. Anything
/// after the second colon belongs to the value.
pub fn parse_filter_spec(spec: &str) -> anyhow::Result<FilterSpec> {
    let mut parts = spec.splitn(3, ':');
    let (Some(field), Some(operator), Some(value)) = (parts.next(), parts.next(), parts.next())
    else {
        anyhow::bail!("Invalid filter '{}': expected field:operator:value", spec);
    };

    let operator: FilterOperator = operator.parse().map_err(CoreError::from)?;
    let value = if operator.takes_range() {
        let (min, max) = value.split_once("..").ok_or_else(|| {
            anyhow::anyhow!("Invalid filter '{}': range values are written min..max", spec)
        })?;
        FilterValue::range(min, max)
    } else {
        FilterValue::scalar(value)
    };

    Ok(FilterSpec {
        field: field.trim().to_string(),
        operator,
        value,
    })
}

/// Add a filter the same way the editor popup does, so the usual draft
/// checks apply.
pub fn add_filter(manager: &mut FilterManager, spec: &FilterSpec) -> Result<Uuid, FilterError> {
    manager.begin_add();
    let result = fill_draft(manager, spec).and_then(|()| manager.confirm());
    if result.is_err() {
        manager.cancel();
    }
    result
}

fn fill_draft(manager: &mut FilterManager, spec: &FilterSpec) -> Result<(), FilterError> {
    manager.set_draft_field(spec.field.clone())?;
    manager.set_draft_operator(spec.operator)?;
    match &spec.value {
        FilterValue::Scalar(value) => manager.set_draft_value(value.clone()),
        FilterValue::Range { min, max } => manager.set_draft_range(min.clone(), max.clone()),
    }
}

/// Presets of one table, or the shared collection when `table` is `None`.
pub fn preset_store<S: KeyValueStore>(store: S, table: Option<&str>) -> PresetStore<S> {
    match table {
        Some(table) => PresetStore::namespaced(store, table),
        None => PresetStore::new(store),
    }
}

/// Look a preset up in the table's own collection first, then in the shared
/// one that `presets save` writes to without `--table`.
pub fn find_table_preset<S: KeyValueStore>(
    store: &S,
    table: &str,
    name: &str,
) -> Option<FilterPreset> {
    preset_store(store, Some(table))
        .find(name)
        .or_else(|| preset_store(store, None).find(name))
}

/// Log a failed command and return the line to show the user. Core errors
/// are reported through their client message; anything else in full.
pub fn report_error(err: &anyhow::Error) -> String {
    let Some(core) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<CoreError>())
    else {
        tracing::error!(error = ?err, "Command failed");
        return format!("{:#}", err);
    };
    match core.log_level() {
        LogLevel::Debug => tracing::debug!(code = core.error_code(), error = %err, "Command refused"),
        LogLevel::Warn => tracing::warn!(code = core.error_code(), error = %err, "Command refused"),
        LogLevel::Error => tracing::error!(code = core.error_code(), error = ?err, "Command failed"),
    }
    core.client_message()
}

/// One line per notice, for stderr.
pub fn format_notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Info => "info",
        NoticeLevel::Success => "ok",
        NoticeLevel::Warning => "warning",
        NoticeLevel::Error => "error",
    };
    format!("[{}] {}", tag, notice.message)
}


/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
