//! Paydesk CLI: command-line client for the paydesk HR/payroll backend.
//!
//! Reads PAYDESK_* settings from the environment (or `.env`); session values
//! (token, default company) are kept in `$PAYDESK_STATE_DIR/state.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use paydesk_api_client::{ApiClient, DocumentBrowser, DocumentService};
use paydesk_cli::{
    add_filter, find_table_preset, format_notice, init_tracing, parse_filter_spec, preset_store,
    report_error,
};
use paydesk_core::models::DocumentUpload;
use paydesk_core::{
    period_keys_for_range, weeks_in_month, ClientConfig, CoreError, FileStore, FilterManager,
    FilterSchema, Month, PeriodKey, PeriodSelection, RecordingNotifier, SessionContext, TableState,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "paydesk", about = "Paydesk HR/payroll CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Week-of-month to period key conversions
    Period {
        #[command(subcommand)]
        sub: PeriodCommands,
    },
    /// Period-scoped documents of an employee, candidate, ...
    Docs {
        #[command(subcommand)]
        sub: DocsCommands,
    },
    /// Fetch one page of a filterable list
    Table {
        /// Resource path, e.g. employees
        path: String,
        /// Filter as field:operator:value (repeatable)
        #[arg(long = "filter")]
        filters: Vec<String>,
        /// Apply a saved preset (this table's first, then shared) before the --filter arguments
        #[arg(long)]
        preset: Option<String>,
        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u32,
        /// Rows per page
        #[arg(long, default_value = "20")]
        size: u32,
        /// Sort expression passed through to the backend
        #[arg(long)]
        sort: Option<String>,
    },
    /// Saved filter presets
    Presets {
        #[command(subcommand)]
        sub: PresetCommands,
    },
    /// Stored session values
    Session {
        #[command(subcommand)]
        sub: SessionCommands,
    },
}

#[derive(Subcommand)]
enum PeriodCommands {
    /// Period key for the Nth week of a month
    Resolve {
        year: String,
        /// Month name, e.g. January
        month: String,
        /// Week of the month, 1-5
        week: u32,
    },
    /// Every period key touched by an inclusive date range
    Range { start: NaiveDate, end: NaiveDate },
    /// Number of selectable weeks in a month
    Weeks { year: i32, month: String },
}

#[derive(Args)]
struct DocTarget {
    /// Entity collection in the API path
    #[arg(long, default_value = "employees")]
    collection: String,
    /// Entity id
    entity_id: String,
    /// Period key, e.g. 2025-W5
    #[arg(long, conflicts_with_all = ["year", "month", "week"])]
    period: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    week: Option<u32>,
}

impl DocTarget {
    fn selection(&self) -> anyhow::Result<PeriodSelection> {
        let (Some(year), Some(month), Some(week)) = (&self.year, &self.month, self.week) else {
            anyhow::bail!("Pass --year, --month and --week");
        };
        Ok(PeriodSelection::new(year, month, week).map_err(CoreError::from)?)
    }

    fn period(&self) -> anyhow::Result<PeriodKey> {
        match &self.period {
            Some(key) => Ok(key.parse().map_err(CoreError::from)?),
            None => Ok(self.selection()?.key()),
        }
    }
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List documents for a period
    List {
        #[command(flatten)]
        target: DocTarget,
    },
    /// Upload a file; needs --year/--month/--week
    Upload {
        #[command(flatten)]
        target: DocTarget,
        /// Path to the file to upload
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a document
    Delete {
        #[command(flatten)]
        target: DocTarget,
        #[arg(long)]
        name: String,
    },
    /// Download a document
    View {
        #[command(flatten)]
        target: DocTarget,
        #[arg(long)]
        name: String,
        /// Where to write the file (defaults to its name)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PresetCommands {
    /// List saved presets
    List {
        /// Table the presets belong to
        #[arg(long)]
        table: Option<String>,
    },
    /// Save a filter set under a name
    Save {
        name: String,
        #[arg(long = "filter", required = true)]
        filters: Vec<String>,
        #[arg(long)]
        table: Option<String>,
    },
    /// Delete a preset by id or name
    Delete {
        preset: String,
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Show stored session values
    Show,
    /// Store the bearer token
    SetToken { token: String },
    /// Store the default company
    SetCompany { company: String },
    /// Forget all session values
    Clear,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn filter_manager(specs: &[String]) -> anyhow::Result<FilterManager> {
    let mut manager = FilterManager::new(FilterSchema::any(), Vec::new());
    for spec in specs {
        let spec = parse_filter_spec(spec)?;
        add_filter(&mut manager, &spec)
            .map_err(CoreError::from)
            .with_context(|| format!("Invalid filter on {}", spec.field))?;
    }
    Ok(manager)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let store = FileStore::open(config.state_file())
        .with_context(|| format!("Failed to open state file {}", config.state_file().display()))?;
    let session = SessionContext::load(&store)
        .with_overrides(config.api_token.clone(), config.default_company.clone());
    let notifier = Arc::new(RecordingNotifier::new());

    let result = run(cli.command, &config, &store, session, notifier.clone()).await;
    for notice in notifier.take() {
        eprintln!("{}", format_notice(&notice));
    }
    result.map_err(|e| anyhow::anyhow!(report_error(&e)))
}

async fn run(
    command: Commands,
    config: &ClientConfig,
    store: &FileStore,
    session: SessionContext,
    notifier: Arc<RecordingNotifier>,
) -> anyhow::Result<()> {
    match command {
        Commands::Period { sub } => match sub {
            PeriodCommands::Resolve { year, month, week } => {
                let selection =
                    PeriodSelection::new(&year, &month, week).map_err(CoreError::from)?;
                print_json(&serde_json::json!({
                    "period": selection.key(),
                    "weekStart": selection.start_date(),
                }))?;
            }
            PeriodCommands::Range { start, end } => {
                print_json(&period_keys_for_range(start, end))?;
            }
            PeriodCommands::Weeks { year, month } => {
                let month: Month = month.parse().map_err(CoreError::from)?;
                print_json(&serde_json::json!({ "weeks": weeks_in_month(year, month) }))?;
            }
        },
        Commands::Docs { sub } => {
            let client = ApiClient::from_config(config, &session)?;
            let docs = |collection: &str| {
                DocumentService::new(client.clone(), collection, notifier.clone())
                    .with_blob_ttl(config.blob_url_ttl())
            };
            match sub {
                DocsCommands::List { target } => {
                    let documents = docs(&target.collection)
                        .list_documents_for_period(&target.entity_id, target.period()?)
                        .await;
                    print_json(&documents)?;
                }
                DocsCommands::Upload {
                    target,
                    file,
                    description,
                } => {
                    let upload = DocumentUpload::from_path(&file)?;
                    let mut browser = DocumentBrowser::new(
                        Arc::new(docs(&target.collection)),
                        target.entity_id.clone(),
                        target.selection()?,
                    );
                    if !browser.upload(&upload, &description).await {
                        anyhow::bail!("Upload failed");
                    }
                    print_json(&browser.documents())?;
                }
                DocsCommands::Delete { target, name } => {
                    let deleted = docs(&target.collection)
                        .delete_document(&target.entity_id, target.period()?, &name)
                        .await;
                    print_json(&serde_json::json!({ "success": deleted }))?;
                }
                DocsCommands::View {
                    target,
                    name,
                    output,
                } => {
                    let service = docs(&target.collection);
                    let viewed = service
                        .view_document(&target.entity_id, target.period()?, &name)
                        .await
                        .context("Document could not be opened")?;
                    let bytes = service
                        .blobs()
                        .get(&viewed.url)
                        .context("Document URL was already revoked")?;
                    let output = output.unwrap_or_else(|| PathBuf::from(&viewed.file_name));
                    std::fs::write(&output, &bytes)
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                    service.release(&viewed.url);
                    print_json(&serde_json::json!({
                        "fileName": viewed.file_name,
                        "contentType": viewed.content_type,
                        "size": viewed.len,
                        "savedTo": output,
                    }))?;
                }
            }
        }
        Commands::Table {
            path,
            filters,
            preset,
            page,
            size,
            sort,
        } => {
            let mut table = TableState::new(size);
            if let Some(sort) = sort {
                table = table.with_sort(sort);
            }
            let table = Arc::new(table);

            let mut manager = FilterManager::new(FilterSchema::any(), Vec::new());
            manager.subscribe(table.clone());
            if let Some(name) = preset {
                let saved = find_table_preset(store, &path, &name)
                    .with_context(|| format!("No preset named '{}'", name))?;
                manager.apply_preset(&saved);
            }
            for spec in &filters {
                let spec = parse_filter_spec(spec)?;
                add_filter(&mut manager, &spec)
                    .map_err(CoreError::from)
                    .with_context(|| format!("Invalid filter on {}", spec.field))?;
            }
            table.set_page(page);

            let client = ApiClient::from_config(config, &session)?;
            let rows: paydesk_core::models::Page<serde_json::Value> =
                client.fetch_page(&path, &table.query()).await?;
            print_json(&rows)?;
        }
        Commands::Presets { sub } => match sub {
            PresetCommands::List { table } => {
                print_json(&preset_store(store, table.as_deref()).load())?;
            }
            PresetCommands::Save {
                name,
                filters,
                table,
            } => {
                let manager = filter_manager(&filters)?;
                let saved = preset_store(store, table.as_deref())
                    .save_preset(&name, manager.filters())
                    .map_err(CoreError::from)?;
                print_json(&saved)?;
            }
            PresetCommands::Delete { preset, table } => {
                let presets = preset_store(store, table.as_deref());
                let id = match preset.parse::<Uuid>() {
                    Ok(id) => id,
                    Err(_) => {
                        presets
                            .find(&preset)
                            .with_context(|| format!("No preset named '{}'", preset))?
                            .id
                    }
                };
                let deleted = presets.delete_preset(id).map_err(CoreError::from)?;
                print_json(&serde_json::json!({ "success": deleted }))?;
            }
        },
        Commands::Session { sub } => {
            let mut stored = SessionContext::load(store);
            match sub {
                SessionCommands::Show => {
                    print_json(&serde_json::json!({
                        "tokenSet": session.token.is_some(),
                        "defaultCompany": session.default_company,
                        "stateFile": store.path(),
                    }))?;
                    return Ok(());
                }
                SessionCommands::SetToken { token } => stored.token = Some(token),
                SessionCommands::SetCompany { company } => stored.default_company = Some(company),
                SessionCommands::Clear => stored = SessionContext::default(),
            }
            stored.save(store).map_err(CoreError::from)?;
            tracing::info!(path = %store.path().display(), "Session updated");
        }
    }

    Ok(())
}
