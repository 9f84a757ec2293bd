//! Menu import CLI
//!
//! Runs the import pipeline against a local file with an in-memory store.
//! Prints JSON on stdout; logs go to stderr.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use menu_import::{
    extract_text, ApplySelection, ExistingMenuData, ImportAction, ImportDeps,
    ImportJobOrchestrator, JobStatus, JobStatusView, MemoryStore, MenuComparisonData, MenuStore,
    OpenAiGenerator, SelectionType, VatGroup,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const STORE_ID: &str = "local";
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "menu-import")]
#[command(about = "Import a menu document and diff it against an existing menu")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct MenuArgs {
    /// Menu document (xlsx, csv, json, md, txt)
    file: PathBuf,

    /// Existing menu snapshot as JSON
    #[arg(long)]
    existing: Option<PathBuf>,

    /// VAT groups as a JSON array
    #[arg(long)]
    vat: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text the model would see
    Text {
        file: PathBuf,
    },

    /// Extract and print the comparison against the existing menu
    Extract {
        #[command(flatten)]
        menu: MenuArgs,
    },

    /// Extract, apply selections, and print the resulting menu
    Apply {
        #[command(flatten)]
        menu: MenuArgs,

        /// Selections as a JSON array; defaults to every create and update
        #[arg(long, conflicts_with = "all")]
        selections: Option<PathBuf>,

        /// Also apply entities the diff marked as skip
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,menu_import=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Text { file } => cmd_text(&file),
        Commands::Extract { menu } => cmd_extract(&menu).await,
        Commands::Apply {
            menu,
            selections,
            all,
        } => cmd_apply(&menu, selections.as_deref(), all).await,
    }
}

fn cmd_text(file: &Path) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let document = extract_text(&bytes, file_extension(file)?)?;

    tracing::info!(metadata = ?document.metadata, "Document decoded");
    println!("{}", document.text);
    Ok(())
}

async fn cmd_extract(menu: &MenuArgs) -> Result<()> {
    let (orchestrator, _store) = build(menu)?;
    let view = run_job(&orchestrator, &menu.file).await?;

    println!("{}", serde_json::to_string_pretty(&view.comparison_data)?);
    Ok(())
}

async fn cmd_apply(menu: &MenuArgs, selections: Option<&Path>, all: bool) -> Result<()> {
    let (orchestrator, store) = build(menu)?;
    let view = run_job(&orchestrator, &menu.file).await?;
    let comparison = view
        .comparison_data
        .context("ready job has no comparison data")?;

    let selections = match selections {
        Some(path) => read_json::<Vec<ApplySelection>>(path)?,
        None => select_all(&comparison, all),
    };

    let result = orchestrator
        .apply_changes(STORE_ID, view.id, &selections)
        .await?;
    let menu = store.menu_snapshot(STORE_ID).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "applied": result,
            "menu": menu,
        }))?
    );
    Ok(())
}

fn build(menu: &MenuArgs) -> Result<(ImportJobOrchestrator, Arc<MemoryStore>)> {
    let config = Config::from_env()?;

    let mut generator = OpenAiGenerator::new(&config.openai_api_key);
    if let Some(url) = &config.openai_base_url {
        generator = generator.with_base_url(url);
    }

    let store = Arc::new(MemoryStore::new());
    let bytes = std::fs::read(&menu.file)
        .with_context(|| format!("reading {}", menu.file.display()))?;
    store.put_blob(storage_key(&menu.file), bytes);

    if let Some(path) = &menu.existing {
        store.seed_menu(STORE_ID, read_json::<ExistingMenuData>(path)?);
    }
    if let Some(path) = &menu.vat {
        store.seed_vat_groups(STORE_ID, read_json::<Vec<VatGroup>>(path)?);
    }

    let deps = ImportDeps::with_store(store.clone(), Arc::new(generator));
    Ok((
        ImportJobOrchestrator::with_config(deps, config.import_config()),
        store,
    ))
}

/// Create a job for `file` and wait for extraction to finish.
async fn run_job(orchestrator: &ImportJobOrchestrator, file: &Path) -> Result<JobStatusView> {
    let job_id = orchestrator
        .create_job(
            STORE_ID,
            &file.display().to_string(),
            file_extension(file)?,
            &storage_key(file),
        )
        .await?;

    loop {
        let view = orchestrator.job_status(STORE_ID, job_id).await?;
        match view.status {
            JobStatus::Processing => tokio::time::sleep(POLL_INTERVAL).await,
            JobStatus::Ready => return Ok(view),
            status => bail!(
                "import job ended {}: {}",
                status,
                view.error_message.as_deref().unwrap_or("no error recorded")
            ),
        }
    }
}

/// Selections for every compared entity, optionally including skips.
fn select_all(comparison: &MenuComparisonData, include_skips: bool) -> Vec<ApplySelection> {
    let wanted = |action: ImportAction| include_skips || action != ImportAction::Skip;
    let mut selections = Vec::new();

    for category in &comparison.categories {
        // Items are only written under an applied category
        if wanted(category.action) || category.items.iter().any(|i| wanted(i.action)) {
            selections.push(ApplySelection::apply(
                SelectionType::Category,
                &category.extracted.name,
            ));
        }
        selections.extend(
            category
                .items
                .iter()
                .filter(|i| wanted(i.action))
                .map(|i| ApplySelection::apply(SelectionType::Item, &i.extracted.name)),
        );
    }
    selections.extend(
        comparison
            .option_groups
            .iter()
            .filter(|g| wanted(g.action))
            .map(|g| ApplySelection::apply(SelectionType::OptionGroup, &g.extracted.name)),
    );
    selections
}

fn file_extension(file: &Path) -> Result<&str> {
    file.extension()
        .and_then(|ext| ext.to_str())
        .with_context(|| format!("{} has no file extension", file.display()))
}

fn storage_key(file: &Path) -> String {
    format!("uploads/{}", file.display())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
