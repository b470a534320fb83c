use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use object_browser::config::{AppConfig, Command};
use object_browser::models::navigation::BrowseMode;
use object_browser::models::object::ObjectEntry;
use object_browser::paths::{encode_path, file_name, parent_folder};
use object_browser::services::browser::{DownloadDecision, ObjectBrowser};
use object_browser::services::executors::{TransferOutcome, UploadRequest};
use object_browser::services::listing_controller::ListingOrigin;
use object_browser::services::transfer_store::{StoreEvent, TransferStore};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + command ---
    let (cfg, command) = AppConfig::from_env_and_args()?;
    tracing::debug!("Starting object-browser with config: {:?}", cfg);

    let mut browser = ObjectBrowser::create(&cfg).context("building API client")?;
    if let Err(err) = browser.load_permissions().await {
        tracing::debug!("session permissions unavailable: {}", err);
    }

    let progress = tokio::spawn(print_progress(browser.transfers().clone()));

    let result = run(&mut browser, command).await;

    browser.dispose();
    progress.abort();
    result
}

async fn run(browser: &mut ObjectBrowser, command: Command) -> Result<()> {
    match command {
        Command::Ls {
            bucket,
            path,
            rewind,
            show_deleted,
            filter,
        } => {
            if let Some(ts) = rewind {
                let date = DateTime::parse_from_rfc3339(&ts)
                    .with_context(|| format!("parsing rewind timestamp `{}`", ts))?
                    .with_timezone(&Utc);
                browser.controller_mut().set_rewind(&bucket, date);
            }
            browser.controller_mut().set_show_deleted(show_deleted);
            if let Some(filter) = filter {
                browser.controller_mut().set_filter(filter);
            }

            let origin = browser.navigate(&bucket, &encode_path(&path)).await?;
            if origin == ListingOrigin::PermissionFallback {
                println!("(listing denied; showing permitted folders)");
            }

            let controller = browser.controller();
            if let BrowseMode::ObjectDetails { object } = controller.mode() {
                println!("object: {}", object);
                for version in &controller.state().versions {
                    print_entry(version);
                }
                println!("--- {}", controller.state().simple_path);
            }
            for entry in controller.visible_entries() {
                print_entry(entry);
            }
        }
        Command::Versions { bucket, key } => {
            browser.navigate(&bucket, &encode_path(&key)).await?;
            browser.controller_mut().open_versions().await?;
            for version in &browser.controller().state().versions {
                print_entry(version);
            }
        }
        Command::Info { bucket } => {
            browser.navigate(&bucket, "").await?;
            let summary = browser.bucket_summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Upload {
            bucket,
            prefix,
            files,
        } => {
            browser.navigate(&bucket, &encode_path(&prefix)).await?;
            let requests: Vec<_> = files.into_iter().map(UploadRequest::from_path).collect();
            let summary = browser.upload(&requests).await;
            println!("uploaded {}/{}", summary.succeeded, summary.total);
            if let Some(error) = summary.error {
                bail!(error);
            }
        }
        Command::Download {
            bucket,
            keys,
            rename,
        } => {
            let parent = keys
                .first()
                .map(|k| parent_folder(k))
                .unwrap_or_default();
            browser.navigate(&bucket, &encode_path(&parent)).await?;
            let entries: Vec<ObjectEntry> = keys
                .iter()
                .map(|key| {
                    browser
                        .controller()
                        .state()
                        .entries
                        .iter()
                        .find(|e| &e.name == key)
                        .cloned()
                        .unwrap_or_else(|| ObjectEntry {
                            name: key.clone(),
                            ..ObjectEntry::default()
                        })
                })
                .collect();

            let outcomes = match browser.download(&entries).await {
                DownloadDecision::Started(outcomes) => outcomes,
                DownloadDecision::RenameRequired(entry) => match rename {
                    Some(name) => vec![browser.download_renamed(&entry, &name).await],
                    None => bail!(
                        "`{}` is too long to save on this system; pass --rename <NAME>",
                        file_name(&entry.name)
                    ),
                },
            };
            let failed = outcomes
                .iter()
                .filter(|o| matches!(o, TransferOutcome::Failed(_)))
                .count();
            if failed > 0 {
                bail!("{} of {} downloads failed", failed, outcomes.len());
            }
        }
    }
    Ok(())
}

fn print_entry(entry: &ObjectEntry) {
    let modified = entry
        .last_modified
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    let version = entry.version_id.as_deref().unwrap_or("");
    let marker = if entry.delete_flag { " (deleted)" } else { "" };
    println!(
        "{:>12}  {:<25}  {}{}  {}",
        entry.size, modified, entry.name, marker, version
    );
}

/// Print each transfer's state whenever the store changes.
async fn print_progress(store: Arc<TransferStore>) {
    let mut events = store.subscribe();
    loop {
        match events.recv().await {
            Ok(StoreEvent::TransfersChanged) | Err(RecvError::Lagged(_)) => {
                for record in store.snapshot() {
                    let state = match record.error_message() {
                        Some(err) => format!("failed: {err}"),
                        None if record.done() => "done".to_string(),
                        None if record.waiting_for_file() => "waiting".to_string(),
                        None => format!("{}%", record.percentage),
                    };
                    eprintln!("[{}] {} {}", record.id, record.prefix, state);
                }
            }
            Ok(_) => {}
            Err(RecvError::Closed) => break,
        }
    }
}
