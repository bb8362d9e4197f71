mod host;

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    config::load_settings_from, load_settings, view::UpdateOverlay, ChannelPrompt, Session,
    SessionDeps, UpdateDecision,
};
use host_bridge::LocalEventChannel;
use shared::domain::{ModEntry, ModId};
use tracing_subscriber::EnvFilter;

use crate::host::ScriptedHost;

const SCAN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
struct Args {
    /// JSON array of mod entries the scripted backend reports.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Mod ids to toggle before fusing, in order.
    #[arg(long = "select")]
    select: Vec<String>,
    /// Makes the backend reject the merge with this message.
    #[arg(long)]
    fail_merge: Option<String>,
    /// Version the updater reports as available.
    #[arg(long)]
    offer_update: Option<String>,
    #[arg(long)]
    decline_update: bool,
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn read_catalog(path: Option<&PathBuf>) -> Result<Vec<ModEntry>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse catalog {}", path.display()))
}

async fn wait_for_scan(session: &Session, limit: Duration) -> Result<usize> {
    tokio::time::timeout(limit, async {
        loop {
            if let Some(total) = session.view().await.grid.reported_total() {
                return total;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .context("scan did not complete")
}

/// Toggles each id in order. Fails on ids the scan never reported and on
/// toggles refused because an overlay or notice covers the grid.
async fn apply_selection(session: &Session, ids: &[String]) -> Result<()> {
    for id in ids {
        let id = ModId::from(id.as_str());
        if session.toggle(&id).await.is_some() {
            continue;
        }
        let view = session.view().await;
        if !view.grid.contains(&id) {
            bail!("mod {id} is not in the catalog");
        }
        let blocker = if view.loading.visible {
            "a fusion is in progress"
        } else if view.update != UpdateOverlay::Hidden {
            "the update overlay is open"
        } else {
            "a notice is waiting to be dismissed"
        };
        bail!("mod {id} cannot be toggled while {blocker}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => load_settings_from(path, |key| env::var(key).ok()),
        None => load_settings(),
    };
    let catalog = read_catalog(args.catalog.as_ref())?;

    let events = LocalEventChannel::new();
    let host = Arc::new(
        ScriptedHost::new(events.clone(), catalog)
            .failing_merges(args.fail_merge.clone())
            .offering_update(args.offer_update.clone()),
    );
    let (prompt, answers) = ChannelPrompt::new();
    let decision = if args.decline_update {
        UpdateDecision::Later
    } else {
        UpdateDecision::Accept
    };
    answers.answer(decision).await;

    let session = Session::new(
        SessionDeps {
            bridge: host.clone(),
            events: Arc::new(events),
            updater: Some(host.clone()),
            prompt: Some(Arc::new(prompt)),
            process: host,
        },
        settings,
    );
    session.start().await;

    let total = wait_for_scan(&session, SCAN_TIMEOUT).await?;

    let view = session.view().await;
    println!("{}", view.status.text);
    if let Some(placeholder) = view.grid.placeholder() {
        println!("  {placeholder}");
    }
    for card in view.grid.cards() {
        println!("  [{}] {}", card.entry.id, card.entry.display_title());
    }
    if view.grid.len() != total {
        println!("  ({} cards shown, backend reported {total})", view.grid.len());
    }

    apply_selection(&session, &args.select).await?;

    if !args.select.is_empty() {
        let view = session.view().await;
        println!("{} | {}", view.fusion_button.label, view.status.text);
        let outcome = session.fuse().await;
        tracing::info!(?outcome, "fusion finished");
        if let Some(notice) = session.view().await.notice {
            println!("{}: {}", notice.title, notice.message);
        }
        for cue in session.take_cues().await {
            println!("  cue: {cue:?}");
        }
        session.dismiss_notice().await;
    }

    if let Some(outcome) = session.wait_for_update().await {
        println!("update: {outcome:?}");
    }
    if let Some(notice) = session.view().await.notice {
        println!("{}: {}", notice.title, notice.message);
    }

    session.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
