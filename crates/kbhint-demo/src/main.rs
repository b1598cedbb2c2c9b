//! kbhint demo - scripted session against a simulated page

mod logging;
mod pages;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use kbhint_engine::settings::{Items, migrate_legacy_settings};
use kbhint_engine::{EngineConfig, HintRuntime, JsonFileStore, MemoryStore, SettingsStore};
use serde_json::json;

/// Simulated page to run against
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Site {
    #[default]
    Youtube,
    Whatsapp,
}

#[derive(Parser, Debug)]
#[command(name = "kbhint-demo")]
#[command(about = "Run a scripted session through the hint engine")]
#[command(version)]
struct Args {
    /// Site whose simulated page is loaded
    #[arg(value_enum, default_value_t = Site::Youtube)]
    site: Site,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    /// Engine config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Settings file; in-memory settings when omitted
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let scene = match args.site {
        Site::Youtube => pages::youtube()?,
        Site::Whatsapp => pages::whatsapp()?,
    };

    match &args.store {
        Some(path) => {
            let store = JsonFileStore::open(path).with_context(|| format!("opening {}", path.display()))?;
            run(scene, store, config)
        }
        None => run(scene, MemoryStore::new(), config),
    }
}

fn run<S: SettingsStore>(scene: pages::Scene, mut store: S, config: EngineConfig) -> Result<()> {
    if migrate_legacy_settings(&mut store, &Items::new())? {
        tracing::info!("migrated legacy shortcut mappings");
    }
    store.take_changes();

    let hostname = scene.page.hostname().to_string();
    let mut rt = HintRuntime::new(scene.page, kbhint_sites::default_registry(), store, config);

    rt.start();
    tracing::info!("started, running: {}", rt.is_running());
    rt.finish_loading();
    report(&rt, "dom ready");

    rt.advance_by(2000);
    report(&rt, "bootstrap settled");

    rt.scroll_to(0.0, 240.0);
    rt.advance_by(16);
    report(&rt, "scrolled");

    rt.focus(Some(scene.focus_target));
    rt.focus(None);

    rt.push_hash("#results");
    rt.advance_by(500);
    report(&rt, "navigated");

    rt.set_hidden(true);
    rt.advance_by(1000);
    rt.set_hidden(false);
    rt.advance_by(500);
    report(&rt, "tab revisited");

    let hints: Vec<String> = rt
        .registry()
        .get(&hostname)
        .map(|m| m.list_hints().iter().map(|h| h.id.clone()).collect())
        .unwrap_or_default();
    for hint_id in &hints {
        let off = json!({ "action": "updateHint", "hostname": hostname, "hintId": hint_id, "enabled": false });
        let reply = rt.handle_message_json(&off.to_string())?;
        tracing::info!("disable {}: {:?}", hint_id, reply);

        let on = json!({ "action": "updateHint", "hostname": hostname, "hintId": hint_id, "enabled": true });
        let reply = rt.handle_message_json(&on.to_string())?;
        tracing::info!("enable {}: {:?}", hint_id, reply);
    }

    rt.teardown();
    report(&rt, "torn down");
    Ok(())
}

fn report<S: SettingsStore>(rt: &HintRuntime<S>, label: &str) {
    let stats = rt.stats();
    let summary = json!({
        "at_ms": rt.now(),
        "passes": stats.passes,
        "last_pass_at": stats.last_pass_at,
        "reposition_frames": stats.reposition_frames,
        "signals_coalesced": stats.signals_coalesced,
        "mutations_absorbed": stats.mutations_absorbed,
        "overlays": rt.overlays().len(),
        "pending_tasks": rt.pending_tasks(),
    });
    tracing::info!("{}: {}", label, summary);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["kbhint-demo"]).unwrap();
        assert!(matches!(args.site, Site::Youtube));
        assert!(!args.verbose);
        assert!(args.config.is_none() && args.store.is_none());
    }

    #[test]
    fn test_args_full() {
        let args = Args::try_parse_from([
            "kbhint-demo",
            "whatsapp",
            "-v",
            "--config",
            "engine.json",
            "--store",
            "settings.json",
        ])
        .unwrap();
        assert!(matches!(args.site, Site::Whatsapp));
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("engine.json")));
        assert_eq!(args.store, Some(PathBuf::from("settings.json")));
    }

    #[test]
    fn test_args_reject_unknown_site() {
        assert!(Args::try_parse_from(["kbhint-demo", "example"]).is_err());
        assert!(Args::try_parse_from(["kbhint-demo", "--config"]).is_err());
    }
}
