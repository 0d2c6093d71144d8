use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ivr_kernel::kernel::config::MenuConfig;
use ivr_kernel::services::collect::{Collector, HttpCollector, ScriptedCollector};
use ivr_kernel::{Call, CollectResult, InteractionEngine, InteractionContext, Outcome};

const DEMO_MENU: &str = r#"{
    "prompts": ["Where would you like to go?", "Sorry, where was that?", "Which city would you like to fly to?"],
    "grammar": "cities",
    "barge_in": true,
    "timeout_ms": 5000
}"#;

/// Per-run state for the driver: what the menu decided to say afterwards.
#[derive(Debug, Default)]
struct Announcements {
    said: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    tracing::info!("IVR kernel booting...");

    // Menu: JSON path from argv, else the demo menu
    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("reading menu {}", path))?,
        None => DEMO_MENU.to_string(),
    };
    let menu = MenuConfig::from_json(&raw)?
        .into_builder::<Announcements>()
        .on_complete(|ctx, result| {
            if let Some(city) = result.utterance().and_then(|u| u.text()) {
                ctx.state.said.push(format!("Let's go to {}", city));
            }
        })
        .on_failure(|ctx| {
            ctx.state
                .said
                .push("Sorry, I couldn't understand. I'll put you through to a human.".to_string());
        })
        .build()?;

    // Collaborator: a media server if configured, else a canned script
    let collector: Arc<dyn Collector> = match std::env::var("IVR_COLLECT_URL") {
        Ok(url) => {
            tracing::info!("Collecting via {}", url);
            Arc::new(HttpCollector::new(url)?)
        }
        Err(_) => {
            tracing::info!("IVR_COLLECT_URL not set, using scripted collector");
            Arc::new(ScriptedCollector::new([CollectResult::NoInput, CollectResult::matched("Paris")]))
        }
    };

    let call = Call::new();
    let mut engine = InteractionEngine::new(Arc::new(menu), InteractionContext::new(call, Announcements::default()))
        .with_shared_collector(collector);

    let outcome = engine.run().await?;
    match &outcome {
        Outcome::Complete(_) => tracing::info!("Caller answered"),
        Outcome::Failed(last) => tracing::info!("Caller gave up after {:?}", last.kind()),
        Outcome::Stopped => tracing::info!("Prompt stopped"),
    }

    let stats = engine.telemetry.snapshot();
    tracing::info!(
        attempts = stats.attempts,
        no_input = stats.no_input,
        no_match = stats.no_match,
        rejected = stats.rejected,
        "Interaction finished"
    );

    for line in engine.into_context().into_state().said {
        println!("[SAY] {}", line);
    }

    Ok(())
}
