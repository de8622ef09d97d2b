//! Headless map renderer.
//!
//! Loads a map definition, renders every layer against a search backend and
//! writes the resulting visuals to stdout as JSON lines:
//! - `--once` renders the initial view and exits
//! - otherwise commands read from stdin move the map, draw or clear a filter
//!   polygon and refit, re-rendering layers as they arrive

mod canvas;
mod commands;
mod config;

use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use layer_engine::{
    HttpSearchService, LayerId, MapCanvas, MapEvent, RenderCoordinator, RenderOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use canvas::JsonLinesCanvas;
use commands::{parse_command, Command};
use config::{MapDefinition, MapFrame};

#[derive(Parser, Debug)]
#[command(name = "map-render")]
#[command(about = "Adaptive renderer for server-backed map layers")]
struct Args {
    /// Map definition file (YAML)
    #[arg(short, long, env = "MAP_DEFINITION", default_value = "map.yaml")]
    config: PathBuf,

    /// Initial location as zoom,lat,lng (overrides the definition)
    #[arg(short, long)]
    location: Option<String>,

    /// Fit the map to the layers' data before the first render
    #[arg(long)]
    refit: bool,

    /// Render once and exit (vs reading commands from stdin)
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args)?;

    let definition = MapDefinition::load(&args.config)?;
    let engine = definition.engine_config()?;
    let frame = definition.frame();
    let start = definition.start_location(args.location.as_deref())?;

    let service =
        Arc::new(HttpSearchService::new(&engine).context("Failed to create search client")?);
    let canvas = Arc::new(JsonLinesCanvas::new(
        std::io::stdout(),
        frame,
        frame.viewport_at(&start),
    ));
    let coordinator = Arc::new(RenderCoordinator::new(service, canvas.clone(), engine));

    for layer in definition.layers {
        coordinator.register_layer(layer).await;
    }
    info!(
        layers = coordinator.layer_ids().await.len(),
        zoom = start.zoom,
        "Starting map renderer"
    );

    if args.refit {
        refit(&coordinator).await;
    }

    let outcomes = coordinator.render_all(&canvas.viewport()).await;
    let failed = report(&outcomes);

    if args.once {
        if failed > 0 {
            anyhow::bail!("{} of {} layers failed to render", failed, outcomes.len());
        }
        return Ok(());
    }

    interactive(coordinator, canvas, frame).await
}

fn init_tracing(args: &Args) -> Result<()> {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries canvas output
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if args.json_logs {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Log render outcomes and return the number of failed layers.
fn report(outcomes: &[(LayerId, layer_engine::Result<RenderOutcome>)]) -> usize {
    let mut failed = 0;
    for (id, outcome) in outcomes {
        match outcome {
            Ok(RenderOutcome::Rendered(summary)) => info!(
                layer = %id,
                plan = ?summary.plan,
                primitives = summary.primitives,
                legend = summary.has_legend,
                "Layer rendered"
            ),
            Ok(RenderOutcome::Cancelled) => debug!(layer = %id, "Layer render superseded"),
            Err(e) => {
                failed += 1;
                error!(layer = %id, error = %e, "Layer render failed");
            }
        }
    }
    failed
}

async fn refit(coordinator: &RenderCoordinator) {
    match coordinator.refit().await {
        Ok(bounds) => info!(bounds = %bounds.cache_key(), "Fitted map to data"),
        Err(e) => warn!(error = %e, "Failed to fit map to data"),
    }
}

/// Forward stdin commands to the coordinator's event loop until EOF, `quit`
/// or Ctrl+C.
async fn interactive(
    coordinator: Arc<RenderCoordinator>,
    canvas: Arc<JsonLinesCanvas<Stdout>>,
    frame: MapFrame,
) -> Result<()> {
    let (events_tx, events_rx) = broadcast::channel(64);
    let event_loop = tokio::spawn(Arc::clone(&coordinator).run(events_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Reading commands from stdin");

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        };
        let Some(line) = line else { break };

        match parse_command(&line, &frame) {
            Ok(Some(Command::Event(event))) => {
                if let MapEvent::ViewportChanged(viewport) = &event {
                    canvas.set_viewport(*viewport);
                }
                if events_tx.send(event).is_err() {
                    warn!("Event loop stopped");
                    break;
                }
            }
            Ok(Some(Command::Refit)) => {
                refit(&coordinator).await;
                events_tx
                    .send(MapEvent::ViewportChanged(canvas.viewport()))
                    .ok();
            }
            Ok(Some(Command::Quit)) => break,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring command"),
        }
    }

    drop(events_tx);
    event_loop.await.context("Event loop panicked")?;
    info!("Map renderer stopped");
    Ok(())
}
