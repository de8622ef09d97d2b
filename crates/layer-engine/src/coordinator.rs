//! Per-layer render scheduling.
//!
//! The coordinator owns every layer's runtime state. Each render cancels the
//! layer's pending render, runs the selected builder under a fresh token and,
//! if still current when it completes, attaches the new visual before
//! detaching the old one.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use geo_common::{BoundingBox, Color, LatLng};
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::bounds::retrieve_bounds;
use crate::builders::{build, build_tiles, BuildContext};
use crate::canvas::{MapCanvas, MapEvent, VisualHandle};
use crate::color::{ColorResolver, Palette};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::layer::{ColorSpec, LayerConfig, LayerId, LayerStrategy};
use crate::render::RenderResult;
use crate::service::{QueryContext, SearchService};
use crate::strategy::{select_plan, RenderPlan};
use crate::viewport::Viewport;

/// Runtime state of one layer.
#[derive(Debug, Default)]
pub struct LayerState {
    /// Visual currently attached to the canvas.
    pub rendered: Option<VisualHandle>,
    pub loading: bool,
    /// Token of the render in flight, if any.
    pending: Option<CancellationToken>,
    /// Incremented by every render; a completion only applies if it still
    /// holds the latest value.
    generation: u64,
}

struct LayerSlot {
    config: LayerConfig,
    resolver: Arc<ColorResolver>,
    state: LayerState,
}

impl LayerSlot {
    fn cancel_pending(&mut self) {
        if let Some(token) = self.state.pending.take() {
            token.cancel();
            debug!(layer = %self.config.id, "Cancelled pending render");
        }
        self.state.loading = false;
    }
}

#[derive(Default)]
struct Registry {
    layers: HashMap<LayerId, LayerSlot>,
    palette: Palette,
    drawn_polygon: Option<Vec<LatLng>>,
}

/// What a completed render attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSummary {
    pub handle: VisualHandle,
    pub plan: RenderPlan,
    pub primitives: usize,
    pub has_legend: bool,
}

/// Outcome of [`RenderCoordinator::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    Rendered(RenderSummary),
    /// Superseded by a newer render, or the layer went away.
    Cancelled,
}

impl RenderOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RenderOutcome::Cancelled)
    }
}

/// Renders registered layers onto a map canvas.
pub struct RenderCoordinator {
    service: Arc<dyn SearchService>,
    canvas: Arc<dyn MapCanvas>,
    config: EngineConfig,
    registry: Mutex<Registry>,
}

impl RenderCoordinator {
    pub fn new(
        service: Arc<dyn SearchService>,
        canvas: Arc<dyn MapCanvas>,
        config: EngineConfig,
    ) -> Self {
        Self {
            service,
            canvas,
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn resolver_for(&self, config: &LayerConfig) -> Arc<ColorResolver> {
        let spec = config
            .color_spec
            .clone()
            .unwrap_or_else(|| ColorSpec::fixed(Color::rgb(0, 0, 0)));
        Arc::new(ColorResolver::new(&spec, self.config.scale_steps))
    }

    /// Register a layer. Layers without a color get the next palette color.
    ///
    /// Registering an existing id replaces its configuration like
    /// [`update_layer`](Self::update_layer).
    pub async fn register_layer(&self, mut config: LayerConfig) -> LayerId {
        let mut registry = self.registry.lock().await;
        let id = config.id.clone();

        if let Some(slot) = registry.layers.get_mut(&id) {
            self.reconfigure(slot, config);
            return id;
        }

        if config.color_spec.is_none() {
            config.color_spec = Some(ColorSpec::fixed(registry.palette.next_color()));
        }
        let slot = LayerSlot {
            resolver: self.resolver_for(&config),
            config,
            state: LayerState::default(),
        };
        registry.layers.insert(id.clone(), slot);

        info!(layer = %id, "Registered layer");
        id
    }

    /// Replace a layer's configuration.
    ///
    /// Cancels its pending render and replaces its color resolver; the
    /// current visual stays until the next render swaps it out.
    pub async fn update_layer(&self, config: LayerConfig) -> Result<()> {
        let mut registry = self.registry.lock().await;
        let slot = registry
            .layers
            .get_mut(&config.id)
            .ok_or_else(|| EngineError::LayerNotFound(config.id.to_string()))?;
        self.reconfigure(slot, config);
        Ok(())
    }

    fn reconfigure(&self, slot: &mut LayerSlot, mut config: LayerConfig) {
        if config.color_spec.is_none() {
            config.color_spec = slot.config.color_spec.clone();
        }

        slot.cancel_pending();
        slot.resolver = self.resolver_for(&config);
        slot.config = config;
        // Completions of renders started under the old configuration are stale
        slot.state.generation += 1;

        debug!(layer = %slot.config.id, "Updated layer");
    }

    /// Cancel a layer's work, detach its visual and forget it.
    pub async fn unregister_layer(&self, id: &LayerId) -> Result<()> {
        let mut registry = self.registry.lock().await;
        let mut slot = registry
            .layers
            .remove(id)
            .ok_or_else(|| EngineError::LayerNotFound(id.to_string()))?;

        slot.cancel_pending();
        if let Some(handle) = slot.state.rendered.take() {
            self.canvas.remove_layer(handle);
        }

        info!(layer = %id, "Unregistered layer");
        Ok(())
    }

    /// Ids of every registered layer.
    pub async fn layer_ids(&self) -> Vec<LayerId> {
        let registry = self.registry.lock().await;
        let mut ids: Vec<LayerId> = registry.layers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Current configuration of a layer.
    pub async fn layer_config(&self, id: &LayerId) -> Option<LayerConfig> {
        let registry = self.registry.lock().await;
        registry.layers.get(id).map(|s| s.config.clone())
    }

    pub async fn is_loading(&self, id: &LayerId) -> Result<bool> {
        let registry = self.registry.lock().await;
        registry
            .layers
            .get(id)
            .map(|s| s.state.loading)
            .ok_or_else(|| EngineError::LayerNotFound(id.to_string()))
    }

    pub async fn rendered_handle(&self, id: &LayerId) -> Result<Option<VisualHandle>> {
        let registry = self.registry.lock().await;
        registry
            .layers
            .get(id)
            .map(|s| s.state.rendered)
            .ok_or_else(|| EngineError::LayerNotFound(id.to_string()))
    }

    /// Restrict every layer to a drawn polygon, or lift the restriction.
    pub async fn set_drawn_polygon(&self, polygon: Option<Vec<LatLng>>) {
        let mut registry = self.registry.lock().await;
        registry.drawn_polygon = polygon;
    }

    /// Attach `visual` in place of the layer's current one.
    fn swap(&self, state: &mut LayerState, visual: RenderResult) -> VisualHandle {
        let handle = self.canvas.add_layer(visual);
        if let Some(old) = state.rendered.replace(handle) {
            self.canvas.remove_layer(old);
        }
        handle
    }

    /// Render one layer for `viewport`.
    ///
    /// Returns `Cancelled` when a newer render of the same layer started
    /// before this one completed. On backend failure the previous visual is
    /// left in place and the error is returned.
    #[instrument(skip(self, viewport), fields(zoom = viewport.zoom))]
    pub async fn render(&self, id: &LayerId, viewport: &Viewport) -> Result<RenderOutcome> {
        let (config, resolver, query, token, generation) = {
            let mut registry = self.registry.lock().await;
            let drawn_polygon = registry.drawn_polygon.clone();
            let slot = registry
                .layers
                .get_mut(id)
                .ok_or_else(|| EngineError::LayerNotFound(id.to_string()))?;

            // Tiles only refresh a URL and stay out of the cancellation discipline
            if slot.config.strategy == LayerStrategy::Tiles {
                let visual = build_tiles(&slot.config)?;
                let primitives = visual.len();
                let handle = self.swap(&mut slot.state, visual);
                return Ok(RenderOutcome::Rendered(RenderSummary {
                    handle,
                    plan: RenderPlan::Tiles,
                    primitives,
                    has_legend: false,
                }));
            }

            slot.cancel_pending();
            let token = CancellationToken::new();
            slot.state.generation += 1;
            slot.state.pending = Some(token.clone());
            slot.state.loading = true;

            let query = QueryContext {
                viewport: Some(viewport.bounds),
                drawn_polygon,
            };
            (
                slot.config.clone(),
                Arc::clone(&slot.resolver),
                query,
                token,
                slot.state.generation,
            )
        };

        resolver.begin_cycle();
        let work = async {
            let plan = select_plan(
                self.service.as_ref(),
                &config,
                viewport,
                &query,
                &self.config,
            )
            .await?;
            let ctx = BuildContext {
                service: self.service.as_ref(),
                layer: &config,
                viewport,
                query: &query,
                config: &self.config,
                resolver: &resolver,
            };
            let visual = build(plan, &ctx).await?;
            Ok::<_, EngineError>((plan, visual))
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(layer = %id, "Render superseded");
                return Ok(RenderOutcome::Cancelled);
            }
            result = work => result,
        };

        let mut registry = self.registry.lock().await;
        let Some(slot) = registry.layers.get_mut(id) else {
            return Ok(RenderOutcome::Cancelled);
        };
        if token.is_cancelled() || slot.state.generation != generation {
            debug!(layer = %id, "Discarding stale render");
            return Ok(RenderOutcome::Cancelled);
        }

        slot.state.pending = None;
        slot.state.loading = false;

        match result {
            Ok((plan, visual)) => {
                let primitives = visual.len();
                let has_legend = visual.legend.is_some();
                let handle = self.swap(&mut slot.state, visual);
                info!(layer = %id, plan = ?plan, primitives, "Rendered layer");
                Ok(RenderOutcome::Rendered(RenderSummary {
                    handle,
                    plan,
                    primitives,
                    has_legend,
                }))
            }
            Err(e) => {
                warn!(layer = %id, error = %e, "Render failed, keeping previous visual");
                Err(e)
            }
        }
    }

    /// Render every layer; each fails independently.
    pub async fn render_all(&self, viewport: &Viewport) -> Vec<(LayerId, Result<RenderOutcome>)> {
        let ids = self.layer_ids().await;
        let outcomes = join_all(ids.iter().map(|id| self.render(id, viewport))).await;
        ids.into_iter().zip(outcomes).collect()
    }

    /// Fit the canvas to the data of every layer not excluded from refits.
    pub async fn refit(&self) -> Result<BoundingBox> {
        let sources: Vec<_> = {
            let registry = self.registry.lock().await;
            let mut slots: Vec<&LayerSlot> = registry
                .layers
                .values()
                .filter(|s| !s.config.exclude_from_refit)
                .collect();
            slots.sort_by(|a, b| a.config.id.cmp(&b.config.id));
            slots.into_iter().map(|s| s.config.source.clone()).collect()
        };

        let bounds = retrieve_bounds(self.service.as_ref(), &sources).await?;
        self.canvas.fit_bounds(bounds);
        Ok(bounds)
    }

    /// Re-render layers as map events arrive, until the channel closes.
    ///
    /// Every event spawns a render of all layers, so a newer viewport
    /// cancels renders still running for an older one.
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<MapEvent>) {
        let mut tasks = JoinSet::new();

        loop {
            let event = tokio::select! {
                event = events.recv() => event,
                // Reap finished renders while waiting
                Some(_) = tasks.join_next(), if !tasks.is_empty() => continue,
            };

            let viewport = match event {
                Ok(MapEvent::ViewportChanged(viewport)) => viewport,
                Ok(MapEvent::ShapeDrawn(polygon)) => {
                    debug!(vertices = polygon.len(), "Drawn shape filter applied");
                    self.set_drawn_polygon(Some(polygon)).await;
                    self.canvas.viewport()
                }
                Ok(MapEvent::ShapeCleared) => {
                    debug!("Drawn shape filter cleared");
                    self.set_drawn_polygon(None).await;
                    self.canvas.viewport()
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Map event receiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let coordinator = Arc::clone(&self);
            tasks.spawn(async move {
                for (id, outcome) in coordinator.render_all(&viewport).await {
                    if let Err(e) = outcome {
                        error!(layer = %id, error = %e, "Layer render failed");
                    }
                }
            });
        }

        while tasks.join_next().await.is_some() {}
        info!("Map event channel closed");
    }
}
