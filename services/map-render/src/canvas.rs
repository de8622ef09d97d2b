//! Headless canvas that writes every visual change as a JSON line.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use geo_common::BoundingBox;
use layer_engine::{MapCanvas, RenderResult, Viewport, VisualHandle};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MapFrame;

/// One line of canvas output.
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum CanvasLine<'a> {
    Add {
        handle: VisualHandle,
        visual: &'a RenderResult,
    },
    Remove {
        handle: VisualHandle,
    },
    Fit {
        bounds: BoundingBox,
        zoom: u8,
    },
}

/// Map canvas backed by a JSON lines writer.
///
/// Fitting bounds moves the canvas viewport, so later renders that read the
/// canvas viewport see the fitted area.
pub struct JsonLinesCanvas<W> {
    out: Mutex<W>,
    frame: MapFrame,
    viewport: Mutex<Viewport>,
    next_handle: AtomicU64,
}

impl<W: Write + Send> JsonLinesCanvas<W> {
    pub fn new(out: W, frame: MapFrame, viewport: Viewport) -> Self {
        Self {
            out: Mutex::new(out),
            frame,
            viewport: Mutex::new(viewport),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Move the canvas, as a user pan or zoom would.
    pub fn set_viewport(&self, viewport: Viewport) {
        *self.viewport.lock().unwrap_or_else(|e| e.into_inner()) = viewport;
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, line: &CanvasLine<'_>) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        let written = serde_json::to_writer(&mut *out, line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(out))
            .and_then(|_| out.flush());
        if let Err(e) = written {
            warn!(error = %e, "Failed to write canvas output");
        }
    }
}

impl<W: Write + Send> MapCanvas for JsonLinesCanvas<W> {
    fn add_layer(&self, visual: RenderResult) -> VisualHandle {
        let handle = VisualHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        debug!(handle = handle.0, primitives = visual.len(), "Attaching visual");
        self.emit(&CanvasLine::Add {
            handle,
            visual: &visual,
        });
        handle
    }

    fn remove_layer(&self, handle: VisualHandle) {
        self.emit(&CanvasLine::Remove { handle });
    }

    fn viewport(&self) -> Viewport {
        *self.viewport.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fit_bounds(&self, bounds: BoundingBox) {
        let zoom = self.frame.fit_zoom(&bounds);
        let viewport = Viewport::from_bounds(bounds, zoom, self.frame.max_zoom);
        self.set_viewport(viewport);
        self.emit(&CanvasLine::Fit { bounds, zoom });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasSize;
    use layer_engine::Primitive;

    fn canvas() -> JsonLinesCanvas<Vec<u8>> {
        let frame = MapFrame {
            size: CanvasSize::default(),
            max_zoom: 18,
        };
        let viewport = Viewport::from_bounds(BoundingBox::new(2.2, 48.8, 2.5, 48.9), 12, 18);
        JsonLinesCanvas::new(Vec::new(), frame, viewport)
    }

    fn lines(canvas: JsonLinesCanvas<Vec<u8>>) -> Vec<serde_json::Value> {
        let out = String::from_utf8(canvas.into_inner()).unwrap();
        out.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_add_and_remove_lines() {
        let canvas = canvas();
        let visual = RenderResult::new(vec![Primitive::TileLayer {
            url_template: "https://tiles/{z}/{x}/{y}.png".to_string(),
            opacity: 1.0,
        }]);

        let first = canvas.add_layer(visual.clone());
        let second = canvas.add_layer(visual);
        canvas.remove_layer(first);

        assert_eq!(first, VisualHandle(1));
        assert_eq!(second, VisualHandle(2));
        let lines = lines(canvas);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["op"], "add");
        assert_eq!(lines[0]["visual"]["primitives"][0]["kind"], "tile_layer");
        assert_eq!(lines[2]["op"], "remove");
        assert_eq!(lines[2]["handle"], 1);
    }

    #[test]
    fn test_fit_moves_viewport() {
        let canvas = canvas();
        let bounds = BoundingBox::new(-5.2, 41.3, 9.6, 51.1);

        canvas.fit_bounds(bounds);

        let viewport = canvas.viewport();
        assert_eq!(viewport.bounds, bounds);
        assert_eq!(viewport.zoom, 6);
        assert_eq!(lines(canvas)[0]["op"], "fit");
    }
}
