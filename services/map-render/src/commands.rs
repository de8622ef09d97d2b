//! Interactive commands read from stdin.
//!
//! ```text
//! goto 14,48.8530,2.3499          move the map (zoom,lat,lng)
//! draw 48.85,2.34 48.86,2.35 ...  restrict layers to a polygon
//! clear                           lift the polygon restriction
//! refit                           fit the map to the data
//! quit
//! ```

use anyhow::{bail, Context, Result};
use geo_common::{decode_location, LatLng};
use layer_engine::MapEvent;

use crate::config::MapFrame;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Event(MapEvent),
    Refit,
    Quit,
}

/// Parse one input line; blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str, frame: &MapFrame) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match verb {
        "goto" => {
            let location = decode_location(rest)
                .with_context(|| format!("Invalid location '{}'", rest))?;
            Command::Event(MapEvent::ViewportChanged(frame.viewport_at(&location)))
        }
        "draw" => Command::Event(MapEvent::ShapeDrawn(parse_polygon(rest)?)),
        "clear" => Command::Event(MapEvent::ShapeCleared),
        "refit" => Command::Refit,
        "quit" | "exit" => Command::Quit,
        other => bail!("Unknown command '{}'", other),
    };
    Ok(Some(command))
}

fn parse_polygon(input: &str) -> Result<Vec<LatLng>> {
    let vertices = input
        .split_whitespace()
        .map(|pair| {
            let (lat, lng) = pair
                .split_once(',')
                .with_context(|| format!("Expected 'lat,lng', got '{}'", pair))?;
            let lat: f64 = lat.parse().with_context(|| format!("Bad latitude '{}'", lat))?;
            let lng: f64 = lng.parse().with_context(|| format!("Bad longitude '{}'", lng))?;
            Ok(LatLng::new(lat, lng))
        })
        .collect::<Result<Vec<_>>>()?;

    if vertices.len() < 3 {
        bail!("A polygon needs at least 3 vertices, got {}", vertices.len());
    }
    Ok(vertices)
}
