//! Map extent covering several sources.

use futures::future::join_all;
use geo_common::BoundingBox;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::layer::FilteredSource;
use crate::service::{QueryContext, SearchService};

pub use geo_common::{decode_location, encode_location, MapLocation};

/// Union of the extents of every source holding data.
///
/// Sources are probed in parallel. Sources without records do not count;
/// when none has any, the world fallback is returned. A failing probe fails
/// the whole call once every probe has settled.
#[instrument(skip_all, fields(sources = sources.len()))]
pub async fn retrieve_bounds(
    service: &dyn SearchService,
    sources: &[FilteredSource],
) -> Result<BoundingBox> {
    let query = QueryContext::default();
    let probes = join_all(sources.iter().map(|s| service.bounding_box(s, &query))).await;

    let mut running: Option<BoundingBox> = None;
    let mut first_error = None;

    for probe in probes {
        match probe {
            Ok(probe) if probe.count > 0 => {
                if let Some(bbox) = probe.bbox {
                    match running.as_mut() {
                        Some(r) => r.extend(&bbox),
                        None => running = Some(bbox),
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    let bounds = running.unwrap_or_else(BoundingBox::world_fallback);
    debug!(bounds = %bounds.cache_key(), "Retrieved bounds");
    Ok(bounds)
}
