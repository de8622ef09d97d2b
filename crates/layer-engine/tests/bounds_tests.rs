//! Tests for multi-source extent retrieval.

mod common;

use common::{bounds, source, MockSearchService};
use geo_common::BoundingBox;
use layer_engine::{decode_location, encode_location, retrieve_bounds, MapLocation, VolumeProbe};
use test_utils::fixtures::{bbox, datasets};

fn probe(count: u64, extent: BoundingBox) -> VolumeProbe {
    VolumeProbe {
        count,
        bbox: Some(extent),
        ..VolumeProbe::default()
    }
}

#[test]
fn test_no_sources_gives_world_fallback() {
    let service = MockSearchService::new();
    let result = tokio_test::block_on(retrieve_bounds(service.as_ref(), &[]));
    assert_eq!(tokio_test::assert_ok!(result), bounds(bbox::WORLD_FALLBACK));
}

#[tokio::test]
async fn test_empty_sources_give_world_fallback() {
    let service = MockSearchService::new();
    service.set_probe(datasets::TREES, probe(0, bounds(bbox::PARIS)));

    let result = retrieve_bounds(
        service.as_ref(),
        &[source(datasets::TREES), source(datasets::STATIONS)],
    )
    .await
    .unwrap();

    assert_eq!(result, BoundingBox::world_fallback());
}

#[tokio::test]
async fn test_union_of_sources_with_data() {
    let service = MockSearchService::new();
    service.set_probe(datasets::TREES, probe(120, bounds(bbox::PARIS)));
    service.set_probe(datasets::STATIONS, probe(8, bounds(bbox::FRANCE)));
    service.set_probe(datasets::DISTRICTS, probe(0, bounds(bbox::GLOBAL)));

    let result = retrieve_bounds(
        service.as_ref(),
        &[
            source(datasets::TREES),
            source(datasets::STATIONS),
            source(datasets::DISTRICTS),
        ],
    )
    .await
    .unwrap();

    assert_eq!(result, bounds(bbox::FRANCE));
    assert_eq!(service.calls_of("bounding_box").len(), 3);
    assert!(service
        .calls()
        .iter()
        .all(|c| c.query.viewport.is_none()));
}

#[tokio::test]
async fn test_failing_source_fails_the_call() {
    let service = MockSearchService::new();
    service.set_probe(datasets::TREES, probe(120, bounds(bbox::PARIS)));
    service.fail(datasets::STATIONS);

    let result = retrieve_bounds(
        service.as_ref(),
        &[source(datasets::TREES), source(datasets::STATIONS)],
    )
    .await;

    assert!(result.is_err());
    // every probe still ran
    assert_eq!(service.calls().len(), 2);
}

#[test]
fn test_location_reexports() {
    let location = MapLocation::new(geo_common::LatLng::new(48.8566, 2.3522), 12);
    let encoded = encode_location(&location);
    assert_eq!(decode_location(&encoded).unwrap().zoom, 12);
}
