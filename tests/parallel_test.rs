// Parallel conversion must match the sequential path exactly
mod common;

use common::*;
use osm2geojson::*;

/// A grid of buildings, a road network over the nodes and a few multipolygons.
fn city_block(size: i64) -> Vec<OsmElement> {
    let mut elements = Vec::new();
    let node_id = |x: i64, y: i64| x * 1000 + y + 1;

    for x in 0..=size {
        for y in 0..=size {
            elements.push(node(node_id(x, y), x as f64, y as f64));
        }
    }

    let mut way_id = 1_000_000;
    for x in 0..size {
        for y in 0..size {
            way_id += 1;
            let corners = [
                node_id(x, y),
                node_id(x + 1, y),
                node_id(x + 1, y + 1),
                node_id(x, y + 1),
                node_id(x, y),
            ];
            let tags: &[(&str, &str)] = if (x + y) % 2 == 0 {
                &[("building", "yes")]
            } else {
                &[("highway", "pedestrian")]
            };
            elements.push(way(way_id, &corners, tags));
        }
    }

    for x in 0..size {
        way_id += 1;
        let row: Vec<i64> = (0..=size).map(|y| node_id(x, y)).collect();
        elements.push(way(way_id, &row, &[("highway", "residential")]));
    }

    // Every third building cell also becomes a multipolygon, consuming its way.
    for (n, cell) in (1_000_001..1_000_001 + size * size).step_by(3).enumerate() {
        elements.push(relation(
            5_000 + n as i64,
            vec![member(ElementKind::Way, cell, "outer")],
            &[("type", "multipolygon"), ("landuse", "retail")],
        ));
    }

    // A broken relation to exercise the skip path.
    elements.push(relation(
        9_999,
        vec![member(ElementKind::Way, 42, "outer")],
        &[("type", "multipolygon")],
    ));

    elements
}

#[test]
fn test_parallel_matches_sequential() {
    let elements = city_block(12);
    let options = ConvertOptions::default();

    let sequential = convert(&elements, &options).expect("Sequential conversion");
    let parallel = convert_parallel(&elements, &options).expect("Parallel conversion");

    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);
}

#[test]
fn test_parallel_matches_sequential_unfiltered() {
    let elements = city_block(8);
    let options = ConvertOptions {
        filter_used_refs: false,
        ..Default::default()
    };

    let sequential = convert(&elements, &options).expect("Sequential conversion");
    let parallel = convert_parallel(&elements, &options).expect("Parallel conversion");

    // Everything but the broken relation.
    assert_eq!(sequential.len(), elements.len() - 1);
    assert_eq!(shape_ids(&sequential), shape_ids(&parallel));
    assert_eq!(sequential, parallel);
}

#[test]
fn test_parallel_geojson_is_identical() {
    let elements = city_block(6);
    let options = ConvertOptions::default();

    let sequential = convert_to_geojson(&elements, &options).expect("Sequential conversion");
    let parallel = convert_to_geojson_parallel(&elements, &options).expect("Parallel conversion");

    assert_eq!(
        serde_json::to_string(&sequential).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn test_parallel_raises_first_failure() {
    let elements = city_block(4);
    let options = ConvertOptions {
        raise_on_failure: true,
        ..Default::default()
    };

    match convert_parallel(&elements, &options) {
        Err(ConversionError::MissingReference { parent, id, .. }) => {
            assert_eq!(parent, ElementRef::new(ElementKind::Relation, 9_999));
            assert_eq!(id, 42);
        }
        other => panic!("Expected MissingReference, got {:?}", other.map(|s| s.len())),
    }
}

#[test]
fn test_parallel_in_local_pool() {
    let elements = city_block(5);
    let options = ConvertOptions::default();
    let expected = convert(&elements, &options).expect("Sequential conversion");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(3)
        .build()
        .expect("Failed to build thread pool");
    let parallel = pool
        .install(|| convert_parallel(&elements, &options))
        .expect("Parallel conversion");

    assert_eq!(expected, parallel);
}
