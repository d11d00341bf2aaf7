use geo::Coord;
use osm2geojson::rings::*;

fn c(x: f64, y: f64) -> Coord<f64> {
    Coord { x, y }
}

fn segment(way_id: i64, points: &[(f64, f64)]) -> Ring {
    Ring::from_way(
        way_id,
        points.iter().map(|&(x, y)| c(x, y)).collect(),
        Role::Outer,
    )
}

#[test]
fn test_reversed_segments_close_into_one_ring() {
    let assembly = assemble(vec![
        segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
        segment(2, &[(1.0, 1.0), (1.0, 0.0)]),
        segment(3, &[(1.0, 1.0), (0.0, 0.0)]),
    ]);

    assert_eq!(assembly.closed.len(), 1);
    assert!(assembly.open.is_empty());
    assert_eq!(
        assembly.closed[0].coords,
        vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(0.0, 0.0)]
    );
    assert_eq!(assembly.closed[0].way_ids, vec![1, 2, 3]);
}

#[test]
fn test_shuffled_square_closes() {
    // Unit square split into four sides, given out of order and in mixed directions.
    let assembly = assemble(vec![
        segment(3, &[(1.0, 1.0), (0.0, 1.0)]),
        segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
        segment(4, &[(0.0, 0.0), (0.0, 1.0)]),
        segment(2, &[(1.0, 1.0), (1.0, 0.0)]),
    ]);

    assert_eq!(assembly.closed.len(), 1);
    assert!(assembly.open.is_empty());
    let ring = &assembly.closed[0];
    assert!(ring.is_closed());
    assert_eq!(ring.coords.len(), 5);
    let mut ids = ring.way_ids.clone();
    ids.sort();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn test_already_closed_segment_passes_through() {
    let square = segment(
        9,
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)],
    );
    let assembly = assemble(vec![square.clone()]);

    assert_eq!(assembly.closed, vec![square]);
    assert!(assembly.open.is_empty());
}

#[test]
fn test_unclosed_chain_is_reported_open() {
    let assembly = assemble(vec![
        segment(1, &[(0.0, 0.0), (1.0, 0.0)]),
        segment(2, &[(1.0, 0.0), (1.0, 1.0)]),
    ]);

    assert!(assembly.closed.is_empty());
    assert_eq!(assembly.open.len(), 1);
    assert_eq!(
        assembly.open[0].coords,
        vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)]
    );
}

#[test]
fn test_degenerate_segments_are_kept() {
    let point = segment(5, &[(3.0, 3.0)]);
    let zero_length = segment(6, &[(4.0, 4.0), (4.0, 4.0)]);
    let assembly = assemble(vec![point.clone(), zero_length.clone()]);

    assert!(assembly.closed.is_empty());
    assert_eq!(assembly.open, vec![point, zero_length]);
}

#[test]
fn test_closed_rings_follow_input_order() {
    // The first ring is only closed by the last segment, the second one is
    // closed from the start; output still lists them in input order.
    let assembly = assemble(vec![
        segment(1, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
        segment(
            2,
            &[(5.0, 5.0), (6.0, 5.0), (6.0, 6.0), (5.0, 5.0)],
        ),
        segment(3, &[(1.0, 1.0), (0.0, 0.0)]),
    ]);

    assert_eq!(assembly.closed.len(), 2);
    assert_eq!(assembly.closed[0].way_ids, vec![1, 3]);
    assert_eq!(assembly.closed[1].way_ids, vec![2]);
}

#[test]
fn test_two_separate_loops() {
    let assembly = assemble(vec![
        segment(1, &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
        segment(2, &[(10.0, 10.0), (11.0, 10.0), (11.0, 11.0)]),
        segment(3, &[(11.0, 11.0), (10.0, 10.0)]),
        segment(4, &[(0.0, 0.0), (1.0, 1.0)]),
    ]);

    assert_eq!(assembly.closed.len(), 2);
    assert!(assembly.open.is_empty());
    assert_eq!(assembly.closed[0].way_ids, vec![1, 4]);
    assert_eq!(assembly.closed[1].way_ids, vec![2, 3]);
}
