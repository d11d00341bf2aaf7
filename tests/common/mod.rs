#![allow(dead_code)]

use osm2geojson::*;

pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn node(id: i64, lon: f64, lat: f64) -> OsmElement {
    OsmElement::Node(OsmNode {
        id,
        lat,
        lon,
        ..Default::default()
    })
}

pub fn tagged_node(id: i64, lon: f64, lat: f64, pairs: &[(&str, &str)]) -> OsmElement {
    OsmElement::Node(OsmNode {
        id,
        lat,
        lon,
        tags: tags(pairs),
        ..Default::default()
    })
}

pub fn way(id: i64, node_refs: &[i64], pairs: &[(&str, &str)]) -> OsmElement {
    OsmElement::Way(OsmWay {
        id,
        node_refs: node_refs.to_vec(),
        tags: tags(pairs),
        ..Default::default()
    })
}

pub fn member(member_type: ElementKind, member_id: i64, role: &str) -> OsmRelationMember {
    OsmRelationMember::new(member_type, member_id, role)
}

pub fn relation(id: i64, members: Vec<OsmRelationMember>, pairs: &[(&str, &str)]) -> OsmElement {
    OsmElement::Relation(OsmRelation {
        id,
        members,
        tags: tags(pairs),
        ..Default::default()
    })
}

/// Nodes 1..=4 at the corners of the unit square, counter-clockwise from the origin.
pub fn unit_square_nodes() -> Vec<OsmElement> {
    vec![
        node(1, 0.0, 0.0),
        node(2, 1.0, 0.0),
        node(3, 1.0, 1.0),
        node(4, 0.0, 1.0),
    ]
}

/// Nodes `first..first+4` at the corners of an axis-aligned square.
pub fn square_nodes(first: i64, x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<OsmElement> {
    vec![
        node(first, x0, y0),
        node(first + 1, x1, y0),
        node(first + 2, x1, y1),
        node(first + 3, x0, y1),
    ]
}

pub fn shape_ids(shapes: &[ShapeObject]) -> Vec<(ElementKind, i64)> {
    shapes.iter().map(|shape| (shape.kind(), shape.id())).collect()
}
