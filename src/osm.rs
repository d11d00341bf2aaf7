use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag mapping of an element. Ordered so that output is stable between runs.
pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind and id of an element, displayed as `way/42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: i64,
}

impl ElementRef {
    pub fn new(kind: ElementKind, id: i64) -> Self {
        ElementRef { kind, id }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Latitude/longitude pair as Overpass writes it for `center` and `geometry`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    /// Planar coordinate, x = longitude, y = latitude.
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// Editing metadata, present when the source was exported with `out meta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changeset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OsmNode {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tags: Tags,
    #[serde(flatten)]
    pub meta: ElementMeta,
}

impl OsmNode {
    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OsmWay {
    pub id: i64,
    #[serde(rename = "nodes", default)]
    pub node_refs: Vec<i64>,
    #[serde(default)]
    pub tags: Tags,
    /// Inline node positions (`out geom`); used instead of `node_refs` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<LatLon>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLon>,
    #[serde(flatten)]
    pub meta: ElementMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OsmRelationMember {
    #[serde(rename = "type")]
    pub member_type: ElementKind,
    #[serde(rename = "ref")]
    pub member_id: i64,
    #[serde(default)]
    pub role: String,
    /// Positions of a way member (`out geom`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<LatLon>>,
    /// Position of a node member (`out geom`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl OsmRelationMember {
    pub fn new(member_type: ElementKind, member_id: i64, role: &str) -> Self {
        OsmRelationMember {
            member_type,
            member_id,
            role: role.to_string(),
            geometry: None,
            lat: None,
            lon: None,
        }
    }

    /// Inline way positions, when the member carries any.
    pub fn inline_coords(&self) -> Option<Vec<Coord<f64>>> {
        match &self.geometry {
            Some(geometry) if !geometry.is_empty() => {
                Some(geometry.iter().map(|position| position.to_coord()).collect())
            }
            _ => None,
        }
    }

    /// Inline node position, when the member carries one.
    pub fn inline_position(&self) -> Option<Coord<f64>> {
        Some(Coord {
            x: self.lon?,
            y: self.lat?,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OsmRelation {
    pub id: i64,
    #[serde(default)]
    pub members: Vec<OsmRelationMember>,
    #[serde(default)]
    pub tags: Tags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<LatLon>,
    #[serde(flatten)]
    pub meta: ElementMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OsmElement {
    Node(OsmNode),
    Way(OsmWay),
    Relation(OsmRelation),
}

impl OsmElement {
    pub fn id(&self) -> i64 {
        match self {
            OsmElement::Node(node) => node.id,
            OsmElement::Way(way) => way.id,
            OsmElement::Relation(relation) => relation.id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            OsmElement::Node(_) => ElementKind::Node,
            OsmElement::Way(_) => ElementKind::Way,
            OsmElement::Relation(_) => ElementKind::Relation,
        }
    }

    pub fn element_ref(&self) -> ElementRef {
        ElementRef::new(self.kind(), self.id())
    }

    pub fn tags(&self) -> &Tags {
        match self {
            OsmElement::Node(node) => &node.tags,
            OsmElement::Way(way) => &way.tags,
            OsmElement::Relation(relation) => &relation.tags,
        }
    }

    pub fn tags_mut(&mut self) -> &mut Tags {
        match self {
            OsmElement::Node(node) => &mut node.tags,
            OsmElement::Way(way) => &mut way.tags,
            OsmElement::Relation(relation) => &mut relation.tags,
        }
    }

    pub fn meta(&self) -> &ElementMeta {
        match self {
            OsmElement::Node(node) => &node.meta,
            OsmElement::Way(way) => &way.meta,
            OsmElement::Relation(relation) => &relation.meta,
        }
    }

    pub fn has_tag(&self, key: &str) -> bool {
        self.tags().contains_key(key)
    }

    pub fn get_tag(&self, key: &str) -> Option<&String> {
        self.tags().get(key)
    }
}

impl From<OsmNode> for OsmElement {
    fn from(node: OsmNode) -> Self {
        OsmElement::Node(node)
    }
}

impl From<OsmWay> for OsmElement {
    fn from(way: OsmWay) -> Self {
        OsmElement::Way(way)
    }
}

impl From<OsmRelation> for OsmElement {
    fn from(relation: OsmRelation) -> Self {
        OsmElement::Relation(relation)
    }
}

pub fn is_closed_way(way: &OsmWay) -> bool {
    !way.node_refs.is_empty() && way.node_refs.first() == way.node_refs.last()
}
