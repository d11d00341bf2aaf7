use crate::error::ConversionError;
use crate::multipolygon::{GeometryError, build_multipolygon};
use crate::osm::{
    ElementKind, ElementRef, OsmElement, OsmNode, OsmRelation, OsmRelationMember, OsmWay, Tags,
    is_closed_way,
};
use crate::polygon_rules::{AreaKeys, PolygonRules, is_area};
use crate::reference_index::ReferenceIndex;
use crate::rings::{Ring, Role, assemble};
use crate::shape::{Properties, ShapeObject};
use geo::algorithm::orient::{Direction, Orient};
use geo::{Coord, Geometry, GeometryCollection, LineString, MultiPolygon, Point, Polygon};
use log::{Level, LevelFilter};
use std::borrow::Cow;
use std::collections::HashSet;

/// Options for one conversion call.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Drop elements that another output shape consumed.
    pub filter_used_refs: bool,
    /// Abort on the first per-element failure instead of skipping it.
    pub raise_on_failure: bool,
    /// Tag keys kept on relation-derived areas; all tags when `None`.
    pub area_keys: Option<AreaKeys>,
    /// Classifier table; the bundled table when `None`.
    pub polygon_features: Option<PolygonRules>,
    /// Threshold for per-element diagnostics.
    pub log_level: LevelFilter,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            filter_used_refs: true,
            raise_on_failure: false,
            area_keys: None,
            polygon_features: None,
            log_level: LevelFilter::Error,
        }
    }
}

impl ConvertOptions {
    pub(crate) fn polygon_rules(&self) -> Result<Cow<'_, PolygonRules>, ConversionError> {
        match &self.polygon_features {
            Some(rules) => Ok(Cow::Borrowed(rules)),
            None => Ok(Cow::Owned(PolygonRules::bundled()?)),
        }
    }

    pub(crate) fn report(&self, level: Level, message: std::fmt::Arguments<'_>) {
        if level <= self.log_level {
            log::log!(level, "{}", message);
        }
    }
}

/// Elements consumed while building other shapes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedRefs {
    refs: HashSet<(ElementKind, i64)>,
}

impl UsedRefs {
    pub fn insert(&mut self, kind: ElementKind, id: i64) {
        self.refs.insert((kind, id));
    }

    pub fn contains(&self, kind: ElementKind, id: i64) -> bool {
        self.refs.contains(&(kind, id))
    }

    pub fn merge(&mut self, other: UsedRefs) {
        self.refs.extend(other.refs);
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Result of emitting one top-level element, with the references it
/// consumed. A failed element keeps what it claimed before failing.
pub type Emitted = (Result<ShapeObject, ConversionError>, UsedRefs);

/// Builds shapes for top-level elements against a shared, read-only index.
pub struct ShapeEmitter<'a> {
    index: &'a ReferenceIndex<'a>,
    rules: &'a PolygonRules,
    options: &'a ConvertOptions,
}

impl<'a> ShapeEmitter<'a> {
    pub fn new(
        index: &'a ReferenceIndex<'a>,
        rules: &'a PolygonRules,
        options: &'a ConvertOptions,
    ) -> Self {
        ShapeEmitter {
            index,
            rules,
            options,
        }
    }

    /// Shape for one element with its own usage set.
    pub fn emit(&self, element: &OsmElement) -> Emitted {
        let mut used = UsedRefs::default();
        let shape = self.to_shape(element, &mut used);
        (shape, used)
    }

    /// Build the shape for `element`, recording consumed references in `used`.
    pub fn to_shape(
        &self,
        element: &OsmElement,
        used: &mut UsedRefs,
    ) -> Result<ShapeObject, ConversionError> {
        let mut visiting = HashSet::new();
        let geometry = self.geometry(element, used, &mut visiting)?;
        Ok(ShapeObject {
            geometry,
            properties: self.properties(element),
        })
    }

    fn properties(&self, element: &OsmElement) -> Properties {
        let tags = match element {
            OsmElement::Relation(relation) => self.relation_tags(relation),
            _ => element.tags().clone(),
        };
        let node_refs = match element {
            OsmElement::Way(way) if !way.node_refs.is_empty() => Some(way.node_refs.clone()),
            _ => None,
        };
        Properties {
            kind: element.kind(),
            id: element.id(),
            tags,
            node_refs,
            meta: element.meta().clone(),
        }
    }

    fn relation_tags(&self, relation: &OsmRelation) -> Tags {
        match &self.options.area_keys {
            Some(keys) if is_area(&relation.tags, self.rules) => keys.retain(&relation.tags),
            _ => relation.tags.clone(),
        }
    }

    fn geometry(
        &self,
        element: &OsmElement,
        used: &mut UsedRefs,
        visiting: &mut HashSet<i64>,
    ) -> Result<Geometry<f64>, ConversionError> {
        match element {
            OsmElement::Node(node) => Ok(node_geometry(node)),
            OsmElement::Way(way) => self.way_geometry(way, used),
            OsmElement::Relation(relation) => self.relation_geometry(relation, used, visiting),
        }
    }

    fn way_geometry(
        &self,
        way: &OsmWay,
        used: &mut UsedRefs,
    ) -> Result<Geometry<f64>, ConversionError> {
        let element = ElementRef::new(ElementKind::Way, way.id);
        if let Some(center) = way.center {
            return Ok(Geometry::Point(Point::from(center.to_coord())));
        }

        let coords = self.way_coords(way, used)?;
        if coords.len() < 2 {
            return Err(ConversionError::InvalidGeometry {
                element,
                reason: format!("way has {} position(s), need at least two", coords.len()),
            });
        }

        let closed = match &way.geometry {
            Some(geometry) if !geometry.is_empty() => coords.first() == coords.last(),
            _ => is_closed_way(way),
        };
        if closed && is_area(&way.tags, self.rules) {
            let ring = Ring::from_way(way.id, coords, Role::Outer);
            let assembly =
                build_multipolygon(vec![ring]).map_err(|e| geometry_failure(element, e))?;
            return polygons_to_geometry(element, assembly.polygons);
        }

        Ok(Geometry::LineString(LineString::new(coords)))
    }

    fn way_coords(
        &self,
        way: &OsmWay,
        used: &mut UsedRefs,
    ) -> Result<Vec<Coord<f64>>, ConversionError> {
        if let Some(geometry) = &way.geometry
            && !geometry.is_empty()
        {
            return Ok(geometry.iter().map(|position| position.to_coord()).collect());
        }

        // Every referenced node is claimed, even when one of them is missing.
        let mut coords = Vec::with_capacity(way.node_refs.len());
        let mut missing = None;
        for &node_id in &way.node_refs {
            match self.index.node(node_id) {
                Some(node) => {
                    used.insert(ElementKind::Node, node_id);
                    coords.push(node.coord());
                }
                None => {
                    missing.get_or_insert(node_id);
                }
            }
        }

        match missing {
            Some(id) => Err(ConversionError::MissingReference {
                parent: ElementRef::new(ElementKind::Way, way.id),
                kind: ElementKind::Node,
                id,
            }),
            None => Ok(coords),
        }
    }

    fn relation_geometry(
        &self,
        relation: &OsmRelation,
        used: &mut UsedRefs,
        visiting: &mut HashSet<i64>,
    ) -> Result<Geometry<f64>, ConversionError> {
        let element = ElementRef::new(ElementKind::Relation, relation.id);
        if let Some(center) = relation.center {
            return Ok(Geometry::Point(Point::from(center.to_coord())));
        }
        if !visiting.insert(relation.id) {
            return Err(ConversionError::UnsupportedElement {
                element,
                reason: "relation contains itself through its members".to_string(),
            });
        }

        let geometry = if is_area(&relation.tags, self.rules) {
            self.area_relation_geometry(relation, used)
        } else {
            self.collection_relation_geometry(relation, used, visiting)
        };

        visiting.remove(&relation.id);
        geometry
    }

    fn area_relation_geometry(
        &self,
        relation: &OsmRelation,
        used: &mut UsedRefs,
    ) -> Result<Geometry<f64>, ConversionError> {
        let element = ElementRef::new(ElementKind::Relation, relation.id);
        let mut outer = Vec::new();
        let mut inner = Vec::new();

        for member in &relation.members {
            if member.member_type != ElementKind::Way {
                self.options.report(
                    Level::Debug,
                    format_args!(
                        "{element}: ignoring {}/{} member with role '{}' in area relation",
                        member.member_type, member.member_id, member.role
                    ),
                );
                continue;
            }

            let role = match member.role.as_str() {
                "outer" | "" => Role::Outer,
                "inner" => Role::Inner,
                other => {
                    return Err(ConversionError::UnsupportedElement {
                        element,
                        reason: format!("way/{} has unsupported role '{other}'", member.member_id),
                    });
                }
            };

            let coords = match self.index.way(member.member_id) {
                Some(way) => {
                    let coords = self.way_coords(way, used)?;
                    used.insert(ElementKind::Way, way.id);
                    coords
                }
                None => member
                    .inline_coords()
                    .ok_or(ConversionError::MissingReference {
                        parent: element,
                        kind: ElementKind::Way,
                        id: member.member_id,
                    })?,
            };

            let ring = Ring::from_way(member.member_id, coords, role);
            match role {
                Role::Outer => outer.push(ring),
                Role::Inner => inner.push(ring),
            }
        }

        let outer = assemble(outer);
        let inner = assemble(inner);
        if let Some(open) = outer.open.first().or(inner.open.first()) {
            return Err(ConversionError::UnclosedRing {
                element,
                way_ids: open.way_ids.clone(),
            });
        }

        let rings = outer.closed.into_iter().chain(inner.closed).collect();
        let assembly = build_multipolygon(rings).map_err(|e| geometry_failure(element, e))?;
        for orphan in &assembly.orphans {
            self.options.report(
                Level::Warn,
                format_args!(
                    "{element}: inner ring from ways {:?} lies outside every outer ring",
                    orphan.way_ids
                ),
            );
        }

        let oriented = assembly
            .polygons
            .into_iter()
            .map(|polygon| polygon.orient(Direction::Default))
            .collect();
        polygons_to_geometry(element, oriented)
    }

    fn collection_relation_geometry(
        &self,
        relation: &OsmRelation,
        used: &mut UsedRefs,
        visiting: &mut HashSet<i64>,
    ) -> Result<Geometry<f64>, ConversionError> {
        let element = ElementRef::new(ElementKind::Relation, relation.id);
        let mut geometries = Vec::with_capacity(relation.members.len());

        for member in &relation.members {
            let Some(member_element) = self.index.lookup(member.member_type, member.member_id)
            else {
                let geometry =
                    inline_member_geometry(member).ok_or(ConversionError::MissingReference {
                        parent: element,
                        kind: member.member_type,
                        id: member.member_id,
                    })?;
                geometries.push(geometry);
                continue;
            };
            geometries.push(self.geometry(member_element, used, visiting)?);
            if member.member_type != ElementKind::Node {
                used.insert(member.member_type, member.member_id);
            }
        }

        if geometries.is_empty() {
            return Err(ConversionError::InvalidGeometry {
                element,
                reason: "relation has no members".to_string(),
            });
        }
        Ok(Geometry::GeometryCollection(GeometryCollection(geometries)))
    }
}

fn node_geometry(node: &OsmNode) -> Geometry<f64> {
    Geometry::Point(Point::from(node.coord()))
}

// Members absent from the input may still carry their own positions.
fn inline_member_geometry(member: &OsmRelationMember) -> Option<Geometry<f64>> {
    match member.member_type {
        ElementKind::Node => member
            .inline_position()
            .map(|coord| Geometry::Point(Point::from(coord))),
        ElementKind::Way => member
            .inline_coords()
            .filter(|coords| coords.len() >= 2)
            .map(|coords| Geometry::LineString(LineString::new(coords))),
        ElementKind::Relation => None,
    }
}

fn polygons_to_geometry(
    element: ElementRef,
    mut polygons: Vec<Polygon<f64>>,
) -> Result<Geometry<f64>, ConversionError> {
    match polygons.len() {
        0 => Err(ConversionError::InvalidGeometry {
            element,
            reason: "no polygon left after assembly".to_string(),
        }),
        1 => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn geometry_failure(element: ElementRef, error: GeometryError) -> ConversionError {
    match error {
        GeometryError::UnclosedRing(way_ids) => ConversionError::UnclosedRing { element, way_ids },
        GeometryError::NoOuterRing | GeometryError::Invalid(_) => {
            ConversionError::InvalidGeometry {
                element,
                reason: error.to_string(),
            }
        }
    }
}

/// Convert an element graph into shapes, one per element in input order.
///
/// Per-element failures are skipped (and reported at `options.log_level`)
/// unless `options.raise_on_failure` is set. With `filter_used_refs`, elements
/// consumed by another shape are left out, including references claimed by a
/// shape that then failed.
pub fn convert(
    elements: &[OsmElement],
    options: &ConvertOptions,
) -> Result<Vec<ShapeObject>, ConversionError> {
    let rules = options.polygon_rules()?;
    let index = ReferenceIndex::build(elements);
    let emitter = ShapeEmitter::new(&index, &rules, options);

    let emitted: Vec<Emitted> = elements.iter().map(|element| emitter.emit(element)).collect();
    collect_shapes(emitted, options)
}

pub(crate) fn collect_shapes(
    emitted: Vec<Emitted>,
    options: &ConvertOptions,
) -> Result<Vec<ShapeObject>, ConversionError> {
    let mut used = UsedRefs::default();
    let mut shapes = Vec::with_capacity(emitted.len());

    for (result, consumed) in emitted {
        used.merge(consumed);
        match result {
            Ok(shape) => shapes.push(shape),
            Err(error) if options.raise_on_failure => return Err(error),
            Err(error) => {
                options.report(Level::Warn, format_args!("Element not converted: {error}"));
            }
        }
    }

    if options.filter_used_refs {
        shapes.retain(|shape| !used.contains(shape.kind(), shape.id()));
    }
    Ok(shapes)
}

/// [`convert`] formatted as a GeoJSON FeatureCollection.
pub fn convert_to_geojson(
    elements: &[OsmElement],
    options: &ConvertOptions,
) -> Result<geojson::FeatureCollection, ConversionError> {
    let shapes = convert(elements, options)?;
    Ok(crate::shape::to_feature_collection(&shapes))
}
