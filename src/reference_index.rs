use crate::osm::{ElementKind, OsmElement, OsmNode, OsmRelation, OsmWay};
use std::collections::HashMap;

/// Lookup table from (kind, id) to element, built once per conversion and
/// read-only afterwards. Borrows the input, so it can be shared across
/// worker threads without locking.
pub struct ReferenceIndex<'a> {
    elements: HashMap<(ElementKind, i64), &'a OsmElement>,
}

impl<'a> ReferenceIndex<'a> {
    /// Index all elements in one pass. A later element with the same kind
    /// and id replaces an earlier one.
    pub fn build(elements: &'a [OsmElement]) -> Self {
        let mut index = HashMap::with_capacity(elements.len());
        for element in elements {
            index.insert((element.kind(), element.id()), element);
        }
        ReferenceIndex { elements: index }
    }

    pub fn lookup(&self, kind: ElementKind, id: i64) -> Option<&'a OsmElement> {
        self.elements.get(&(kind, id)).copied()
    }

    pub fn node(&self, id: i64) -> Option<&'a OsmNode> {
        match self.lookup(ElementKind::Node, id) {
            Some(OsmElement::Node(node)) => Some(node),
            _ => None,
        }
    }

    pub fn way(&self, id: i64) -> Option<&'a OsmWay> {
        match self.lookup(ElementKind::Way, id) {
            Some(OsmElement::Way(way)) => Some(way),
            _ => None,
        }
    }

    pub fn relation(&self, id: i64) -> Option<&'a OsmRelation> {
        match self.lookup(ElementKind::Relation, id) {
            Some(OsmElement::Relation(relation)) => Some(relation),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
