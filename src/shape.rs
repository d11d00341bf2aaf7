use crate::osm::{ElementKind, ElementMeta, Tags};
use geo::Geometry;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};

/// Properties record carried next to a shape's geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Properties {
    pub kind: ElementKind,
    pub id: i64,
    pub tags: Tags,
    pub node_refs: Option<Vec<i64>>,
    pub meta: ElementMeta,
}

impl Properties {
    /// Feature properties: `type`, `id`, `tags`, way `nodes`, then whichever
    /// metadata fields are present.
    pub fn to_json_object(&self) -> JsonObject {
        let mut object = JsonObject::new();
        object.insert("type".to_string(), JsonValue::from(self.kind.as_str()));
        object.insert("id".to_string(), JsonValue::from(self.id));

        let tags: JsonObject = self
            .tags
            .iter()
            .map(|(key, value)| (key.clone(), JsonValue::from(value.as_str())))
            .collect();
        object.insert("tags".to_string(), JsonValue::Object(tags));

        if let Some(node_refs) = &self.node_refs {
            object.insert("nodes".to_string(), JsonValue::from(node_refs.clone()));
        }

        let meta = &self.meta;
        if let Some(timestamp) = &meta.timestamp {
            object.insert("timestamp".to_string(), JsonValue::from(timestamp.as_str()));
        }
        if let Some(version) = meta.version {
            object.insert("version".to_string(), JsonValue::from(version));
        }
        if let Some(changeset) = meta.changeset {
            object.insert("changeset".to_string(), JsonValue::from(changeset));
        }
        if let Some(user) = &meta.user {
            object.insert("user".to_string(), JsonValue::from(user.as_str()));
        }
        if let Some(uid) = meta.uid {
            object.insert("uid".to_string(), JsonValue::from(uid));
        }
        object
    }
}

/// Geometry of one element paired with its properties.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeObject {
    pub geometry: Geometry<f64>,
    pub properties: Properties,
}

impl ShapeObject {
    pub fn kind(&self) -> ElementKind {
        self.properties.kind
    }

    pub fn id(&self) -> i64 {
        self.properties.id
    }

    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&self.geometry))),
            id: None,
            properties: Some(self.properties.to_json_object()),
            foreign_members: None,
        }
    }
}

pub fn to_feature_collection(shapes: &[ShapeObject]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: shapes.iter().map(ShapeObject::to_feature).collect(),
        foreign_members: None,
    }
}

/// Name of the GeoJSON geometry type, e.g. `"Polygon"`.
pub fn geometry_type(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}
