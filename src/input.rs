use crate::osm::{
    ElementKind, ElementMeta, LatLon, OsmElement, OsmNode, OsmRelation, OsmRelationMember, OsmWay,
    Tags,
};
use anyhow::{Context, Result, anyhow, bail};
use osmpbf::{Element, ElementReader};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    OverpassJson,
    OsmXml,
    Pbf,
}

impl InputFormat {
    /// Guess from the file extension.
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.ends_with(".json") {
            Some(InputFormat::OverpassJson)
        } else if name.ends_with(".pbf") {
            Some(InputFormat::Pbf)
        } else if name.ends_with(".osm") || name.ends_with(".xml") {
            Some(InputFormat::OsmXml)
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    Node(OsmNode),
    Way(OsmWay),
    Relation(OsmRelation),
    // `area`, `count`, `timeline` and friends carry no geometry.
    #[serde(other)]
    Other,
}

/// Parse an Overpass JSON response (`{"elements": [...]}`), keeping element order.
pub fn parse_overpass_json(json: &str) -> Result<Vec<OsmElement>> {
    let response: OverpassResponse =
        serde_json::from_str(json).context("Failed to parse Overpass JSON")?;

    Ok(response
        .elements
        .into_iter()
        .filter_map(|element| match element {
            OverpassElement::Node(node) => Some(OsmElement::Node(node)),
            OverpassElement::Way(way) => Some(OsmElement::Way(way)),
            OverpassElement::Relation(relation) => Some(OsmElement::Relation(relation)),
            OverpassElement::Other => None,
        })
        .collect())
}

pub fn read_overpass_json(path: &Path) -> Result<Vec<OsmElement>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    parse_overpass_json(&json)
}

/// Attributes of one XML start tag, by name.
struct XmlAttributes {
    tag: String,
    values: HashMap<String, String>,
}

impl XmlAttributes {
    fn parse(start: &BytesStart) -> Result<Self> {
        let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut values = HashMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.with_context(|| format!("Bad attribute on <{tag}>"))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .with_context(|| format!("Bad value for {key} on <{tag}>"))?;
            values.insert(key, value.into_owned());
        }
        Ok(XmlAttributes { tag, values })
    }

    fn optional<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.values
            .get(key)
            .map(|value| {
                value
                    .parse()
                    .with_context(|| format!("Bad {key}=\"{value}\" on <{}>", self.tag))
            })
            .transpose()
    }

    fn required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        self.optional(key)?
            .ok_or_else(|| anyhow!("<{}> is missing the {key} attribute", self.tag))
    }

    fn position(&self) -> Result<Option<LatLon>> {
        match (self.optional("lat")?, self.optional("lon")?) {
            (Some(lat), Some(lon)) => Ok(Some(LatLon { lat, lon })),
            _ => Ok(None),
        }
    }

    fn meta(&self) -> Result<ElementMeta> {
        Ok(ElementMeta {
            timestamp: self.optional("timestamp")?,
            version: self.optional("version")?,
            changeset: self.optional("changeset")?,
            user: self.optional("user")?,
            uid: self.optional("uid")?,
        })
    }

    fn node(&self) -> Result<OsmElement> {
        Ok(OsmElement::Node(OsmNode {
            id: self.required("id")?,
            lat: self.required("lat")?,
            lon: self.required("lon")?,
            tags: Tags::new(),
            meta: self.meta()?,
        }))
    }

    fn way(&self) -> Result<OsmElement> {
        Ok(OsmElement::Way(OsmWay {
            id: self.required("id")?,
            meta: self.meta()?,
            ..Default::default()
        }))
    }

    fn relation(&self) -> Result<OsmElement> {
        Ok(OsmElement::Relation(OsmRelation {
            id: self.required("id")?,
            meta: self.meta()?,
            ..Default::default()
        }))
    }

    fn member(&self) -> Result<OsmRelationMember> {
        let member_type = match self.values.get("type").map(String::as_str) {
            Some("node") => ElementKind::Node,
            Some("way") => ElementKind::Way,
            Some("relation") => ElementKind::Relation,
            other => bail!("Unknown member type {:?}", other),
        };
        let role = self.values.get("role").map_or("", String::as_str);
        let mut member = OsmRelationMember::new(member_type, self.required("ref")?, role);
        member.lat = self.optional("lat")?;
        member.lon = self.optional("lon")?;
        Ok(member)
    }
}

/// Parse an OSM XML document (`<osm>` root, as written by the editing API
/// and Overpass), keeping element order.
///
/// `<nd>` children with `lat`/`lon` become inline way or member geometry and
/// `<center>` becomes the element center. Anything else (`bounds`, `meta`,
/// `note`, `area`, `count`) is skipped.
pub fn parse_osm_xml(xml: &str) -> Result<Vec<OsmElement>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut elements = Vec::new();
    let mut current: Option<OsmElement> = None;
    let mut member: Option<OsmRelationMember> = None;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().with_context(|| {
            format!("Failed to parse OSM XML at byte {}", reader.buffer_position())
        })?;
        let (start, empty) = match event {
            Event::Eof => break,
            Event::Start(start) => (start, false),
            Event::Empty(start) => (start, true),
            Event::End(end) => {
                match end.name().as_ref() {
                    b"member" => {
                        if let (Some(finished), Some(OsmElement::Relation(relation))) =
                            (member.take(), current.as_mut())
                        {
                            relation.members.push(finished);
                        }
                    }
                    b"node" | b"way" | b"relation" => elements.extend(current.take()),
                    _ => {}
                }
                continue;
            }
            _ => continue,
        };

        let attributes = XmlAttributes::parse(&start)?;
        if !seen_root {
            if attributes.tag != "osm" {
                bail!("OSM root element not found, got <{}>", attributes.tag);
            }
            seen_root = true;
            continue;
        }

        match attributes.tag.as_str() {
            "node" | "way" | "relation" => {
                let element = match attributes.tag.as_str() {
                    "node" => attributes.node()?,
                    "way" => attributes.way()?,
                    _ => attributes.relation()?,
                };
                if empty {
                    elements.push(element);
                } else {
                    current = Some(element);
                }
            }
            "tag" => {
                let key: String = attributes.required("k")?;
                let value: String = attributes.required("v")?;
                if let Some(element) = current.as_mut() {
                    element.tags_mut().insert(key, value);
                }
            }
            "nd" => {
                let position = attributes.position()?;
                if let Some(member) = member.as_mut() {
                    if let Some(position) = position {
                        member.geometry.get_or_insert_with(Vec::new).push(position);
                    }
                } else if let Some(OsmElement::Way(way)) = current.as_mut() {
                    if let Some(position) = position {
                        way.geometry.get_or_insert_with(Vec::new).push(position);
                    }
                    way.node_refs.extend(attributes.optional::<i64>("ref")?);
                }
            }
            "member" => {
                let parsed = attributes.member()?;
                if empty {
                    if let Some(OsmElement::Relation(relation)) = current.as_mut() {
                        relation.members.push(parsed);
                    }
                } else {
                    member = Some(parsed);
                }
            }
            "center" => {
                let center = attributes.position()?;
                match current.as_mut() {
                    Some(OsmElement::Way(way)) => way.center = center,
                    Some(OsmElement::Relation(relation)) => relation.center = center,
                    _ => {}
                }
            }
            _ => {}
        }
    }

    if !seen_root {
        bail!("OSM root element not found");
    }
    Ok(elements)
}

pub fn read_osm_xml(path: &Path) -> Result<Vec<OsmElement>> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    parse_osm_xml(&xml)
}

/// Read every element of a PBF file, in file order.
pub fn read_pbf(path: &Path) -> Result<Vec<OsmElement>> {
    let reader = ElementReader::from_path(path).context("Failed to open PBF file")?;
    let mut elements = Vec::new();
    reader
        .for_each(|element| elements.push(pbf_element(element)))
        .context("Failed to decode PBF file")?;
    Ok(elements)
}

pub fn read_elements(path: &Path, format: InputFormat) -> Result<Vec<OsmElement>> {
    match format {
        InputFormat::OverpassJson => read_overpass_json(path),
        InputFormat::OsmXml => read_osm_xml(path),
        InputFormat::Pbf => read_pbf(path),
    }
}

fn pbf_tags<'a>(tags: impl Iterator<Item = (&'a str, &'a str)>) -> Tags {
    tags.map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn pbf_element(element: Element) -> OsmElement {
    match element {
        Element::Node(node) => OsmElement::Node(OsmNode {
            id: node.id(),
            lat: node.lat(),
            lon: node.lon(),
            tags: pbf_tags(node.tags()),
            ..Default::default()
        }),
        Element::DenseNode(dense_node) => OsmElement::Node(OsmNode {
            id: dense_node.id(),
            lat: dense_node.lat(),
            lon: dense_node.lon(),
            tags: pbf_tags(dense_node.tags()),
            ..Default::default()
        }),
        Element::Way(way) => OsmElement::Way(OsmWay {
            id: way.id(),
            node_refs: way.refs().collect(),
            tags: pbf_tags(way.tags()),
            ..Default::default()
        }),
        Element::Relation(relation) => {
            let members = relation
                .members()
                .map(|member| {
                    let member_type = match member.member_type {
                        osmpbf::RelMemberType::Node => ElementKind::Node,
                        osmpbf::RelMemberType::Way => ElementKind::Way,
                        osmpbf::RelMemberType::Relation => ElementKind::Relation,
                    };
                    OsmRelationMember::new(
                        member_type,
                        member.member_id,
                        member.role().unwrap_or(""),
                    )
                })
                .collect();

            OsmElement::Relation(OsmRelation {
                id: relation.id(),
                members,
                tags: pbf_tags(relation.tags()),
                ..Default::default()
            })
        }
    }
}
