// Parallel shape construction over a shared reference index
use crate::converter::{ConvertOptions, Emitted, ShapeEmitter, collect_shapes};
use crate::error::ConversionError;
use crate::osm::OsmElement;
use crate::reference_index::ReferenceIndex;
use crate::shape::ShapeObject;
use rayon::prelude::*;

/// Same output as [`crate::convert`], with elements spread over the rayon
/// pool.
///
/// The index is read-only, so workers share it without locking. Every
/// element gets its own usage set; results are collected in input order and
/// the sets merged afterwards, which keeps output order and failure
/// reporting identical to the sequential path.
pub fn convert_parallel(
    elements: &[OsmElement],
    options: &ConvertOptions,
) -> Result<Vec<ShapeObject>, ConversionError> {
    let rules = options.polygon_rules()?;
    let index = ReferenceIndex::build(elements);
    let emitter = ShapeEmitter::new(&index, &rules, options);

    let emitted: Vec<Emitted> = elements
        .par_iter()
        .map(|element| emitter.emit(element))
        .collect();

    collect_shapes(emitted, options)
}

/// [`convert_parallel`] formatted as a GeoJSON FeatureCollection.
pub fn convert_to_geojson_parallel(
    elements: &[OsmElement],
    options: &ConvertOptions,
) -> Result<geojson::FeatureCollection, ConversionError> {
    let shapes = convert_parallel(elements, options)?;
    Ok(crate::shape::to_feature_collection(&shapes))
}
