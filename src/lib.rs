pub mod converter;
pub mod error;
pub mod input;
pub mod multipolygon;
pub mod osm;
pub mod parallel_converter;
pub mod polygon_rules;
pub mod reference_index;
pub mod rings;
pub mod shape;

pub use converter::*;
pub use error::*;
pub use multipolygon::*;
pub use osm::*;
pub use parallel_converter::*;
pub use polygon_rules::*;
pub use reference_index::*;
pub use rings::*;
pub use shape::*;
