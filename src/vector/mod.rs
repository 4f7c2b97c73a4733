//! Reading and writing geometries from OGR vector datasets.
//!
//! ## Reading
//!
//! ```rust, no_run
//! use geomcompare::vector::{extract_geometries, LayerFilter, LayerFilters, LayerId};
//!
//! let filters = LayerFilters::new([LayerFilter::for_layer("roads")
//!     .with_attribute_filter("highway = 'primary'")])
//! .unwrap();
//! let layers = [LayerId::from("roads")];
//! for geometry in extract_geometries("roads.gpkg", "GPKG", Some(&layers), Some(filters)).unwrap() {
//!     println!("{}", geometry.unwrap().wkt().unwrap());
//! }
//! ```
//!
//! ## Writing
//!
//! ```rust, no_run
//! use gdal::vector::Geometry;
//! use geomcompare::vector::{write_geometries, WriteMode};
//!
//! let points = vec![
//!     Geometry::from_wkt("POINT (1 1)").unwrap(),
//!     Geometry::from_wkt("POINT (2 2)").unwrap(),
//! ];
//! write_geometries(points, 4326, "points.geojson", "GeoJSON", "points", WriteMode::Overwrite).unwrap();
//! ```

use gdal::vector::{Geometry, LayerAccess};

use crate::errors::Result;

mod extract;
mod filter;
mod write;

pub use extract::{extract_geometries, FileGeometries};
pub use filter::{LayerFilter, LayerFilters, LayerId};
pub use write::{write_geometries, WriteMode};

/// Returns the EPSG code of the layer's spatial reference, if it has one
/// that GDAL can identify.
pub fn layer_epsg<L: LayerAccess>(layer: &L) -> Option<u32> {
    let mut srs = layer.spatial_ref()?;
    srs.auto_identify_epsg().ok()?;
    srs.auth_code().ok().and_then(|code| u32::try_from(code).ok())
}

/// Copies `geometry` through its WKB encoding, detaching it from the
/// spatial reference and feature it came from.
pub(crate) fn decode_geometry(geometry: &Geometry) -> Result<Geometry> {
    Ok(Geometry::from_wkb(&geometry.wkb()?)?)
}
