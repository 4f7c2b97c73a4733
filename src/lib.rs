//! Helpers for comparing vector geometries taken from files and PostGIS
//! against a reference dataset.
//!
//! - [`vector`] reads geometries lazily from any OGR vector dataset, with
//!   per-layer spatial, attribute and feature-id filters, and writes
//!   geometries back to a layer.
//! - [`postgis`] streams geometries from a PostGIS column or query.
//! - [`geom`] reprojects geometries, drops their z coordinate and maps
//!   geometry kinds to their OGR codes.
//! - [`stats`] scores the result of a match.
//! - [`logging`] prints the crate's `tracing` events.
//!
//! ## Use
//!
//! ```rust,no_run
//! use geomcompare::geom::AreaOfInterest;
//! use geomcompare::vector::{extract_geometries, write_geometries, LayerFilter, LayerFilters, WriteMode};
//!
//! # fn main() -> geomcompare::errors::Result<()> {
//! let aoi = AreaOfInterest::from_bbox(2.2, 48.8, 2.4, 48.9, Some(4326))?;
//! let filters = LayerFilters::new([LayerFilter::default_filter().with_aoi(aoi)])?;
//! let geometries = extract_geometries("buildings.gpkg", "GPKG", None, Some(filters))?
//!     .collect::<geomcompare::errors::Result<Vec<_>>>()?;
//! write_geometries(geometries, 4326, "subset.gpkg", "GPKG", "buildings", WriteMode::Overwrite)?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod geom;
pub mod logging;
pub mod postgis;
pub mod stats;
pub mod vector;

#[cfg(test)]
mod test_utils;

pub use errors::{GeomCompareError, Result};
