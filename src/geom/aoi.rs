use gdal::vector::{Geometry, ToGdal};
use geo_types::{coord, Rect};

use crate::errors::Result;
use crate::geom::GeometryTransform;

/// A geometry used as a spatial filter, with the EPSG code it is expressed in.
///
/// Without an EPSG code the geometry is assumed to already be in the
/// reference system of whatever it filters.
#[derive(Clone)]
pub struct AreaOfInterest {
    pub geometry: Geometry,
    pub epsg: Option<u32>,
}

impl AreaOfInterest {
    pub fn new(geometry: Geometry, epsg: Option<u32>) -> Self {
        Self { geometry, epsg }
    }

    /// Builds a rectangular area from its west, south, east and north bounds.
    pub fn from_bbox(w: f64, s: f64, e: f64, n: f64, epsg: Option<u32>) -> Result<Self> {
        let rect = Rect::new(coord! { x: w, y: s }, coord! { x: e, y: n });
        let geometry = rect.to_polygon().to_gdal()?;
        Ok(Self { geometry, epsg })
    }

    /// Returns the geometry expressed in `target_epsg`.
    ///
    /// The geometry is returned as is when either code is unknown or both
    /// codes are equal.
    pub(crate) fn geometry_in(&self, target_epsg: Option<u32>) -> Result<Geometry> {
        match (self.epsg, target_epsg) {
            (Some(source), Some(target)) if source != target => {
                GeometryTransform::between(source, target)?.apply(&self.geometry)
            }
            _ => Ok(self.geometry.clone()),
        }
    }
}

impl std::fmt::Debug for AreaOfInterest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AreaOfInterest")
            .field("geometry", &self.geometry.wkt().unwrap_or_default())
            .field("epsg", &self.epsg)
            .finish()
    }
}
