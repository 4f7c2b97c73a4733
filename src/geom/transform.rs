use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::vector::Geometry;
use tracing::debug;

use crate::errors::{GeomCompareError, Result};

/// Resolves `epsg` into a spatial reference using traditional GIS axis order
/// (x = easting/longitude, y = northing/latitude).
pub(crate) fn spatial_ref_from_epsg(epsg: u32) -> Result<SpatialRef> {
    let mut srs =
        SpatialRef::from_epsg(epsg).map_err(|_| GeomCompareError::CrsResolution { epsg })?;
    srs.set_axis_mapping_strategy(gdal::spatial_ref::AxisMappingStrategy::TraditionalGisOrder);
    Ok(srs)
}

/// A geometry-to-geometry transformation.
///
/// [`GeometryTransform::Identity`] is the placeholder used when no
/// reprojection is needed, so callers can always go through
/// [`GeometryTransform::apply`].
#[derive(Debug)]
pub enum GeometryTransform {
    Identity,
    Reproject {
        epsg_in: u32,
        epsg_out: u32,
        transform: CoordTransform,
    },
}

impl GeometryTransform {
    /// Builds the reprojection from `epsg_in` to `epsg_out`.
    ///
    /// Coordinates are read and written as (x, y[, z]) whatever the axis
    /// order declared by either reference system.
    pub fn between(epsg_in: u32, epsg_out: u32) -> Result<Self> {
        let source = spatial_ref_from_epsg(epsg_in)?;
        let target = spatial_ref_from_epsg(epsg_out)?;
        let transform = CoordTransform::new(&source, &target)?;
        debug!("built transformation EPSG:{epsg_in} -> EPSG:{epsg_out}");
        Ok(GeometryTransform::Reproject {
            epsg_in,
            epsg_out,
            transform,
        })
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, GeometryTransform::Identity)
    }

    /// Applies the transformation to a copy of `geometry`.
    pub fn apply(&self, geometry: &Geometry) -> Result<Geometry> {
        match self {
            GeometryTransform::Identity => Ok(geometry.clone()),
            GeometryTransform::Reproject { transform, .. } => Ok(geometry.transform(transform)?),
        }
    }
}

/// Returns the reprojection from `epsg_in` to `epsg_out`.
///
/// # Example
/// ```rust, no_run
/// use gdal::vector::Geometry;
/// use geomcompare::geom::get_transform_func;
///
/// let to_mercator = get_transform_func(4326, 3857).unwrap();
/// let point = Geometry::from_wkt("POINT (10 45)").unwrap();
/// let projected = to_mercator.apply(&point).unwrap();
/// ```
pub fn get_transform_func(epsg_in: u32, epsg_out: u32) -> Result<GeometryTransform> {
    GeometryTransform::between(epsg_in, epsg_out)
}

/// Returns `geometry` unchanged.
pub fn identity(geometry: Geometry) -> Geometry {
    geometry
}

/// Whether `geometry` carries a third (z) coordinate.
pub fn has_z(geometry: &Geometry) -> bool {
    unsafe { gdal_sys::OGR_GT_HasZ(geometry.geometry_type()) != 0 }
}

/// Returns a copy of `geometry` with any z coordinate dropped.
pub fn to_2d(geometry: &Geometry) -> Geometry {
    let flat = geometry.clone();
    if has_z(&flat) {
        unsafe { gdal_sys::OGR_G_FlattenTo2D(flat.c_geometry()) };
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_near;

    fn xyz(geometry: &Geometry, idx: usize) -> (f64, f64, f64) {
        geometry.get_point(idx as i32)
    }

    #[test]
    fn test_to_2d_point() {
        let p3d = Geometry::from_wkt("POINT Z (0 1 4.5)").unwrap();
        assert!(has_z(&p3d));
        let p2d = to_2d(&p3d);
        assert!(!has_z(&p2d));
        assert_eq!(p2d.geometry_type(), gdal_sys::OGRwkbGeometryType::wkbPoint);
        let (x, y, _) = xyz(&p2d, 0);
        assert_near!(x, 0.0);
        assert_near!(y, 1.0);
        // the input is left alone
        assert!(has_z(&p3d));
    }

    #[test]
    fn test_to_2d_nested() {
        let poly = Geometry::from_wkt(
            "MULTIPOLYGON Z (((0 0 1, 4 0 1, 4 4 2, 0 0 1)), ((5 5 0, 6 5 0, 6 6 0, 5 5 0)))",
        )
        .unwrap();
        let flat = to_2d(&poly);
        assert!(!has_z(&flat));
        assert_eq!(
            flat.wkt().unwrap(),
            "MULTIPOLYGON (((0 0,4 0,4 4,0 0)),((5 5,6 5,6 6,5 5)))"
        );
    }

    #[test]
    fn test_to_2d_is_noop_on_2d() {
        let line = Geometry::from_wkt("LINESTRING (1 2, 3 4)").unwrap();
        assert_eq!(to_2d(&line).wkt().unwrap(), line.wkt().unwrap());
    }

    #[test]
    fn test_identity() {
        let point = Geometry::from_wkt("POINT (3 4)").unwrap();
        let wkt = point.wkt().unwrap();
        assert_eq!(identity(point).wkt().unwrap(), wkt);

        let placeholder = GeometryTransform::Identity;
        assert!(placeholder.is_identity());
        let line = Geometry::from_wkt("LINESTRING (1 2, 3 4)").unwrap();
        assert_eq!(placeholder.apply(&line).unwrap().wkt().unwrap(), line.wkt().unwrap());
    }

    #[test]
    fn test_axis_order_is_xy() {
        // UTM zone 31N has its central meridian at 3 degrees east
        let transform = get_transform_func(4326, 32631).unwrap();
        let point = Geometry::from_wkt("POINT (3 45)").unwrap();
        let projected = transform.apply(&point).unwrap();
        let (x, y, _) = xyz(&projected, 0);
        assert_near!(x, 500000.0, epsilon = 1e-6);
        assert!(y > 4.9e6 && y < 5.0e6);
    }

    #[test]
    fn test_resolved_srs_reads_lon_lat() {
        let wgs84 = spatial_ref_from_epsg(4326).unwrap();
        let utm = spatial_ref_from_epsg(32631).unwrap();
        let transform = CoordTransform::new(&wgs84, &utm).unwrap();
        let mut point = Geometry::from_wkt("POINT (3 45)").unwrap();
        point.transform_inplace(&transform).unwrap();
        assert_near!(point.get_point(0).0, 500000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_round_trip() {
        let forward = get_transform_func(4326, 3857).unwrap();
        let backward = get_transform_func(3857, 4326).unwrap();
        let line = Geometry::from_wkt("LINESTRING (10 45, 11.5 46.25, -3 -20)").unwrap();

        let projected = forward.apply(&line).unwrap();
        let (x, y, _) = xyz(&projected, 0);
        assert_near!(x, 1113194.9079327357, epsilon = 1e-3);
        assert_near!(y, 5621521.486192066, epsilon = 1e-3);

        let back = backward.apply(&projected).unwrap();
        assert_eq!(back.point_count(), line.point_count());
        for idx in 0..line.point_count() {
            let (x0, y0, _) = xyz(&line, idx);
            let (x1, y1, _) = xyz(&back, idx);
            assert_near!(x0, x1, epsilon = 1e-8);
            assert_near!(y0, y1, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_keeps_z() {
        let transform = get_transform_func(4326, 3857).unwrap();
        let point = Geometry::from_wkt("POINT Z (1 1 12.5)").unwrap();
        let projected = transform.apply(&point).unwrap();
        assert!(has_z(&projected));
        assert_near!(xyz(&projected, 0).2, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_epsg() {
        let _nolog = crate::test_utils::SuppressGDALErrorLog::new();
        assert!(matches!(
            get_transform_func(4326, 999_999),
            Err(GeomCompareError::CrsResolution { epsg: 999_999 })
        ));
        assert!(matches!(
            get_transform_func(123_456_789, 4326),
            Err(GeomCompareError::CrsResolution { epsg: 123_456_789 })
        ));
    }
}
