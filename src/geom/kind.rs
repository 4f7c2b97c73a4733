//! Geometry kinds and their OGR `wkb*` type codes.
//!
//! The name/code table is a static and cannot be mutated; lookups in both
//! directions go through [`GeometryKind`].
//!
//! ```
//! use geomcompare::geom::{type_code_of, type_name_of, GeometryKind};
//!
//! assert_eq!(type_code_of("MultiPolygon").unwrap(), 6);
//! assert_eq!(type_name_of(101).unwrap(), "LinearRing");
//! assert_eq!(GeometryKind::from_code(3).unwrap(), GeometryKind::Polygon);
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use gdal::vector::Geometry;
use gdal_sys::OGRwkbGeometryType;

use crate::errors::{GeomCompareError, Result};

/// The geometry kinds a layer can be created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    LinearRing,
}

static REGISTRY: [(GeometryKind, &str, OGRwkbGeometryType::Type); 8] = [
    (GeometryKind::Point, "Point", OGRwkbGeometryType::wkbPoint),
    (GeometryKind::LineString, "LineString", OGRwkbGeometryType::wkbLineString),
    (GeometryKind::Polygon, "Polygon", OGRwkbGeometryType::wkbPolygon),
    (GeometryKind::MultiPoint, "MultiPoint", OGRwkbGeometryType::wkbMultiPoint),
    (
        GeometryKind::MultiLineString,
        "MultiLineString",
        OGRwkbGeometryType::wkbMultiLineString,
    ),
    (
        GeometryKind::MultiPolygon,
        "MultiPolygon",
        OGRwkbGeometryType::wkbMultiPolygon,
    ),
    (
        GeometryKind::GeometryCollection,
        "GeometryCollection",
        OGRwkbGeometryType::wkbGeometryCollection,
    ),
    (GeometryKind::LinearRing, "LinearRing", OGRwkbGeometryType::wkbLinearRing),
];

impl GeometryKind {
    pub const ALL: [GeometryKind; 8] = [
        GeometryKind::Point,
        GeometryKind::LineString,
        GeometryKind::Polygon,
        GeometryKind::MultiPoint,
        GeometryKind::MultiLineString,
        GeometryKind::MultiPolygon,
        GeometryKind::GeometryCollection,
        GeometryKind::LinearRing,
    ];

    fn entry(self) -> &'static (GeometryKind, &'static str, OGRwkbGeometryType::Type) {
        // every variant has exactly one row
        &REGISTRY[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// The OGR geometry type code used when creating a layer of this kind.
    pub fn code(self) -> OGRwkbGeometryType::Type {
        self.entry().2
    }

    pub fn from_name(name: &str) -> Result<Self> {
        REGISTRY
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| GeomCompareError::UnknownGeometryType(name.to_string()))
    }

    pub fn from_code(code: OGRwkbGeometryType::Type) -> Result<Self> {
        REGISTRY
            .iter()
            .find(|(_, _, c)| *c == code)
            .map(|(kind, _, _)| *kind)
            .ok_or_else(|| GeomCompareError::UnknownGeometryType(code.to_string()))
    }

    /// Detects the kind of `geometry`, ignoring any Z or M dimension.
    ///
    /// OGR reports standalone linear rings as line strings, so they are
    /// recognised by name.
    pub fn of(geometry: &Geometry) -> Result<Self> {
        if geometry.geometry_name().eq_ignore_ascii_case("LINEARRING") {
            return Ok(GeometryKind::LinearRing);
        }
        let flat = unsafe { gdal_sys::OGR_GT_Flatten(geometry.geometry_type()) };
        Self::from_code(flat)
    }
}

impl Display for GeometryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryKind {
    type Err = GeomCompareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl TryFrom<OGRwkbGeometryType::Type> for GeometryKind {
    type Error = GeomCompareError;

    fn try_from(code: OGRwkbGeometryType::Type) -> Result<Self> {
        Self::from_code(code)
    }
}

/// Returns the OGR type code registered for the geometry kind `name`.
pub fn type_code_of(name: &str) -> Result<OGRwkbGeometryType::Type> {
    GeometryKind::from_name(name).map(GeometryKind::code)
}

/// Returns the geometry kind name registered for the OGR type `code`.
pub fn type_name_of(code: OGRwkbGeometryType::Type) -> Result<&'static str> {
    GeometryKind::from_code(code).map(GeometryKind::name)
}
