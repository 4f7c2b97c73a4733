use std::fmt::{self, Display, Formatter};

use super::ColumnLocation;
use crate::errors::{GeomCompareError, Result};
use crate::geom::AreaOfInterest;

/// SRID PostGIS uses for geometries without a reference system.
const UNKNOWN_SRID: u32 = 0;

/// The `SELECT` reading a geometry column as WKB.
pub(crate) struct ColumnQuery<'a> {
    pub location: &'a ColumnLocation,
    /// WKT of the area the geometries must intersect, with its SRID.
    pub aoi: Option<(String, u32)>,
    /// SRID the geometries are reprojected into.
    pub reproject_to: Option<u32>,
}

impl<'a> ColumnQuery<'a> {
    /// Builds the query for `location` whose registered SRID is
    /// `native_srid`.
    ///
    /// The SRID is required as soon as an area of interest or an output
    /// EPSG is given. SRID 0 is used as is: the area is not reprojected and
    /// PostGIS reports any mismatch itself.
    pub fn resolve(
        location: &'a ColumnLocation,
        native_srid: Option<u32>,
        aoi: Option<&AreaOfInterest>,
        output_epsg: Option<u32>,
    ) -> Result<Self> {
        if aoi.is_none() && output_epsg.is_none() {
            return Ok(Self {
                location,
                aoi: None,
                reproject_to: None,
            });
        }
        let srid = native_srid.ok_or_else(|| GeomCompareError::UnknownSrid {
            column: location.to_string(),
        })?;
        let aoi = match aoi {
            Some(aoi) if srid == UNKNOWN_SRID => Some((aoi.geometry.wkt()?, srid)),
            Some(aoi) => Some((aoi.geometry_in(Some(srid))?.wkt()?, srid)),
            None => None,
        };
        Ok(Self {
            location,
            aoi,
            reproject_to: output_epsg.filter(|&epsg| epsg != srid),
        })
    }
}

impl Display for ColumnQuery<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ColumnLocation {
            schema,
            table,
            column,
        } = self.location;
        match self.reproject_to {
            Some(output) => write!(f, "SELECT ST_AsBinary(ST_Transform({column}, {output}))")?,
            None => write!(f, "SELECT ST_AsBinary({column})")?,
        }
        write!(f, " FROM {schema}.{table} WHERE {column} IS NOT NULL")?;
        if let Some((wkt, srid)) = &self.aoi {
            write!(
                f,
                " AND ST_Intersects({column}, ST_GeomFromText('{wkt}', {srid}))"
            )?;
        }
        Ok(())
    }
}

/// Strips what would prevent `query` from being wrapped in a cursor.
pub(crate) fn cursor_body(query: &str) -> &str {
    query.trim().trim_end_matches(';').trim_end()
}
