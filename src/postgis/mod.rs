//! Geometries read from a PostGIS database.
//!
//! Geometries come either from a geometry column, optionally restricted to
//! an area of interest and reprojected server side, or from an arbitrary
//! query whose first column holds WKB.
//!
//! ```rust,no_run
//! use geomcompare::postgis::{fetch_geometries, ColumnLocation, ConnectionParameters};
//!
//! # fn main() -> geomcompare::errors::Result<()> {
//! let params = ConnectionParameters::new("localhost", "gis", "reader", "secret");
//! let roads = ColumnLocation::new("public", "roads", "geom");
//! for geometry in fetch_geometries(params, roads, None, Some(4326))? {
//!     println!("{}", geometry?.wkt()?);
//! }
//! # Ok(())
//! # }
//! ```

mod cursor;
mod query;

use std::fmt::{self, Debug, Display, Formatter};

use postgres::{Client, NoTls};
use tracing::debug;

use crate::errors::{GeomCompareError, Result};
use crate::geom::AreaOfInterest;

pub use cursor::PgGeometries;
use query::{cursor_body, ColumnQuery};

/// Where to reach the database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub port: u16,
}

impl ConnectionParameters {
    /// Parameters for the default PostgreSQL port.
    pub fn new(host: &str, dbname: &str, user: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            dbname: dbname.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            port: 5432,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Checks that every required field is set.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("host", &self.host),
            ("dbname", &self.dbname),
            ("user", &self.user),
        ] {
            if value.trim().is_empty() {
                return Err(GeomCompareError::MissingParameter { name });
            }
        }
        if self.port == 0 {
            return Err(GeomCompareError::MissingParameter { name: "port" });
        }
        Ok(())
    }

    pub fn to_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .dbname(&self.dbname)
            .user(&self.user)
            .port(self.port)
            .application_name(env!("CARGO_PKG_NAME"));
        if !self.password.is_empty() {
            config.password(&self.password);
        }
        config
    }

    /// Opens a new connection without TLS.
    pub fn connect(&self) -> Result<Client> {
        self.validate()?;
        debug!(
            "connecting to {}@{}:{}/{}",
            self.user, self.host, self.port, self.dbname
        );
        Ok(self.to_config().connect(NoTls)?)
    }
}

impl Debug for ConnectionParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("port", &self.port)
            .finish()
    }
}

/// A geometry column, `schema.table.column`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnLocation {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl Display for ColumnLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.column)
    }
}

impl ColumnLocation {
    pub fn new(schema: &str, table: &str, column: &str) -> Self {
        Self {
            schema: schema.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("schema", &self.schema),
            ("table", &self.table),
            ("column", &self.column),
        ] {
            if value.trim().is_empty() {
                return Err(GeomCompareError::MissingParameter { name });
            }
        }
        Ok(())
    }
}

/// The connection used by [`fetch_geometries`].
pub enum PgSource<'c> {
    /// An open connection owned by the caller. It is never closed here.
    ///
    /// The client must be idle, outside any transaction: the extraction
    /// runs in its own `BEGIN` ... `COMMIT` block and rolls it back when
    /// dropped early, which would end a transaction the caller opened.
    Client(&'c mut Client),
    /// A connection opened for the extraction and closed after it.
    Params(ConnectionParameters),
}

impl<'c> From<&'c mut Client> for PgSource<'c> {
    fn from(client: &'c mut Client) -> Self {
        PgSource::Client(client)
    }
}

impl From<ConnectionParameters> for PgSource<'_> {
    fn from(params: ConnectionParameters) -> Self {
        PgSource::Params(params)
    }
}

/// What to read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometrySelect {
    Column(ColumnLocation),
    /// A query whose first column holds WKB. Run as given.
    Query(String),
}

impl GeometrySelect {
    fn validate(&self) -> Result<()> {
        match self {
            GeometrySelect::Column(location) => location.validate(),
            GeometrySelect::Query(query) if cursor_body(query).is_empty() => {
                Err(GeomCompareError::MissingParameter { name: "query" })
            }
            GeometrySelect::Query(_) => Ok(()),
        }
    }
}

impl From<ColumnLocation> for GeometrySelect {
    fn from(location: ColumnLocation) -> Self {
        GeometrySelect::Column(location)
    }
}

impl From<String> for GeometrySelect {
    fn from(query: String) -> Self {
        GeometrySelect::Query(query)
    }
}

impl From<&str> for GeometrySelect {
    fn from(query: &str) -> Self {
        GeometrySelect::Query(query.to_string())
    }
}

/// Streams geometries from a PostGIS database.
///
/// In column mode `aoi` keeps the geometries intersecting it and
/// `output_epsg` reprojects them server side. Both look up the SRID
/// registered for the column and fail with
/// [`UnknownSrid`](GeomCompareError::UnknownSrid) when there is none. In
/// query mode both are ignored.
///
/// The returned iterator holds the connection until it is exhausted,
/// closed or dropped.
pub fn fetch_geometries<'c>(
    source: impl Into<PgSource<'c>>,
    select: impl Into<GeometrySelect>,
    aoi: Option<&AreaOfInterest>,
    output_epsg: Option<u32>,
) -> Result<PgGeometries<'c>> {
    let source = source.into();
    let select = select.into();
    select.validate()?;
    match source {
        PgSource::Client(client) => {
            let query = build_query(client, &select, aoi, output_epsg)?;
            PgGeometries::open_borrowed(client, &query)
        }
        PgSource::Params(params) => {
            let mut client = params.connect()?;
            let query = match build_query(&mut client, &select, aoi, output_epsg) {
                Ok(query) => query,
                Err(err) => {
                    let _ = client.close();
                    return Err(err);
                }
            };
            PgGeometries::open_owned(client, &query)
        }
    }
}

fn build_query(
    client: &mut Client,
    select: &GeometrySelect,
    aoi: Option<&AreaOfInterest>,
    output_epsg: Option<u32>,
) -> Result<String> {
    let location = match select {
        GeometrySelect::Query(query) => return Ok(cursor_body(query).to_string()),
        GeometrySelect::Column(location) => location,
    };
    let native_srid = if aoi.is_some() || output_epsg.is_some() {
        find_srid(client, location)?
    } else {
        None
    };
    Ok(ColumnQuery::resolve(location, native_srid, aoi, output_epsg)?.to_string())
}

/// SRID registered for a geometry column. PostGIS returns 0 for columns
/// without a constraint and NULL for columns it does not know.
fn find_srid(client: &mut Client, location: &ColumnLocation) -> Result<Option<u32>> {
    let row = client.query_one(
        "SELECT Find_SRID($1, $2, $3)",
        &[&location.schema, &location.table, &location.column],
    )?;
    let srid: Option<i32> = row.try_get(0)?;
    debug!("native SRID of {location}: {srid:?}");
    Ok(srid.and_then(|srid| u32::try_from(srid).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_parameters_validation() {
        let params = ConnectionParameters::new("localhost", "gis", "reader", "");
        assert!(params.validate().is_ok());

        let params = ConnectionParameters::new("", "gis", "reader", "secret");
        assert!(matches!(
            params.validate(),
            Err(GeomCompareError::MissingParameter { name: "host" })
        ));

        let params = ConnectionParameters::new("localhost", " ", "reader", "secret");
        assert!(matches!(
            params.validate(),
            Err(GeomCompareError::MissingParameter { name: "dbname" })
        ));

        let params = ConnectionParameters::new("localhost", "gis", "reader", "secret").with_port(0);
        assert!(matches!(
            params.validate(),
            Err(GeomCompareError::MissingParameter { name: "port" })
        ));
    }

    #[test]
    fn test_connect_validates_first() {
        let params = ConnectionParameters::new("localhost", "gis", "", "secret");
        assert!(matches!(
            params.connect(),
            Err(GeomCompareError::MissingParameter { name: "user" })
        ));
    }

    #[test]
    fn test_password_is_redacted() {
        let params = ConnectionParameters::new("db.local", "gis", "reader", "hunter2").with_port(5433);
        let debug = format!("{params:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("db.local"));
        assert!(debug.contains("5433"));
    }

    #[test]
    fn test_column_location_display() {
        let location = ColumnLocation::new("cadastre", "parcels", "shape");
        assert_eq!(location.to_string(), "cadastre.parcels.shape");
    }

    #[test]
    fn test_geometry_select_validation() {
        assert!(GeometrySelect::from(ColumnLocation::new("public", "roads", "geom"))
            .validate()
            .is_ok());
        assert!(matches!(
            GeometrySelect::from(ColumnLocation::new("public", "", "geom")).validate(),
            Err(GeomCompareError::MissingParameter { name: "table" })
        ));
        assert!(matches!(
            GeometrySelect::from(" ; ").validate(),
            Err(GeomCompareError::MissingParameter { name: "query" })
        ));
    }

    #[test]
    fn test_fetch_validates_before_connecting() {
        // nothing listens on port 1; validation must fail first
        let params = ConnectionParameters::new("localhost", "gis", "reader", "").with_port(1);
        let result = fetch_geometries(params, ColumnLocation::new("public", "roads", ""), None, None);
        assert!(matches!(
            result,
            Err(GeomCompareError::MissingParameter { name: "column" })
        ));
    }
}
