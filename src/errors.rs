use std::path::PathBuf;

use gdal::errors::GdalError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeomCompareError>;

#[derive(Debug, Error)]
pub enum GeomCompareError {
    #[error("Invalid combination of arguments: {0}")]
    InvalidArgumentCombination(String),
    #[error("Missing required parameter '{name}'")]
    MissingParameter { name: &'static str },
    #[error("The file '{}' does not exist", path.display())]
    FileNotFound { path: PathBuf },
    #[error("The driver '{name}' is not available or does not exist")]
    UnsupportedDriver { name: String },
    #[error("Invalid write mode '{0}': must be either 'update' or 'overwrite'")]
    InvalidMode(String),
    #[error("EPSG:{epsg} does not resolve to a known spatial reference system")]
    CrsResolution { epsg: u32 },
    #[error("No SRID registered for geometry column '{column}'")]
    UnknownSrid { column: String },
    #[error("Unknown geometry type '{0}'")]
    UnknownGeometryType(String),
    #[error("Cannot write an empty sequence of geometries")]
    EmptyGeometries,
    #[error("Feature {fid} not found in layer '{layer}'")]
    MissingFeature { layer: String, fid: u64 },
    #[error("Division by zero while computing {metric}")]
    DivisionByZero { metric: &'static str },

    #[error(transparent)]
    Gdal(#[from] GdalError),
    #[error(transparent)]
    Postgres(#[from] postgres::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Unable to install logger: {0}")]
    LoggerInit(#[from] tracing_subscriber::util::TryInitError),
    #[error("Unable to reconfigure logger: {0}")]
    LoggerReload(#[from] tracing_subscriber::reload::Error),
}
