use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;
use std::path::Path;
use std::str::FromStr;

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{Geometry, Layer, LayerAccess, LayerOptions};
use gdal::{Dataset, DatasetOptions, Driver, DriverManager, GdalOpenFlags};
use tracing::{debug, info};

use crate::errors::{GeomCompareError, Result};
use crate::geom::{spatial_ref_from_epsg, GeometryKind, GeometryTransform};
use crate::vector::layer_epsg;

/// How [`write_geometries`] treats an existing target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Append to the existing layer, creating the file or layer if needed.
    #[default]
    Update,
    /// Delete the whole data source and write it from scratch.
    Overwrite,
}

impl FromStr for WriteMode {
    type Err = GeomCompareError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "update" => Ok(WriteMode::Update),
            "overwrite" => Ok(WriteMode::Overwrite),
            other => Err(GeomCompareError::InvalidMode(other.to_string())),
        }
    }
}

impl Display for WriteMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Update => f.write_str("update"),
            WriteMode::Overwrite => f.write_str("overwrite"),
        }
    }
}

/// Everything needed to create the output layer.
struct LayerTarget<'a> {
    driver: Driver,
    driver_name: &'a str,
    path: &'a Path,
    layer_name: &'a str,
    srs: SpatialRef,
    kind: GeometryKind,
}

impl LayerTarget<'_> {
    fn create_layer<'d>(&self, dataset: &'d mut Dataset) -> Result<Layer<'d>> {
        debug!(
            "creating {} layer '{}' in '{}'",
            self.kind,
            self.layer_name,
            self.path.display()
        );
        Ok(dataset.create_layer(LayerOptions {
            name: self.layer_name,
            srs: Some(&self.srs),
            ty: self.kind.code(),
            options: None,
        })?)
    }
}

/// Writes `geometries`, expressed in `geometries_epsg`, as attribute-less
/// features of the layer `layer_name` of `filename`.
///
/// The layer geometry type is taken from the first geometry; later
/// geometries are written as they are, even when their kind differs.
///
/// In [`WriteMode::Update`], geometries appended to an existing layer whose
/// EPSG code differs from `geometries_epsg` are reprojected into the layer's
/// reference system. A target that cannot be opened for update is written
/// as in [`WriteMode::Overwrite`].
///
/// Returns the number of features written. Features written before an
/// error are not rolled back.
pub fn write_geometries<I, P>(
    geometries: I,
    geometries_epsg: u32,
    filename: P,
    driver_name: &str,
    layer_name: &str,
    mode: WriteMode,
) -> Result<u64>
where
    I: IntoIterator<Item = Geometry>,
    P: AsRef<Path>,
{
    let driver = DriverManager::get_driver_by_name(driver_name).map_err(|_| {
        GeomCompareError::UnsupportedDriver {
            name: driver_name.to_string(),
        }
    })?;
    let srs = spatial_ref_from_epsg(geometries_epsg)?;
    let mut geometries = geometries.into_iter().peekable();
    let kind = match geometries.peek() {
        Some(first) => GeometryKind::of(first)?,
        None => return Err(GeomCompareError::EmptyGeometries),
    };

    let target = LayerTarget {
        driver,
        driver_name,
        path: filename.as_ref(),
        layer_name,
        srs,
        kind,
    };
    match mode {
        WriteMode::Overwrite => overwrite(&target, geometries),
        WriteMode::Update => update(&target, geometries_epsg, geometries),
    }
}

fn overwrite<I>(target: &LayerTarget, geometries: Peekable<I>) -> Result<u64>
where
    I: Iterator<Item = Geometry>,
{
    if target.path.exists() {
        debug!("deleting existing data source '{}'", target.path.display());
        target.driver.delete(target.path)?;
    }
    let mut dataset = target.driver.create_vector_only(target.path)?;
    let mut layer = target.create_layer(&mut dataset)?;
    append(&mut layer, geometries, &GeometryTransform::Identity)
}

fn update<I>(target: &LayerTarget, geometries_epsg: u32, geometries: Peekable<I>) -> Result<u64>
where
    I: Iterator<Item = Geometry>,
{
    let opened = Dataset::open_ex(
        target.path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_VECTOR,
            allowed_drivers: Some(&[target.driver_name]),
            ..DatasetOptions::default()
        },
    );
    let mut dataset = match opened {
        Ok(dataset) => dataset,
        Err(err) => {
            debug!(
                "cannot open '{}' for update ({err}), writing it from scratch",
                target.path.display()
            );
            return overwrite(target, geometries);
        }
    };

    if dataset.layer_by_name(target.layer_name).is_err() && dataset.layer_count() == 0 {
        let mut layer = target.create_layer(&mut dataset)?;
        return append(&mut layer, geometries, &GeometryTransform::Identity);
    }
    let mut layer = match dataset.layer_by_name(target.layer_name) {
        Ok(layer) => layer,
        Err(_) => dataset.layer(0)?,
    };

    let layer_name = layer.name();
    if layer_name != target.layer_name {
        debug!(
            "no layer '{}' in '{}', appending to '{layer_name}'",
            target.layer_name,
            target.path.display()
        );
    }
    let transform = match layer_epsg(&layer) {
        Some(layer_epsg) if layer_epsg != geometries_epsg => {
            info!(
                "The spatial reference system of the output file '{}', layer '{layer_name}', \
                 is EPSG:{layer_epsg} while the input geometries are in EPSG:{geometries_epsg}. \
                 The geometries will be reprojected before being added to the file.",
                target.path.display(),
            );
            GeometryTransform::between(geometries_epsg, layer_epsg)?
        }
        Some(_) => GeometryTransform::Identity,
        None => {
            info!(
                "The spatial reference system of the output file '{}', layer '{layer_name}', \
                 could not be found or identified. The geometries will be added without \
                 transformation.",
                target.path.display(),
            );
            GeometryTransform::Identity
        }
    };
    append(&mut layer, geometries, &transform)
}

fn append<L, I>(layer: &mut L, geometries: I, transform: &GeometryTransform) -> Result<u64>
where
    L: LayerAccess,
    I: Iterator<Item = Geometry>,
{
    let mut written = 0;
    for geometry in geometries {
        layer.create_feature(transform.apply(&geometry)?)?;
        written += 1;
    }
    debug!("wrote {written} feature(s)");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!("update".parse::<WriteMode>().unwrap(), WriteMode::Update);
        assert_eq!("overwrite".parse::<WriteMode>().unwrap(), WriteMode::Overwrite);
        assert!(matches!(
            "append".parse::<WriteMode>(),
            Err(GeomCompareError::InvalidMode(mode)) if mode == "append"
        ));
        assert!("Update".parse::<WriteMode>().is_err());
        assert_eq!(WriteMode::default(), WriteMode::Update);
        assert_eq!(WriteMode::Overwrite.to_string(), "overwrite");
    }
}
