use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use gdal::vector::{Geometry, LayerAccess, OwnedFeatureIterator, OwnedLayer};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use tracing::debug;

use crate::errors::{GeomCompareError, Result};
use crate::vector::{decode_geometry, layer_epsg, LayerFilters, LayerId};

/// Where a [`FileGeometries`] iterator is in its walk over the dataset.
enum ScanState {
    /// Between two layers, holding the dataset.
    Between(Dataset),
    /// Reading every feature that passes the layer's filters.
    Scanning {
        layer: LayerId,
        features: OwnedFeatureIterator,
    },
    /// Reading an explicit list of feature IDs.
    ById {
        layer: LayerId,
        owned: OwnedLayer,
        fids: std::vec::IntoIter<u64>,
    },
    /// The dataset has been closed.
    Released,
}

/// Lazy, forward-only sequence of the geometries of one or more layers of a
/// vector dataset, created by [`extract_geometries`].
///
/// The dataset stays open while the iterator is alive and is closed once
/// the last layer is exhausted, on the first error, on [`close`] or on
/// drop.
///
/// [`close`]: FileGeometries::close
pub struct FileGeometries {
    path: PathBuf,
    pending: VecDeque<LayerId>,
    filters: LayerFilters,
    state: ScanState,
}

/// Opens `filename` with the OGR driver `driver_name` and streams the
/// geometries of its layers.
///
/// `layers` are visited in the given order, or every layer in dataset order
/// when `None`. Each layer is read through the filter resolved for it by
/// [`LayerFilters::resolve`].
pub fn extract_geometries<P: AsRef<Path>>(
    filename: P,
    driver_name: &str,
    layers: Option<&[LayerId]>,
    layer_filters: Option<LayerFilters>,
) -> Result<FileGeometries> {
    let path = filename.as_ref();
    if !path.exists() {
        return Err(GeomCompareError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    DriverManager::get_driver_by_name(driver_name).map_err(|_| {
        GeomCompareError::UnsupportedDriver {
            name: driver_name.to_string(),
        }
    })?;

    let dataset = Dataset::open_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
            allowed_drivers: Some(&[driver_name]),
            ..DatasetOptions::default()
        },
    )?;
    let pending: VecDeque<LayerId> = match layers {
        Some(ids) => ids.iter().cloned().collect(),
        None => (0..dataset.layer_count()).map(LayerId::Index).collect(),
    };
    debug!(
        "extracting geometries from {} layer(s) of '{}'",
        pending.len(),
        path.display()
    );

    Ok(FileGeometries {
        path: path.to_path_buf(),
        pending,
        filters: layer_filters.unwrap_or_default(),
        state: ScanState::Between(dataset),
    })
}

impl FileGeometries {
    /// Closes the dataset without reading the remaining geometries.
    pub fn close(mut self) {
        self.release();
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, ScanState::Released)
    }

    fn release(&mut self) {
        if !self.is_released() {
            debug!("closing '{}'", self.path.display());
        }
        self.state = ScanState::Released;
    }

    fn enter_layer(&self, dataset: Dataset, id: LayerId) -> Result<ScanState> {
        let mut owned = match &id {
            LayerId::Index(idx) => dataset.into_layer(*idx)?,
            LayerId::Name(name) => dataset.into_layer_by_name(name)?,
        };
        let filter = self.filters.resolve(&id);
        let aoi = filter.and_then(|f| f.aoi.as_ref());
        let attribute_filter = filter.and_then(|f| f.attribute_filter.as_deref());

        if let Some(aoi) = aoi {
            let spatial_filter = aoi.geometry_in(layer_epsg(&owned))?;
            owned.set_spatial_filter(&spatial_filter);
        }
        if let Some(predicate) = attribute_filter {
            owned.set_attribute_filter(predicate)?;
        }

        match filter.and_then(|f| f.feature_ids.as_ref()) {
            Some(fids) if aoi.is_none() && attribute_filter.is_none() => {
                debug!("reading {} feature(s) by id from layer {id}", fids.len());
                Ok(ScanState::ById {
                    layer: id,
                    owned,
                    fids: fids.clone().into_iter(),
                })
            }
            _ => {
                debug!("reading features from layer {id}");
                Ok(ScanState::Scanning {
                    layer: id,
                    features: owned.owned_features(),
                })
            }
        }
    }
}

impl Iterator for FileGeometries {
    type Item = Result<Geometry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, ScanState::Released) {
                ScanState::Released => return None,
                ScanState::Between(dataset) => {
                    let Some(id) = self.pending.pop_front() else {
                        drop(dataset);
                        debug!("all layers of '{}' read", self.path.display());
                        return None;
                    };
                    match self.enter_layer(dataset, id) {
                        Ok(state) => self.state = state,
                        Err(err) => return Some(Err(err)),
                    }
                }
                ScanState::Scanning {
                    layer,
                    mut features,
                } => {
                    // features without geometry are skipped
                    let next = (&mut features)
                        .next()
                        .map(|feature| feature.geometry().map(decode_geometry));
                    match next {
                        None => {
                            debug!("layer {layer} exhausted");
                            self.state = ScanState::Between(features.into_layer().into_dataset());
                        }
                        Some(None) => self.state = ScanState::Scanning { layer, features },
                        Some(Some(Err(err))) => return Some(Err(err)),
                        Some(Some(Ok(geometry))) => {
                            self.state = ScanState::Scanning { layer, features };
                            return Some(Ok(geometry));
                        }
                    }
                }
                ScanState::ById {
                    layer,
                    owned,
                    mut fids,
                } => {
                    let Some(fid) = fids.next() else {
                        debug!("layer {layer} exhausted");
                        self.state = ScanState::Between(owned.into_dataset());
                        continue;
                    };
                    let next = match owned.feature(fid) {
                        Some(feature) => feature.geometry().map(decode_geometry),
                        None => {
                            return Some(Err(GeomCompareError::MissingFeature {
                                layer: layer.to_string(),
                                fid,
                            }))
                        }
                    };
                    match next {
                        Some(Err(err)) => return Some(Err(err)),
                        next => {
                            self.state = ScanState::ById { layer, owned, fids };
                            if let Some(Ok(geometry)) = next {
                                return Some(Ok(geometry));
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Drop for FileGeometries {
    fn drop(&mut self) {
        self.release();
    }
}
