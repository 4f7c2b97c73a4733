use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::errors::{GeomCompareError, Result};
use crate::geom::AreaOfInterest;

/// Identifies a layer of a dataset, either by name or by index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerId {
    Name(String),
    Index(usize),
}

impl Display for LayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LayerId::Name(name) => f.write_str(name),
            LayerId::Index(idx) => write!(f, "#{idx}"),
        }
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        LayerId::Name(name.to_string())
    }
}

impl From<String> for LayerId {
    fn from(name: String) -> Self {
        LayerId::Name(name)
    }
}

impl From<usize> for LayerId {
    fn from(idx: usize) -> Self {
        LayerId::Index(idx)
    }
}

/// Restrictions applied to the features read from a layer.
///
/// A filter without `layer_id` is the default filter, used for every layer
/// that has no filter of its own.
#[derive(Clone, Debug, Default)]
pub struct LayerFilter {
    pub layer_id: Option<LayerId>,
    pub aoi: Option<AreaOfInterest>,
    pub attribute_filter: Option<String>,
    pub feature_ids: Option<Vec<u64>>,
}

impl LayerFilter {
    pub fn for_layer(layer_id: impl Into<LayerId>) -> Self {
        Self {
            layer_id: Some(layer_id.into()),
            ..Default::default()
        }
    }

    pub fn default_filter() -> Self {
        Self::default()
    }

    pub fn with_aoi(mut self, aoi: AreaOfInterest) -> Self {
        self.aoi = Some(aoi);
        self
    }

    /// Sets an OGR SQL `WHERE` clause, e.g. `"population > 1000"`.
    pub fn with_attribute_filter(mut self, predicate: impl Into<String>) -> Self {
        self.attribute_filter = Some(predicate.into());
        self
    }

    /// Restricts the layer to these feature IDs, visited in the given order.
    ///
    /// Ignored when an area of interest or an attribute filter is set.
    pub fn with_feature_ids(mut self, fids: impl IntoIterator<Item = u64>) -> Self {
        self.feature_ids = Some(fids.into_iter().collect());
        self
    }

    pub fn is_default(&self) -> bool {
        self.layer_id.is_none()
    }
}

/// A set of [`LayerFilter`]s with at most one filter per layer and at most
/// one default filter.
#[derive(Clone, Debug, Default)]
pub struct LayerFilters {
    by_layer: HashMap<LayerId, LayerFilter>,
    fallback: Option<LayerFilter>,
}

impl LayerFilters {
    pub fn new(filters: impl IntoIterator<Item = LayerFilter>) -> Result<Self> {
        let mut set = Self::default();
        for filter in filters {
            match filter.layer_id.clone() {
                None if set.fallback.is_some() => {
                    return Err(GeomCompareError::InvalidArgumentCombination(
                        "more than one default layer filter".to_string(),
                    ));
                }
                None => set.fallback = Some(filter),
                Some(id) if set.by_layer.contains_key(&id) => {
                    return Err(GeomCompareError::InvalidArgumentCombination(format!(
                        "more than one filter for layer '{id}'"
                    )));
                }
                Some(id) => {
                    set.by_layer.insert(id, filter);
                }
            }
        }
        Ok(set)
    }

    /// The filter for `layer`, falling back to the default filter.
    ///
    /// Layers are matched on the exact identifier they are visited with: a
    /// filter for `"roads"` does not apply when the same layer is visited as
    /// index `0`.
    pub fn resolve(&self, layer: &LayerId) -> Option<&LayerFilter> {
        self.by_layer.get(layer).or(self.fallback.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.by_layer.is_empty() && self.fallback.is_none()
    }
}
