//! Geometry helpers: kind registry, reprojection and areas of interest.

mod aoi;
mod kind;
mod transform;

pub use aoi::AreaOfInterest;
pub use kind::{type_code_of, type_name_of, GeometryKind};
pub(crate) use transform::spatial_ref_from_epsg;
pub use transform::{get_transform_func, has_z, identity, to_2d, GeometryTransform};
