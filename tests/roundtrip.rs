use gdal::vector::Geometry;
use geomcompare::geom::{to_2d, AreaOfInterest, GeometryKind};
use geomcompare::stats::MatchCounts;
use geomcompare::vector::{extract_geometries, write_geometries, LayerFilter, LayerFilters, WriteMode};
use geomcompare::GeomCompareError;

fn points(wkts: &[&str]) -> Vec<Geometry> {
    wkts.iter().map(|wkt| Geometry::from_wkt(wkt).unwrap()).collect()
}

#[test]
fn test_write_then_extract() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.gpkg");

    let written = write_geometries(
        points(&["POINT (1 1)", "POINT (2 2)"]),
        4326,
        &path,
        "GPKG",
        "points",
        WriteMode::Overwrite,
    )
    .unwrap();
    assert_eq!(written, 2);

    let extracted = extract_geometries(&path, "GPKG", None, None)
        .unwrap()
        .map(|geometry| geometry.unwrap().get_point(0))
        .collect::<Vec<_>>();
    assert_eq!(extracted, vec![(1.0, 1.0, 0.0), (2.0, 2.0, 0.0)]);
}

#[test]
fn test_compare_against_reference() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("detections.gpkg");
    write_geometries(
        points(&["POINT (1 1)", "POINT (5 5)", "POINT (9 9)"]),
        4326,
        &path,
        "GPKG",
        "detections",
        WriteMode::Overwrite,
    )
    .unwrap();

    let reference = AreaOfInterest::from_bbox(0.0, 0.0, 6.0, 6.0, Some(4326)).unwrap();
    let filters = LayerFilters::new([LayerFilter::default_filter().with_aoi(reference)]).unwrap();
    let inside = extract_geometries(&path, "GPKG", None, Some(filters))
        .unwrap()
        .map(|geometry| to_2d(&geometry.unwrap()))
        .collect::<Vec<_>>();

    assert_eq!(inside.len(), 2);
    assert!(inside
        .iter()
        .all(|geometry| GeometryKind::of(geometry).unwrap() == GeometryKind::Point));

    let counts = MatchCounts::new(inside.len() as u64, 1, 0);
    assert!((counts.precision().unwrap() - 2.0 / 3.0).abs() < f64::EPSILON);
    assert_eq!(counts.recall().unwrap(), 1.0);
}

#[test]
fn test_errors_surface_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never.gpkg");

    let result = write_geometries(Vec::new(), 4326, &path, "GPKG", "empty", WriteMode::Overwrite);
    assert!(matches!(result, Err(GeomCompareError::EmptyGeometries)));
    assert!(!path.exists());

    let result = extract_geometries(&path, "GPKG", None, None);
    assert!(matches!(result, Err(GeomCompareError::FileNotFound { .. })));

    assert!(matches!(
        "append".parse::<WriteMode>(),
        Err(GeomCompareError::InvalidMode(_))
    ));
}
