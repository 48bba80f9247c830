//! End-to-end propagation queries on a two-building scene.

use anyhow::Result;
use citynoise::{
    CityNoiseError, Envelope, IndexKind, ObstructionEngine, Point, SceneBuilder,
};

fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<Point> {
    vec![
        Point::new_2d(x1, y1),
        Point::new_2d(x2, y1),
        Point::new_2d(x2, y2),
        Point::new_2d(x1, y2),
    ]
}

/// Two slab buildings on a 60 x 60 scene, heights 5 and 4.
fn two_building_scene(index: IndexKind) -> Result<ObstructionEngine> {
    let mut builder = SceneBuilder::new();
    builder.add_geometry(&rect(15., 5., 30., 30.), 5.0)?;
    builder.add_geometry(&rect(40., 5., 45., 30.), 4.0)?;
    let engine = builder.finish_polygon_feeding(
        Envelope::from_bounds(0., 0., 60., 60.),
        index,
    )?;
    Ok(engine)
}

#[test]
fn free_field_beside_the_buildings() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    // Runs entirely west of the first building
    assert!(engine.is_free_field(Point::new(10., 5., 1.6), Point::new(12., 45., 1.6)));
    Ok(())
}

#[test]
fn blocked_through_a_building() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    assert!(!engine.is_free_field(Point::new(10., 5., 1.6), Point::new(32., 15., 1.6)));
    Ok(())
}

#[test]
fn blocked_above_the_roof_line() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    // The segment passes above the 5 m roof, but the prism obstructs
    // the full column over its footprint
    assert!(!engine.is_free_field(Point::new(10., 5., 6.0), Point::new(32., 15., 7.0)));
    Ok(())
}

#[test]
fn same_answers_from_both_index_variants() -> Result<()> {
    let quad = two_building_scene(IndexKind::QuadTree)?;
    let grid = two_building_scene(IndexKind::Grid { rows: 8, cols: 8 })?;
    let pairs = [
        (Point::new(10., 5., 1.6), Point::new(12., 45., 1.6)),
        (Point::new(10., 5., 1.6), Point::new(32., 15., 1.6)),
        (Point::new(48., 25., 0.5), Point::new(5., 15., 1.5)),
        (Point::new(1., 1., 1.), Point::new(59., 59., 1.)),
    ];
    for (p1, p2) in pairs {
        assert_eq!(quad.is_free_field(p1, p2), grid.is_free_field(p1, p2));
    }
    Ok(())
}

#[test]
fn free_field_path_has_zero_difference() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let s = Point::new(10., 5., 1.6);
    let r = Point::new(12., 45., 1.6);
    let path = engine.get_path(s, r)?;
    assert!(path.path_difference.abs() < 1e-9);
    assert!(path.diffraction_shape_factor.abs() < 1e-9);
    assert!((path.diffracted_distance - path.direct_distance).abs() < 1e-9);
    assert!((path.direct_distance - s.distance(&r)).abs() < 1e-9);
    Ok(())
}

#[test]
fn diffracted_path_around_a_building() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let s = Point::new(48., 25., 0.5);
    let r = Point::new(5., 15., 1.5);
    let path = engine.get_path(s, r)?;

    assert!((path.direct_distance - s.distance(&r)).abs() < 1e-9);
    // Bending around buildings costs extra distance
    assert!(path.diffracted_distance > path.direct_distance + 1e-6);
    assert!(path.path_difference > 1e-6);
    assert!(
        (path.path_difference - (path.diffracted_distance - path.direct_distance)).abs() < 1e-9
    );
    // The bends sit off the direct line
    assert!(path.diffraction_shape_factor > 1e-6);
    Ok(())
}

#[test]
fn get_path_is_symmetric() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let s = Point::new(48., 25., 0.5);
    let r = Point::new(5., 15., 1.5);
    let forward = engine.get_path(s, r)?;
    let backward = engine.get_path(r, s)?;

    let rel = |a: f64, b: f64| (a - b).abs() / a.abs().max(1.0);
    assert!(rel(forward.diffracted_distance, backward.diffracted_distance) < 1e-6);
    assert!(rel(forward.path_difference, backward.path_difference) < 1e-6);
    assert!(rel(forward.direct_distance, backward.direct_distance) < 1e-6);
    Ok(())
}

#[test]
fn repeated_queries_are_idempotent() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let s = Point::new(48., 25., 0.5);
    let r = Point::new(5., 15., 1.5);
    let first = engine.get_path(s, r)?;
    for _ in 0..10 {
        let again = engine.get_path(s, r)?;
        assert_eq!(first, again);
    }
    assert!(!engine.is_free_field(s, r));
    assert!(!engine.is_free_field(s, r));
    Ok(())
}

#[test]
fn enclosed_receiver_has_no_path() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    // Deep inside the first footprint; every outward segment crosses it
    let enclosed = Point::new(20., 10., 1.0);
    let outside = Point::new(5., 15., 1.5);
    assert!(matches!(
        engine.get_path(enclosed, outside),
        Err(CityNoiseError::NoPathFound)
    ));
    Ok(())
}

#[test]
fn batch_queries_match_single_queries() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let pairs = vec![
        (Point::new(10., 5., 1.6), Point::new(12., 45., 1.6)),
        (Point::new(10., 5., 1.6), Point::new(32., 15., 1.6)),
        (Point::new(48., 25., 0.5), Point::new(5., 15., 1.5)),
    ];

    let flags = engine.is_free_field_batch(&pairs);
    assert_eq!(flags, vec![true, false, false]);
    for (flag, (p1, p2)) in flags.iter().zip(&pairs) {
        assert_eq!(*flag, engine.is_free_field(*p1, *p2));
    }

    let paths = engine.get_path_batch(&pairs);
    assert_eq!(paths.len(), 3);
    for (res, (p1, p2)) in paths.iter().zip(&pairs) {
        let single = engine.get_path(*p1, *p2)?;
        assert_eq!(*res, Ok(single));
    }
    Ok(())
}

#[test]
fn non_finite_endpoints_are_rejected_not_unreachable() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    let good = Point::new(5., 15., 1.5);
    for bad in [
        Point::new(f64::NAN, 5., 1.6),
        Point::new(10., f64::INFINITY, 1.6),
        Point::new(10., 5., f64::NEG_INFINITY),
    ] {
        assert!(!engine.is_free_field(bad, good));
        assert!(!engine.is_free_field(good, bad));
        // A malformed query is an error, not a missing path
        assert!(matches!(
            engine.get_path(bad, good),
            Err(CityNoiseError::InvalidEnvelope(_))
        ));
        assert!(matches!(
            engine.get_path(good, bad),
            Err(CityNoiseError::InvalidEnvelope(_))
        ));
    }
    Ok(())
}

#[test]
fn wall_hugging_segment_is_free() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    // Runs exactly along the western wall of the first building
    assert!(engine.is_free_field(Point::new(15., 0., 1.), Point::new(15., 35., 1.)));
    Ok(())
}

#[test]
fn corner_grazing_segment_is_free() -> Result<()> {
    let engine = two_building_scene(IndexKind::QuadTree)?;
    // Touches only the (15, 5) corner of the first building
    assert!(engine.is_free_field(Point::new(10., 10., 1.), Point::new(20., 0., 1.)));
    Ok(())
}
