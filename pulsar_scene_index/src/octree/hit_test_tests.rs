/// Tests for ray/point/box queries, including a randomized comparison
/// against brute-force linear scans.

use super::*;
use crate::octree::{BuildParameters, SpatialIndex};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn id(n: u64) -> ObjectId {
    ObjectId(n)
}

fn cube(min: Vec3, size: f32) -> BoundingBox {
    BoundingBox::new(min, min + Vec3::splat(size))
}

/// Three unit cubes along +X at x = 10, 30, 50.
fn row_index() -> SpatialIndex {
    let mut index = SpatialIndex::new(BuildParameters {
        min_objects_to_split: 2,
        ..BuildParameters::default()
    })
    .unwrap();
    index.insert(id(1), cube(Vec3::new(10.0, 0.0, 0.0), 1.0)).unwrap();
    index.insert(id(2), cube(Vec3::new(30.0, 0.0, 0.0), 1.0)).unwrap();
    index.insert(id(3), cube(Vec3::new(50.0, 0.0, 0.0), 1.0)).unwrap();
    index.request_rebuild();
    index.flush();
    index
}

fn brute_force_ray(objects: &[(ObjectId, BoundingBox)], ray: &Ray) -> Vec<ObjectId> {
    let mut hits: Vec<(f32, ObjectId)> = objects
        .iter()
        .filter_map(|&(oid, bounds)| {
            bounds
                .intersects_ray(ray)
                .map(|(t_near, _)| (t_near.max(0.0), oid))
        })
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, oid)| oid).collect()
}

// ============================================================================
// Tests: ray queries
// ============================================================================

#[test]
fn test_ray_hits_in_distance_order() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);

    let result = index.query_ray(&ray);
    let ids: Vec<u64> = result.hits().iter().map(|h| h.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let distances: Vec<f32> = result.hits().iter().map(|h| h.distance).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert!((distances[0] - 10.0).abs() < 1e-4);
}

#[test]
fn test_ray_reversed_direction_reverses_order() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(100.0, 0.5, 0.5), Vec3::NEG_X);

    let ids: Vec<u64> = index.query_ray(&ray).hits().iter().map(|h| h.id.0).collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[test]
fn test_ray_miss_returns_empty() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 50.0, 0.0), Vec3::X);
    assert!(index.query_ray(&ray).hits().is_empty());
}

#[test]
fn test_ray_equal_distance_ties_break_by_id() {
    let mut index = SpatialIndex::with_default_parameters();
    // Two coincident boxes: identical entry distance
    let shared = cube(Vec3::new(5.0, 0.0, 0.0), 2.0);
    index.insert(id(9), shared).unwrap();
    index.insert(id(4), shared).unwrap();
    index.insert(id(7), shared).unwrap();
    index.request_rebuild();
    index.flush();

    let ray = Ray::new(Vec3::new(0.0, 1.0, 1.0), Vec3::X);
    let ids: Vec<u64> = index.query_ray(&ray).hits().iter().map(|h| h.id.0).collect();
    assert_eq!(ids, vec![4, 7, 9]);
}

#[test]
fn test_ray_starting_inside_object_reports_zero_distance() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(10.5, 0.5, 0.5), Vec3::X);

    let result = index.query_ray(&ray);
    assert_eq!(result.hits()[0].id, id(1));
    assert_eq!(result.hits()[0].distance, 0.0);
    assert_eq!(result.hits()[0].point, Vec3::new(10.5, 0.5, 0.5));
}

#[test]
fn test_ray_hit_point_lies_on_bounds() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);

    let hit = index.query_ray(&ray).hits()[0];
    assert!((hit.point.x - 10.0).abs() < 1e-4);
    assert_eq!(hit.point.y, 0.5);
}

#[test]
fn test_query_captures_generation() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);

    let result = index.query_ray(&ray);
    assert_eq!(result.generation(), index.generation());
}

#[test]
fn test_first_hit_matches_full_query() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);

    let full = index.query_ray(&ray);
    let first = index.query_ray_first(&ray).unwrap();
    assert_eq!(first, full.hits()[0]);

    let miss = Ray::new(Vec3::new(0.0, 50.0, 0.0), Vec3::X);
    assert!(index.query_ray_first(&miss).is_none());
}

#[test]
fn test_objects_outside_root_region_are_still_hit() {
    let mut index = row_index();
    // Far outside the rebuilt root region: stored at the root
    index.insert(id(99), cube(Vec3::new(500.0, 0.0, 0.0), 1.0)).unwrap();
    index.flush();

    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);
    let ids: Vec<u64> = index.query_ray(&ray).hits().iter().map(|h| h.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 99]);
}

#[test]
fn test_queries_work_before_first_rebuild() {
    // No rebuild yet: objects accumulate at a root with an empty region
    let mut index = SpatialIndex::with_default_parameters();
    index.insert(id(1), cube(Vec3::new(10.0, 0.0, 0.0), 1.0)).unwrap();
    index.flush();

    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);
    let result = index.query_ray(&ray);
    assert_eq!(result.hits().len(), 1);
    assert_eq!(result.hits()[0].id, id(1));
}

// ============================================================================
// Tests: point and box queries
// ============================================================================

#[test]
fn test_point_query() {
    let index = row_index();

    let inside = index.query_point(Vec3::new(30.5, 0.5, 0.5));
    assert_eq!(inside.ids(), &[id(2)]);

    let outside = index.query_point(Vec3::new(20.0, 0.5, 0.5));
    assert!(outside.ids().is_empty());
}

#[test]
fn test_point_query_overlapping_objects_in_id_order() {
    let mut index = SpatialIndex::with_default_parameters();
    let shared = cube(Vec3::ZERO, 4.0);
    index.insert(id(8), shared).unwrap();
    index.insert(id(2), shared).unwrap();
    index.insert(id(5), shared).unwrap();
    index.request_rebuild();
    index.flush();

    let result = index.query_point(Vec3::splat(2.0));
    assert_eq!(result.ids(), &[id(2), id(5), id(8)]);
}

#[test]
fn test_box_query() {
    let index = row_index();

    // Covers the first two cubes only
    let probe = BoundingBox::new(Vec3::new(5.0, -1.0, -1.0), Vec3::new(35.0, 2.0, 2.0));
    let result = index.query_box(&probe);
    assert_eq!(result.ids(), &[id(1), id(2)]);
}

// ============================================================================
// Tests: diagnostic path recording
// ============================================================================

#[test]
fn test_hit_path_disabled_by_default() {
    let index = row_index();
    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);
    assert!(index.query_ray(&ray).path().is_empty());
}

#[test]
fn test_hit_path_records_visited_nodes_without_changing_results() {
    let plain = row_index();

    let mut recording = SpatialIndex::new(BuildParameters {
        min_objects_to_split: 2,
        record_hit_path: true,
        ..BuildParameters::default()
    })
    .unwrap();
    recording.insert(id(1), cube(Vec3::new(10.0, 0.0, 0.0), 1.0)).unwrap();
    recording.insert(id(2), cube(Vec3::new(30.0, 0.0, 0.0), 1.0)).unwrap();
    recording.insert(id(3), cube(Vec3::new(50.0, 0.0, 0.0), 1.0)).unwrap();
    recording.request_rebuild();
    recording.flush();

    let ray = Ray::new(Vec3::new(0.0, 0.5, 0.5), Vec3::X);
    let with_path = recording.query_ray(&ray);
    let without_path = plain.query_ray(&ray);

    assert!(!with_path.path().is_empty());
    // The root is visited first
    assert_eq!(with_path.path()[0], recording.current().node_bounds()[0]);
    // Observability only: hits are identical
    assert_eq!(with_path.hits(), without_path.hits());

    // Point queries record too
    let point_result = recording.query_point(Vec3::new(30.5, 0.5, 0.5));
    assert!(!point_result.path().is_empty());
}

// ============================================================================
// Tests: randomized comparison against brute force
// ============================================================================

#[test]
fn test_random_rays_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    let mut index = SpatialIndex::new(BuildParameters {
        min_objects_to_split: 4,
        ..BuildParameters::default()
    })
    .unwrap();

    let mut objects: Vec<(ObjectId, BoundingBox)> = Vec::new();
    for n in 0..200 {
        let min = Vec3::new(
            rng.random_range(0.0..95.0),
            rng.random_range(0.0..95.0),
            rng.random_range(0.0..95.0),
        );
        let size = rng.random_range(0.5..5.0);
        let bounds = cube(min, size);
        index.insert(id(n), bounds).unwrap();
        objects.push((id(n), bounds));
    }
    index.request_rebuild();
    index.flush();

    for _ in 0..25 {
        let origin = Vec3::new(
            rng.random_range(-50.0..150.0),
            rng.random_range(-50.0..150.0),
            -20.0,
        );
        let target = Vec3::new(
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..100.0),
        );
        let ray = Ray::new(origin, target - origin);

        let expected = brute_force_ray(&objects, &ray);
        let actual: Vec<ObjectId> = index.query_ray(&ray).hits().iter().map(|h| h.id).collect();
        assert_eq!(actual, expected, "octree ray query diverged from linear scan");
    }
}

#[test]
fn test_random_points_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0xfeed);

    let mut index = SpatialIndex::with_default_parameters();
    let mut objects: Vec<(ObjectId, BoundingBox)> = Vec::new();
    for n in 0..150 {
        let min = Vec3::new(
            rng.random_range(0.0..90.0),
            rng.random_range(0.0..90.0),
            rng.random_range(0.0..90.0),
        );
        let bounds = cube(min, rng.random_range(1.0..10.0));
        index.insert(id(n), bounds).unwrap();
        objects.push((id(n), bounds));
    }
    index.request_rebuild();
    index.flush();

    for _ in 0..50 {
        let point = Vec3::new(
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..100.0),
            rng.random_range(0.0..100.0),
        );

        let mut expected: Vec<ObjectId> = objects
            .iter()
            .filter(|(_, b)| b.contains_point(point))
            .map(|&(oid, _)| oid)
            .collect();
        expected.sort_unstable();

        assert_eq!(index.query_point(point).ids(), expected.as_slice());
    }
}
