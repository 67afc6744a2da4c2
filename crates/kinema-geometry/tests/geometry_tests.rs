//! Integration tests for kinema-geometry.

use kinema_geometry::{Aabb, MeshShape, Obb, ObbChildren, Polygon, Shape};
use kinema_math::{pose, Affine2, Vec2};

fn transforms() -> Vec<Affine2> {
    let mut out = Vec::new();
    for i in 0..12 {
        let angle = i as f32 * 0.53;
        let position = Vec2::new(i as f32 * 1.7 - 9.0, 3.0 - i as f32 * 0.9);
        out.push(pose(position, angle));
    }
    out
}

/// Jagged strip of triangles along the x axis.
fn terrain(count: usize) -> Vec<[Vec2; 3]> {
    (0..count)
        .map(|i| {
            let x = i as f32;
            let h = 0.3 + (i % 3) as f32 * 0.4;
            [Vec2::new(x, 0.0), Vec2::new(x + 1.0, 0.0), Vec2::new(x + 0.5, h)]
        })
        .collect()
}

// ─── AABB Tests ───────────────────────────────────────────────

#[test]
fn aabb_overlap() {
    let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
    let b = Aabb::new(Vec2::splat(0.5), Vec2::splat(2.0));
    let c = Aabb::new(Vec2::splat(1.5), Vec2::splat(2.0));
    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
}

#[test]
fn capsule_crossing_box() {
    let b = Aabb::new(Vec2::new(-0.1, -1.0), Vec2::new(0.1, 1.0));
    assert!(b.test_capsule(Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0), 0.1));
    assert!(!b.test_capsule(Vec2::new(-5.0, 3.0), Vec2::new(5.0, 3.0), 0.5));
}

#[test]
fn capsule_near_corner_is_exact() {
    let b = Aabb::new(Vec2::ZERO, Vec2::ONE);
    // Segment passes diagonally near the (1, 1) corner at distance ~0.707.
    let a0 = Vec2::new(2.0, 1.0);
    let a1 = Vec2::new(1.0, 2.0);
    assert!(!b.test_capsule(a0, a1, 0.6));
    assert!(b.test_capsule(a0, a1, 0.75));
}

#[test]
fn aabb_serialization() {
    let a = Aabb::new(Vec2::new(-1.0, -2.0), Vec2::new(3.0, 4.0));
    let json = serde_json::to_string(&a).unwrap();
    let recovered: Aabb = serde_json::from_str(&json).unwrap();
    assert_eq!(a, recovered);
}

// ─── Shape Tests ──────────────────────────────────────────────

#[test]
fn aabb_encloses_transformed_vertices() {
    let poly = Polygon::new(vec![
        Vec2::new(-1.0, -0.5),
        Vec2::new(2.0, -1.0),
        Vec2::new(1.5, 1.0),
        Vec2::new(-0.5, 1.2),
    ])
    .unwrap();
    let shape = Shape::Polygon(poly.clone());
    for t in transforms() {
        let aabb = shape.aabb(&t);
        for v in poly.vertices() {
            let w = t.transform_point2(*v);
            assert!(aabb.expanded(1e-4).contains_point(w));
        }
    }
}

#[test]
fn circle_aabb_encloses_boundary() {
    let shape = Shape::circle(0.8);
    for t in transforms() {
        let aabb = shape.aabb(&t);
        for k in 0..16 {
            let local = Vec2::from_angle(k as f32 * 0.39) * 0.8;
            assert!(aabb.expanded(1e-4).contains_point(t.transform_point2(local)));
        }
    }
}

#[test]
fn mesh_aabb_encloses_all_triangles() {
    let soup = terrain(9);
    let mesh = MeshShape::new(soup.clone()).unwrap();
    let shape = Shape::Mesh(mesh);
    for t in transforms() {
        let aabb = shape.aabb(&t);
        for tri in &soup {
            for v in tri {
                assert!(aabb.expanded(1e-4).contains_point(t.transform_point2(*v)));
            }
        }
    }
}

#[test]
fn polygon_rejects_bad_input() {
    assert!(Polygon::new(vec![Vec2::ZERO, Vec2::X]).is_err());
    assert!(Polygon::new(vec![Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]).is_err());
    // Reflex vertex at (0.5, 0.2)
    let dart = vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.5, 0.2), Vec2::new(0.5, 1.0)];
    assert!(Polygon::new(dart).is_err());
}

#[test]
fn polygon_accepts_clockwise_winding() {
    let cw = vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0), Vec2::ZERO];
    let poly = Polygon::new(cw).unwrap();
    assert!(poly.area() > 0.0);
}

#[test]
fn point_containment() {
    let shape = Shape::rect(2.0, 2.0);
    assert!(shape.test_point(Vec2::new(0.5, -0.5)));
    assert!(!shape.test_point(Vec2::new(1.5, 0.0)));
    assert!(Shape::circle(1.0).test_point(Vec2::new(0.6, 0.6)));
    assert!(!Shape::circle(1.0).test_point(Vec2::new(0.8, 0.8)));
}

#[test]
fn box_inertia_matches_closed_form() {
    let shape = Shape::rect(2.0, 4.0);
    let expected = 3.0 * (4.0 + 16.0) / 12.0;
    assert!((shape.inertia(3.0) - expected).abs() < 1e-4);
}

#[test]
fn support_is_extreme() {
    let shape = Shape::rect(2.0, 2.0);
    let s = shape.support(Vec2::new(1.0, 0.2));
    assert_eq!(s, Vec2::new(1.0, 1.0));
    assert!((Shape::circle(2.0).support(Vec2::Y) - Vec2::new(0.0, 2.0)).length() < 1e-6);
}

// ─── Mesh / OBB Tree Tests ────────────────────────────────────

#[test]
fn mesh_rejects_empty_soup() {
    assert!(MeshShape::new(Vec::new()).is_err());
}

#[test]
fn tree_has_one_leaf_per_triangle() {
    let mesh = MeshShape::new(terrain(13)).unwrap();
    let mut leaves: Vec<usize> = mesh.tree().leaves().map(|(t, _)| t).collect();
    leaves.sort();
    assert_eq!(leaves, (0..13).collect::<Vec<_>>());
    assert_eq!(mesh.tree().nodes().len(), 2 * 13 - 1);
}

#[test]
fn tree_handles_duplicate_triangles() {
    let tri = [Vec2::ZERO, Vec2::X, Vec2::Y];
    let mesh = MeshShape::new(vec![tri; 5]).unwrap();
    assert_eq!(mesh.tree().leaves().count(), 5);
}

#[test]
fn tree_query_has_no_false_negatives() {
    let mesh = MeshShape::new(terrain(20)).unwrap();
    for t in transforms() {
        for k in 0..10 {
            let c = t.transform_point2(Vec2::new(k as f32 * 2.1 - 1.0, 0.4));
            let region = Aabb::new(c - Vec2::new(0.7, 0.3), c + Vec2::new(0.4, 0.6));
            let hits = mesh.query(&region, &t);

            let region_box = Obb::from_world_aabb(&region, &Affine2::IDENTITY);

            for (index, leaf) in mesh.tree().leaves() {
                let shrunk = Obb {
                    center: t.transform_point2(leaf.center),
                    axes: [t.transform_vector2(leaf.axes[0]), t.transform_vector2(leaf.axes[1])],
                    half: (leaf.half - Vec2::splat(1e-3)).max(Vec2::ZERO),
                };
                if shrunk.overlaps(&region_box) {
                    assert!(hits.contains(&index), "missed triangle {index}");
                }
            }
        }
    }
}

#[test]
fn branch_boxes_enclose_child_boxes() {
    let mesh = MeshShape::new(terrain(20)).unwrap();
    let nodes = mesh.tree().nodes();
    for node in nodes {
        let ObbChildren::Branch { left, right } = node.children else { continue };
        for child in [left, right] {
            for corner in nodes[child].obb.corners() {
                let d = corner - node.obb.center;
                assert!(d.dot(node.obb.axes[0]).abs() <= node.obb.half.x + 1e-4);
                assert!(d.dot(node.obb.axes[1]).abs() <= node.obb.half.y + 1e-4);
            }
        }
    }
}

#[test]
fn leaf_boxes_enclose_their_triangles() {
    let mesh = MeshShape::new(terrain(8)).unwrap();
    for (index, leaf) in mesh.tree().leaves() {
        for v in mesh.triangles()[index].vertices() {
            let d = *v - leaf.center;
            assert!(d.dot(leaf.axes[0]).abs() <= leaf.half.x + 1e-4);
            assert!(d.dot(leaf.axes[1]).abs() <= leaf.half.y + 1e-4);
        }
    }
}

#[test]
fn centered_mesh_has_origin_centroid() {
    let mesh = MeshShape::centered(terrain(4)).unwrap();
    assert!(mesh.centroid().length() < 1e-4);
}

#[test]
fn shape_centroids() {
    assert_eq!(Shape::circle(2.0).centroid(), Vec2::ZERO);
    assert!(Shape::rect(2.0, 4.0).centroid().length() < 1e-6);

    let triangle = Polygon::new(vec![Vec2::ZERO, Vec2::new(3.0, 0.0), Vec2::new(0.0, 3.0)]).unwrap();
    let c = Shape::Polygon(triangle).centroid();
    assert!((c - Vec2::new(1.0, 1.0)).length() < 1e-5);
}
