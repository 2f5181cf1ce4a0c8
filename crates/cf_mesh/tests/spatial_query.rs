// crates/cf_mesh/tests/spatial_query.rs

//! 点定位集成测试

use cf_config::{SpatialIndexConfig, SplitAxis, MAX_TREE_DEPTH};
use cf_mesh::prelude::*;
use cf_mesh::{PolylineMeshGenerator, RectMeshGenerator};
use glam::{DVec2, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn small_leaf_config() -> SpatialIndexConfig {
    SpatialIndexConfig {
        min_objects_per_leaf: 12,
        ..Default::default()
    }
}

/// 内部节点随机扰动的矩形网格
fn jittered_mesh(rng: &mut StdRng) -> Decomposition {
    let nx = 30;
    let ny = 20;
    let gen = RectMeshGenerator::new(nx, ny, 30.0, 20.0);
    let mesh = gen.build().unwrap();

    // 扰动后重新构造所有单元
    let mut jittered = Decomposition::with_index_config(small_leaf_config());
    for (k, n) in mesh.nodes().iter().enumerate() {
        let p = n.position();
        let offset = if gen.is_boundary(NodeIndex::from_usize(k)) {
            DVec3::ZERO
        } else {
            DVec3::new(rng.gen_range(-0.15..0.15), rng.gen_range(-0.15..0.15), 0.0)
        };
        jittered.add_node(p + offset);
    }
    for e in mesh.elements() {
        jittered.add_element_nodes(e.nodes()).unwrap();
    }
    jittered
}

#[test]
fn test_random_interior_points_located() {
    let mut rng = StdRng::seed_from_u64(20240611);
    let mesh = jittered_mesh(&mut rng);
    assert!(mesh.spatial_index().stats().n_leaves > 1);

    for _ in 0..2000 {
        let e = ElementIndex::from_usize(rng.gen_range(0..mesh.n_elements()));
        let v = mesh.element(e).vertices().to_vec();
        let mut w = [rng.gen_range(0.01..1.0), rng.gen_range(0.01..1.0), rng.gen_range(0.01..1.0)];
        let sum: f64 = w.iter().sum();
        w.iter_mut().for_each(|x| *x /= sum);
        let p = v[0] * w[0] + v[1] * w[1] + v[2] * w[2];

        let found = mesh.get_element(p).expect("内部点必须能被定位");
        assert!(mesh.element(found).contains_point(p));

        let loc = mesh.locate(p).unwrap();
        let nodes = mesh.element(loc.element).nodes().to_vec();
        let xs: Vec<f64> = nodes.iter().map(|&n| mesh.node(n).xy().x).collect();
        let ys: Vec<f64> = nodes.iter().map(|&n| mesh.node(n).xy().y).collect();
        let x = loc.coordinates.interpolate(&xs);
        let y = loc.coordinates.interpolate(&ys);
        assert!((x - p.x).abs() < 1e-9);
        assert!((y - p.y).abs() < 1e-9);
    }
}

#[test]
fn test_leaf_never_misses_containing_element() {
    let mut rng = StdRng::seed_from_u64(7);
    let mesh = jittered_mesh(&mut rng);
    let tree = mesh.spatial_index();

    for _ in 0..500 {
        let p = DVec2::new(rng.gen_range(0.0..30.0), rng.gen_range(0.0..20.0));
        let candidates = tree.search_candidates(p);
        for (k, e) in mesh.elements().iter().enumerate() {
            if e.contains_point(p) {
                assert!(candidates.contains(&ElementIndex::from_usize(k)));
            }
        }
    }
}

#[test]
fn test_points_outside_mesh() {
    let mesh = RectMeshGenerator::new(4, 4, 4.0, 4.0)
        .with_index_config(small_leaf_config())
        .build()
        .unwrap();
    assert_eq!(mesh.get_element(DVec2::new(-0.5, 2.0)), None);
    assert_eq!(mesh.get_element(DVec2::new(2.0, 4.5)), None);
    assert!(mesh.locate(DVec2::new(100.0, 100.0)).is_none());
}

#[test]
fn test_forced_direction_same_answers() {
    let free = RectMeshGenerator::new(12, 12, 12.0, 12.0)
        .with_index_config(small_leaf_config())
        .build()
        .unwrap();
    let forced = RectMeshGenerator::new(12, 12, 12.0, 12.0)
        .with_index_config(SpatialIndexConfig {
            direction: Some(SplitAxis::Y),
            parallel_root: false,
            ..small_leaf_config()
        })
        .build()
        .unwrap();

    for j in 0..24 {
        for i in 0..24 {
            let p = DVec2::new(i as f64 * 0.5 + 0.13, j as f64 * 0.5 + 0.29);
            let a = free.get_element(p).unwrap();
            let b = forced.get_element(p).unwrap();
            // 非边界点只属于一个单元
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_nearly_collinear_fan_terminates() {
    let mut mesh = Decomposition::with_index_config(SpatialIndexConfig {
        min_objects_per_leaf: 4,
        ..Default::default()
    });
    let origin = mesh.add_node_xyz(0.0, 0.0, 0.0);
    let mut tips = Vec::new();
    for i in 0..200 {
        let tip = mesh.add_node_xyz(10.0, 10.0 + i as f64 * 1e-3, 0.0);
        mesh.add_edge([origin, tip]).unwrap();
        tips.push(tip);
    }

    let stats = mesh.spatial_index().stats();
    assert!(stats.max_depth <= MAX_TREE_DEPTH);
    for tip in tips {
        let p = mesh.node(tip).xy();
        assert!(mesh.get_element(p).is_some());
    }
}

#[test]
fn test_mixed_triangles_and_edges() {
    let mut mesh = RectMeshGenerator::new(4, 2, 4.0, 2.0).build().unwrap();
    let chain = PolylineMeshGenerator::new(vec![(0.0, 5.0), (8.0, 5.0)], 8)
        .append_to(&mut mesh)
        .unwrap();
    assert_eq!(chain.len(), 9);
    mesh.rebuild_spatial_index();

    let on_channel = mesh.get_element(DVec2::new(2.5, 5.0)).unwrap();
    assert_eq!(mesh.element(on_channel).kind(), ElementKind::Edge);
    let in_domain = mesh.get_element(DVec2::new(1.3, 0.4)).unwrap();
    assert_eq!(mesh.element(in_domain).kind(), ElementKind::Triangle);
}

#[test]
fn test_leaf_lists_every_intersecting_element() {
    let mut rng = StdRng::seed_from_u64(99);
    let mesh = jittered_mesh(&mut rng);
    let tree = mesh.spatial_index();

    for (cell, listed) in tree.leaves() {
        for (k, e) in mesh.elements().iter().enumerate() {
            if e.bounding_box().intersects(cell) {
                assert!(listed.contains(&ElementIndex::from_usize(k)));
            }
        }
    }
}

#[test]
fn test_centroid_and_vertices_contained() {
    let mut rng = StdRng::seed_from_u64(3);
    let mesh = jittered_mesh(&mut rng);
    for e in mesh.elements() {
        let t = e.as_triangle().unwrap();
        let nc = t.natural_coordinates(t.centroid()).unwrap();
        let sum: f64 = nc.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        for v in t.vertices() {
            assert!(t.contains_point(*v));
        }
    }
}

#[test]
fn test_points_beyond_element_box_rejected() {
    let mut rng = StdRng::seed_from_u64(7_310_2024);
    let mesh = jittered_mesh(&mut rng);

    for _ in 0..2000 {
        let e = ElementIndex::from_usize(rng.gen_range(0..mesh.n_elements()));
        let element = mesh.element(e);
        let bb = element.bounding_box();
        let h = element.max_edge_length();
        let gap = rng.gen_range(1e-6..0.5) * h;
        let x = rng.gen_range(bb.min_x - h..bb.max_x + h);
        let y = rng.gen_range(bb.min_y - h..bb.max_y + h);

        let p = match rng.gen_range(0..4) {
            0 => DVec2::new(bb.min_x - gap, y),
            1 => DVec2::new(bb.max_x + gap, y),
            2 => DVec2::new(x, bb.min_y - gap),
            _ => DVec2::new(x, bb.max_y + gap),
        };

        assert!(!element.contains_point(p), "{p} 在单元 {e} 的包围盒外");
        assert!(element.natural_coordinates(p).is_none());
        assert_ne!(mesh.get_element(p), Some(e));
    }
}
