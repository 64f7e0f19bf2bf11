use cgmath::{InnerSpace, Vector3};
use orbit_shapes::data_structures::geometry::{
    MeshBuilder, MeshData, create_box, create_cylinder, create_grid, create_sphere, grid_indices,
};

fn assert_indices_in_range(mesh: &MeshData) {
    assert_eq!(mesh.indices.len() % 3, 0);
    let count = mesh.vertices.len() as u32;
    assert!(mesh.indices.iter().all(|&i| i < count));
}

/// Clockwise front faces in a left-handed frame: the cross product of the
/// first two edges points along the vertex normal.
fn assert_front_faces_outward(mesh: &MeshData) {
    for tri in mesh.indices.chunks_exact(3) {
        let p = |i: u32| Vector3::from(mesh.vertices[i as usize].position);
        let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
        let normal = Vector3::from(mesh.vertices[tri[0] as usize].normal);
        assert!(
            face.dot(normal) > 0.0,
            "triangle {:?} faces away from its normal",
            tri
        );
    }
}

#[test]
fn box_without_subdivision() {
    let mesh = create_box(1.0, 2.0, 3.0, 0);
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.indices.len(), 36);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);
    for v in &mesh.vertices {
        assert_eq!(v.position[0].abs(), 0.5);
        assert_eq!(v.position[1].abs(), 1.0);
        assert_eq!(v.position[2].abs(), 1.5);
    }
}

#[test]
fn box_subdivisions_quadruple_the_triangles() {
    let mesh = create_box(1.5, 0.5, 1.5, 3);
    assert_eq!(mesh.vertices.len(), 1152);
    assert_eq!(mesh.indices.len(), 2304);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);
}

#[test]
fn box_subdivisions_are_capped() {
    let capped = create_box(1.0, 1.0, 1.0, 6);
    let requested = create_box(1.0, 1.0, 1.0, 9);
    assert_eq!(capped.indices.len(), requested.indices.len());
    assert_eq!(capped.indices.len(), 36 * 4usize.pow(6));
}

#[test]
fn sphere_counts() {
    let mesh = create_sphere(0.5, 20, 20);
    // poles + 19 rings of 21
    assert_eq!(mesh.vertices.len(), 2 + 19 * 21);
    assert_eq!(mesh.vertices.len(), 401);
    assert_eq!(mesh.indices.len(), 2280);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);
    for v in &mesh.vertices {
        let r = Vector3::from(v.position).magnitude();
        assert!((r - 0.5).abs() < 1e-5);
    }
}

#[test]
fn cylinder_counts() {
    let mesh = create_cylinder(0.5, 0.3, 3.0, 20, 20);
    // 21 rings of 21 on the side, each cap a ring of 21 plus its centre
    assert_eq!(mesh.vertices.len(), 21 * 21 + 2 * 22);
    assert_eq!(mesh.vertices.len(), 485);
    assert_eq!(mesh.indices.len(), 20 * 20 * 6 + 2 * 20 * 3);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);

    let ys: Vec<f32> = mesh.vertices.iter().map(|v| v.position[1]).collect();
    let min = ys.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    assert!((min + 1.5).abs() < 1e-5);
    assert!((max - 1.5).abs() < 1e-5);
}

#[test]
fn cylinder_tapers_from_bottom_to_top() {
    let mesh = create_cylinder(0.5, 0.3, 3.0, 20, 20);
    let radius = |i: usize| {
        let p = mesh.vertices[i].position;
        (p[0] * p[0] + p[2] * p[2]).sqrt()
    };
    assert!((radius(0) - 0.5).abs() < 1e-5);
    assert!((radius(20 * 21) - 0.3).abs() < 1e-5);
}

#[test]
fn grid_counts_and_extent() {
    let mesh = create_grid(20.0, 30.0, 60, 40);
    assert_eq!(mesh.vertices.len(), 2400);
    assert_eq!(mesh.indices.len(), 59 * 39 * 6);
    assert_eq!(mesh.indices.len(), 13806);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);
    assert_eq!(mesh.vertices[0].position, [-10.0, 0.0, 15.0]);
    let last = mesh.vertices.last().unwrap().position;
    assert!((last[0] - 10.0).abs() < 1e-4);
    assert!((last[2] + 15.0).abs() < 1e-4);
}

#[test]
fn degenerate_grid_is_empty() {
    assert!(create_grid(1.0, 1.0, 1, 10).vertices.is_empty());
    assert!(grid_indices(1, 10).is_empty());
    assert_eq!(grid_indices(2, 2), vec![0, 1, 2, 2, 1, 3]);
}

#[test]
fn degenerate_spheres_and_cylinders_are_empty() {
    for (slices, stacks) in [(8, 1), (8, 0), (2, 8), (0, 0)] {
        let sphere = create_sphere(1.0, slices, stacks);
        assert!(sphere.vertices.is_empty() && sphere.indices.is_empty());
    }
    for (slices, stacks) in [(8, 0), (2, 8), (0, 0)] {
        let cylinder = create_cylinder(1.0, 0.5, 2.0, slices, stacks);
        assert!(cylinder.vertices.is_empty() && cylinder.indices.is_empty());
    }
}

#[test]
fn smallest_sphere_is_closed() {
    let mesh = create_sphere(1.0, 3, 2);
    // poles + one ring of 4
    assert_eq!(mesh.vertices.len(), 6);
    assert_eq!(mesh.indices.len(), 18);
    assert_indices_in_range(&mesh);
    assert_front_faces_outward(&mesh);

    let mesh = create_cylinder(1.0, 0.5, 2.0, 3, 1);
    assert_eq!(mesh.vertices.len(), 2 * 4 + 2 * 5);
    assert_indices_in_range(&mesh);
}

#[test]
fn builder_concatenates_parts() {
    let box_mesh = create_box(1.0, 1.0, 1.0, 0);
    let sphere = create_sphere(1.0, 8, 8);
    let mut builder = MeshBuilder::new();
    let first = builder.push("box", &box_mesh, [1.0, 0.0, 0.0, 1.0]).unwrap();
    let second = builder.push("sphere", &sphere, [0.0, 0.0, 1.0, 1.0]).unwrap();

    assert_eq!(first.start_index, 0);
    assert_eq!(first.base_vertex, 0);
    assert_eq!(first.index_count, 36);
    assert_eq!(second.start_index, 36);
    assert_eq!(second.base_vertex, 24);
    assert_eq!(second.index_count as usize, sphere.indices.len());

    assert_eq!(builder.vertices.len(), 24 + sphere.vertices.len());
    assert_eq!(builder.indices.len(), 36 + sphere.indices.len());
    assert_eq!(builder.vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(builder.vertices[24].color, [0.0, 0.0, 1.0, 1.0]);
    // Indices stay local to each part.
    assert_eq!(&builder.indices[36..], sphere.indices16().as_slice());
    assert_eq!(builder.draw_args["sphere"], second);
}

#[test]
fn builder_rejects_duplicates_and_oversized_meshes() {
    let mut builder = MeshBuilder::new();
    builder.push("grid", &create_grid(1.0, 1.0, 2, 2), [1.0; 4]).unwrap();
    assert!(builder.push("grid", &create_grid(1.0, 1.0, 2, 2), [1.0; 4]).is_err());
    assert!(builder.push("huge", &create_grid(1.0, 1.0, 300, 300), [1.0; 4]).is_err());
}

#[test]
fn builder_colours_per_vertex() {
    let mut builder = MeshBuilder::new();
    let grid = create_grid(2.0, 2.0, 3, 3);
    builder
        .push_with("grid", &grid, |v| if v.position[0] < 0.0 { [0.0; 4] } else { [1.0; 4] })
        .unwrap();
    assert_eq!(builder.vertices[0].color, [0.0; 4]);
    assert_eq!(builder.vertices[2].color, [1.0; 4]);
}
