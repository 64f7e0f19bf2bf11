//! Procedural mesh generation.
//!
//! All generators produce left-handed geometry with clockwise front faces,
//! centred on the origin. Meshes are plain CPU data; [`MeshBuilder`] packs
//! several of them into one vertex/index pair ready for upload.

use std::{collections::HashMap, f32::consts::PI};

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::{mesh::Submesh, vertex::ColorVertex};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeometryVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl GeometryVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    fn midpoint(&self, other: &Self) -> Self {
        let p0 = Vector3::from(self.position);
        let p1 = Vector3::from(other.position);
        let n0 = Vector3::from(self.normal);
        let n1 = Vector3::from(other.normal);
        let normal = (n0 + n1) * 0.5;
        let normal = if normal.magnitude2() > 0.0 {
            normal.normalize()
        } else {
            normal
        };
        Self {
            position: ((p0 + p1) * 0.5).into(),
            normal: normal.into(),
            tex_coords: [
                (self.tex_coords[0] + other.tex_coords[0]) * 0.5,
                (self.tex_coords[1] + other.tex_coords[1]) * 0.5,
            ],
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<GeometryVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Indices narrowed to 16 bits. Only valid for meshes below 65536 vertices.
    pub fn indices16(&self) -> Vec<u16> {
        self.indices.iter().map(|&i| i as u16).collect()
    }

    /// Split every triangle into four by inserting edge midpoints.
    ///
    /// ```text
    ///        v1
    ///        *
    ///       / \
    ///   m0 *---* m1
    ///     / \ / \
    ///    *---*---*
    ///   v0   m2   v2
    /// ```
    fn subdivide(&mut self) {
        let input = std::mem::take(self);
        let triangles = input.indices.len() / 3;
        self.vertices.reserve(triangles * 6);
        self.indices.reserve(triangles * 12);
        for (t, tri) in input.indices.chunks_exact(3).enumerate() {
            let v0 = input.vertices[tri[0] as usize];
            let v1 = input.vertices[tri[1] as usize];
            let v2 = input.vertices[tri[2] as usize];
            let m0 = v0.midpoint(&v1);
            let m1 = v1.midpoint(&v2);
            let m2 = v0.midpoint(&v2);
            self.vertices.extend([v0, v1, v2, m0, m1, m2]);
            let base = (t * 6) as u32;
            self.indices.extend([
                base, base + 3, base + 5,
                base + 3, base + 4, base + 5,
                base + 5, base + 4, base + 2,
                base + 3, base + 1, base + 4,
            ]);
        }
    }
}

/// Axis-aligned box. Each face has its own four vertices so normals stay flat.
pub fn create_box(width: f32, height: f32, depth: f32, subdivisions: u32) -> MeshData {
    let w2 = 0.5 * width;
    let h2 = 0.5 * height;
    let d2 = 0.5 * depth;
    let v = GeometryVertex::new;

    let vertices = vec![
        // front
        v([-w2, -h2, -d2], [0.0, 0.0, -1.0], [0.0, 1.0]),
        v([-w2, h2, -d2], [0.0, 0.0, -1.0], [0.0, 0.0]),
        v([w2, h2, -d2], [0.0, 0.0, -1.0], [1.0, 0.0]),
        v([w2, -h2, -d2], [0.0, 0.0, -1.0], [1.0, 1.0]),
        // back
        v([-w2, -h2, d2], [0.0, 0.0, 1.0], [1.0, 1.0]),
        v([w2, -h2, d2], [0.0, 0.0, 1.0], [0.0, 1.0]),
        v([w2, h2, d2], [0.0, 0.0, 1.0], [0.0, 0.0]),
        v([-w2, h2, d2], [0.0, 0.0, 1.0], [1.0, 0.0]),
        // top
        v([-w2, h2, -d2], [0.0, 1.0, 0.0], [0.0, 1.0]),
        v([-w2, h2, d2], [0.0, 1.0, 0.0], [0.0, 0.0]),
        v([w2, h2, d2], [0.0, 1.0, 0.0], [1.0, 0.0]),
        v([w2, h2, -d2], [0.0, 1.0, 0.0], [1.0, 1.0]),
        // bottom
        v([-w2, -h2, -d2], [0.0, -1.0, 0.0], [1.0, 1.0]),
        v([w2, -h2, -d2], [0.0, -1.0, 0.0], [0.0, 1.0]),
        v([w2, -h2, d2], [0.0, -1.0, 0.0], [0.0, 0.0]),
        v([-w2, -h2, d2], [0.0, -1.0, 0.0], [1.0, 0.0]),
        // left
        v([-w2, -h2, d2], [-1.0, 0.0, 0.0], [0.0, 1.0]),
        v([-w2, h2, d2], [-1.0, 0.0, 0.0], [0.0, 0.0]),
        v([-w2, h2, -d2], [-1.0, 0.0, 0.0], [1.0, 0.0]),
        v([-w2, -h2, -d2], [-1.0, 0.0, 0.0], [1.0, 1.0]),
        // right
        v([w2, -h2, -d2], [1.0, 0.0, 0.0], [0.0, 1.0]),
        v([w2, h2, -d2], [1.0, 0.0, 0.0], [0.0, 0.0]),
        v([w2, h2, d2], [1.0, 0.0, 0.0], [1.0, 0.0]),
        v([w2, -h2, d2], [1.0, 0.0, 0.0], [1.0, 1.0]),
    ];

    let indices = (0..6u32)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b, b + 2, b + 3]
        })
        .collect();

    let mut mesh = MeshData { vertices, indices };
    for _ in 0..subdivisions.min(6) {
        mesh.subdivide();
    }
    mesh
}

/// UV sphere: a vertex at each pole plus `stacks - 1` rings of `slices + 1` vertices.
///
/// The first and last vertex of each ring share a position but not texture coordinates.
/// Fewer than 3 slices or 2 stacks give an empty mesh.
pub fn create_sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let mut mesh = MeshData::default();
    if slices < 3 || stacks < 2 {
        return mesh;
    }
    mesh.vertices.push(GeometryVertex::new(
        [0.0, radius, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0],
    ));

    let phi_step = PI / stacks as f32;
    let theta_step = 2.0 * PI / slices as f32;
    for i in 1..stacks {
        let phi = i as f32 * phi_step;
        for j in 0..=slices {
            let theta = j as f32 * theta_step;
            let position = Vector3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            );
            mesh.vertices.push(GeometryVertex::new(
                position.into(),
                position.normalize().into(),
                [theta / (2.0 * PI), phi / PI],
            ));
        }
    }

    mesh.vertices.push(GeometryVertex::new(
        [0.0, -radius, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 1.0],
    ));

    // Top stack connects to the north pole.
    for i in 1..=slices {
        mesh.indices.extend([0, i + 1, i]);
    }

    // Inner stacks; skip the pole vertex at index 0.
    let base = 1;
    let ring = slices + 1;
    for i in 0..stacks.saturating_sub(2) {
        for j in 0..slices {
            mesh.indices.extend([
                base + i * ring + j,
                base + i * ring + j + 1,
                base + (i + 1) * ring + j,
                base + (i + 1) * ring + j,
                base + i * ring + j + 1,
                base + (i + 1) * ring + j + 1,
            ]);
        }
    }

    // Bottom stack connects to the south pole, which was added last.
    let south_pole = mesh.vertices.len() as u32 - 1;
    let base = south_pole - ring;
    for i in 0..slices {
        mesh.indices.extend([south_pole, base + i, base + i + 1]);
    }

    mesh
}

/// Truncated cone along the y-axis, centred on the origin, with both caps closed.
/// Fewer than 3 slices or no stacks give an empty mesh.
pub fn create_cylinder(
    bottom_radius: f32,
    top_radius: f32,
    height: f32,
    slices: u32,
    stacks: u32,
) -> MeshData {
    let mut mesh = MeshData::default();
    if slices < 3 || stacks < 1 {
        return mesh;
    }

    let stack_height = height / stacks as f32;
    let radius_step = (top_radius - bottom_radius) / stacks as f32;
    let theta_step = 2.0 * PI / slices as f32;

    for i in 0..=stacks {
        let y = -0.5 * height + i as f32 * stack_height;
        let r = bottom_radius + i as f32 * radius_step;
        for j in 0..=slices {
            let (s, c) = (j as f32 * theta_step).sin_cos();
            let tangent = Vector3::new(-s, 0.0, c);
            let dr = bottom_radius - top_radius;
            let bitangent = Vector3::new(dr * c, -height, dr * s);
            let normal = tangent.cross(bitangent).normalize();
            mesh.vertices.push(GeometryVertex::new(
                [r * c, y, r * s],
                normal.into(),
                [j as f32 / slices as f32, 1.0 - i as f32 / stacks as f32],
            ));
        }
    }

    let ring = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            mesh.indices.extend([
                i * ring + j,
                (i + 1) * ring + j,
                (i + 1) * ring + j + 1,
                i * ring + j,
                (i + 1) * ring + j + 1,
                i * ring + j + 1,
            ]);
        }
    }

    build_cylinder_cap(&mut mesh, top_radius, 0.5 * height, slices, true);
    build_cylinder_cap(&mut mesh, bottom_radius, -0.5 * height, slices, false);
    mesh
}

fn build_cylinder_cap(mesh: &mut MeshData, radius: f32, y: f32, slices: u32, top: bool) {
    let base = mesh.vertices.len() as u32;
    let height = 2.0 * y.abs();
    let normal = if top { [0.0, 1.0, 0.0] } else { [0.0, -1.0, 0.0] };
    let theta_step = 2.0 * PI / slices as f32;

    // Ring vertices are duplicated because cap texture coordinates and normals differ from the sides.
    for i in 0..=slices {
        let (s, c) = (i as f32 * theta_step).sin_cos();
        let x = radius * c;
        let z = radius * s;
        mesh.vertices.push(GeometryVertex::new(
            [x, y, z],
            normal,
            [x / height + 0.5, z / height + 0.5],
        ));
    }
    mesh.vertices
        .push(GeometryVertex::new([0.0, y, 0.0], normal, [0.5, 0.5]));

    let center = mesh.vertices.len() as u32 - 1;
    for i in 0..slices {
        if top {
            mesh.indices.extend([center, base + i + 1, base + i]);
        } else {
            mesh.indices.extend([center, base + i, base + i + 1]);
        }
    }
}

/// Flat `m` x `n` vertex grid in the xz-plane.
pub fn create_grid(width: f32, depth: f32, m: u32, n: u32) -> MeshData {
    let mut mesh = MeshData::default();
    if m < 2 || n < 2 {
        return mesh;
    }
    let half_width = 0.5 * width;
    let half_depth = 0.5 * depth;
    let dx = width / (n - 1) as f32;
    let dz = depth / (m - 1) as f32;
    let du = 1.0 / (n - 1) as f32;
    let dv = 1.0 / (m - 1) as f32;

    mesh.vertices.reserve((m * n) as usize);
    for i in 0..m {
        let z = half_depth - i as f32 * dz;
        for j in 0..n {
            let x = -half_width + j as f32 * dx;
            mesh.vertices.push(GeometryVertex::new(
                [x, 0.0, z],
                [0.0, 1.0, 0.0],
                [j as f32 * du, i as f32 * dv],
            ));
        }
    }
    mesh.indices = grid_indices(m, n);
    mesh
}

/// Two triangles per grid cell, row major.
pub fn grid_indices(m: u32, n: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(((m.saturating_sub(1)) * (n.saturating_sub(1)) * 6) as usize);
    for i in 0..m.saturating_sub(1) {
        for j in 0..n.saturating_sub(1) {
            indices.extend([
                i * n + j,
                i * n + j + 1,
                (i + 1) * n + j,
                (i + 1) * n + j,
                i * n + j + 1,
                (i + 1) * n + j + 1,
            ]);
        }
    }
    indices
}

/// Packs several meshes into one vertex buffer and one 16-bit index buffer.
///
/// Indices stay local to each part; the part's `base_vertex` is added at draw time.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    pub vertices: Vec<ColorVertex>,
    pub indices: Vec<u16>,
    pub draw_args: HashMap<String, Submesh>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `mesh` with every vertex painted `color`.
    pub fn push(&mut self, name: &str, mesh: &MeshData, color: [f32; 4]) -> anyhow::Result<Submesh> {
        self.push_with(name, mesh, |_| color)
    }

    /// Append `mesh`, colouring each vertex with `color_of`.
    pub fn push_with<F>(&mut self, name: &str, mesh: &MeshData, color_of: F) -> anyhow::Result<Submesh>
    where
        F: Fn(&GeometryVertex) -> [f32; 4],
    {
        anyhow::ensure!(
            mesh.vertices.len() <= u16::MAX as usize + 1,
            "Mesh '{}' has {} vertices which does not fit 16-bit indices",
            name,
            mesh.vertices.len()
        );
        anyhow::ensure!(
            !self.draw_args.contains_key(name),
            "Duplicate submesh name '{}'",
            name
        );
        let submesh = Submesh {
            index_count: mesh.indices.len() as u32,
            start_index: self.indices.len() as u32,
            base_vertex: self.vertices.len() as i32,
        };
        self.vertices.extend(
            mesh.vertices
                .iter()
                .map(|v| ColorVertex::new(v.position, color_of(v))),
        );
        self.indices.extend(mesh.indices16());
        self.draw_args.insert(name.to_string(), submesh);
        Ok(submesh)
    }
}
