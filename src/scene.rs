//! The two hard-coded demo scenes.
//!
//! Building a scene only touches the CPU: it returns the packed geometry and
//! the render items referring to it. [`Scene::upload`] then moves the geometry
//! into GPU buffers.

use std::collections::HashMap;

use cgmath::{Matrix4, Vector3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    config::DemoKind,
    data_structures::{
        geometry::{self, GeometryVertex, MeshBuilder},
        mesh::{MeshGeometry, Submesh},
        render_item::RenderItem,
        vertex::{ColorVertex, colors},
        waves::Waves,
    },
};

pub const SHAPE_GEOMETRY: &str = "shapeGeo";
pub const LAND_GEOMETRY: &str = "landGeo";
pub const WATER_GEOMETRY: &str = "waterGeo";

/// Seconds between two random disturbances of the water.
pub const DISTURB_INTERVAL: f32 = 0.25;

/// Disturbances stay this many rows and columns away from the border.
const DISTURB_MARGIN: u32 = 4;

/// Geometry as produced on the CPU, before it is uploaded.
#[derive(Debug)]
pub enum GeometrySource {
    /// Vertices and indices that never change.
    Static(MeshBuilder),
    /// Fixed indices; the vertices are rewritten every frame.
    Dynamic {
        vertex_count: u32,
        indices: Vec<u16>,
        draw_args: HashMap<String, Submesh>,
    },
}

impl GeometrySource {
    pub fn vertex_count(&self) -> u32 {
        match self {
            Self::Static(builder) => builder.vertices.len() as u32,
            Self::Dynamic { vertex_count, .. } => *vertex_count,
        }
    }

    pub fn draw_args(&self) -> &HashMap<String, Submesh> {
        match self {
            Self::Static(builder) => &builder.draw_args,
            Self::Dynamic { draw_args, .. } => draw_args,
        }
    }
}

#[derive(Debug)]
pub struct Scene {
    pub kind: DemoKind,
    pub geometries: Vec<(String, GeometrySource)>,
    pub items: Vec<RenderItem>,
    pub water: Option<WaterSimulation>,
}

impl Scene {
    /// Build the scene `kind`. Every render item starts dirty in all
    /// `frame_count` frame resources.
    pub fn build(kind: DemoKind, frame_count: usize) -> anyhow::Result<Self> {
        match kind {
            DemoKind::Shapes => build_shapes(frame_count),
            DemoKind::LandAndWaves => build_land_and_waves(frame_count),
        }
    }

    pub fn object_count(&self) -> u32 {
        self.items.len() as u32
    }

    /// Vertex count of the per-frame vertex buffer, if the scene animates one.
    pub fn dynamic_vertex_count(&self) -> Option<u32> {
        self.geometries
            .iter()
            .find_map(|(_, source)| match source {
                GeometrySource::Dynamic { vertex_count, .. } => Some(*vertex_count),
                GeometrySource::Static(_) => None,
            })
    }

    /// Move the geometry into GPU buffers, keyed by name.
    pub fn upload(&mut self, device: &wgpu::Device) -> HashMap<String, MeshGeometry> {
        std::mem::take(&mut self.geometries)
            .into_iter()
            .map(|(name, source)| {
                let mesh = match source {
                    GeometrySource::Static(builder) => MeshGeometry::upload(device, &name, builder),
                    GeometrySource::Dynamic {
                        vertex_count,
                        indices,
                        draw_args,
                    } => MeshGeometry::dynamic(device, &name, vertex_count, &indices, draw_args),
                };
                (name, mesh)
            })
            .collect()
    }
}

fn build_shapes(frame_count: usize) -> anyhow::Result<Scene> {
    let mut builder = MeshBuilder::new();
    let box_mesh = builder.push("box", &geometry::create_box(1.5, 0.5, 1.5, 3), colors::DARK_GREEN)?;
    let grid = builder.push("grid", &geometry::create_grid(20.0, 30.0, 60, 40), colors::FOREST_GREEN)?;
    let sphere = builder.push("sphere", &geometry::create_sphere(0.5, 20, 20), colors::CRIMSON)?;
    let cylinder = builder.push(
        "cylinder",
        &geometry::create_cylinder(0.5, 0.3, 3.0, 20, 20),
        colors::STEEL_BLUE,
    )?;

    let mut items = Vec::new();
    let mut push = |submesh: Submesh, world: Matrix4<f32>| {
        let index = items.len() as u32;
        items.push(RenderItem::new(SHAPE_GEOMETRY, submesh, world, index, frame_count));
    };

    push(
        box_mesh,
        Matrix4::from_translation(Vector3::new(0.0, 0.5, 0.0)) * Matrix4::from_scale(2.0),
    );
    push(grid, Matrix4::from_scale(1.0));

    for i in 0..5 {
        let z = -10.0 + i as f32 * 5.0;
        push(cylinder, Matrix4::from_translation(Vector3::new(-5.0, 1.5, z)));
        push(cylinder, Matrix4::from_translation(Vector3::new(5.0, 1.5, z)));
        push(sphere, Matrix4::from_translation(Vector3::new(-5.0, 3.5, z)));
        push(sphere, Matrix4::from_translation(Vector3::new(5.0, 3.5, z)));
    }

    Ok(Scene {
        kind: DemoKind::Shapes,
        geometries: vec![(SHAPE_GEOMETRY.to_string(), GeometrySource::Static(builder))],
        items,
        water: None,
    })
}

/// Height of the hills at `(x, z)`.
pub fn hills_height(x: f32, z: f32) -> f32 {
    0.3 * (z * (0.1 * x).sin() + x * (0.1 * z).cos())
}

/// Colour band of a terrain vertex by its height.
pub fn hills_color(y: f32) -> [f32; 4] {
    if y < -10.0 {
        colors::SANDY_BEACH
    } else if y < 5.0 {
        colors::LIGHT_YELLOW_GREEN
    } else if y < 12.0 {
        colors::DARK_YELLOW_GREEN
    } else if y < 20.0 {
        colors::DARK_BROWN
    } else {
        colors::SNOW
    }
}

fn build_land_and_waves(frame_count: usize) -> anyhow::Result<Scene> {
    let mut grid = geometry::create_grid(160.0, 160.0, 50, 50);
    for v in &mut grid.vertices {
        v.position[1] = hills_height(v.position[0], v.position[2]);
    }
    let mut land = MeshBuilder::new();
    let hills = land.push_with("grid", &grid, |v: &GeometryVertex| hills_color(v.position[1]))?;

    let simulation = WaterSimulation::new(Waves::new(128, 128, 1.0, 0.03, 4.0, 0.2))?;
    let water_indices = simulation.waves.indices();
    anyhow::ensure!(
        simulation.waves.vertex_count() <= u16::MAX as usize + 1,
        "The water grid does not fit 16-bit indices"
    );
    let water = Submesh {
        index_count: water_indices.len() as u32,
        start_index: 0,
        base_vertex: 0,
    };
    let water_source = GeometrySource::Dynamic {
        vertex_count: simulation.waves.vertex_count() as u32,
        indices: water_indices.iter().map(|&i| i as u16).collect(),
        draw_args: HashMap::from([("grid".to_string(), water)]),
    };

    let items = vec![
        RenderItem::identity(WATER_GEOMETRY, water, 0, frame_count),
        RenderItem::identity(LAND_GEOMETRY, hills, 1, frame_count),
    ];

    Ok(Scene {
        kind: DemoKind::LandAndWaves,
        geometries: vec![
            (LAND_GEOMETRY.to_string(), GeometrySource::Static(land)),
            (WATER_GEOMETRY.to_string(), water_source),
        ],
        items,
        water: Some(simulation),
    })
}

/// The wave simulation plus the random drops that keep it moving.
#[derive(Debug)]
pub struct WaterSimulation {
    pub waves: Waves,
    last_disturb: f32,
    rng: StdRng,
}

impl WaterSimulation {
    pub fn new(waves: Waves) -> anyhow::Result<Self> {
        Self::with_rng(waves, StdRng::from_entropy())
    }

    /// Deterministic disturbances, for tests.
    pub fn seeded(waves: Waves, seed: u64) -> anyhow::Result<Self> {
        Self::with_rng(waves, StdRng::seed_from_u64(seed))
    }

    fn with_rng(waves: Waves, rng: StdRng) -> anyhow::Result<Self> {
        let min_size = 2 * DISTURB_MARGIN + 1;
        anyhow::ensure!(
            waves.rows() >= min_size && waves.cols() >= min_size,
            "A {}x{} water grid leaves no room for disturbances, at least {}x{} is needed",
            waves.rows(),
            waves.cols(),
            min_size,
            min_size
        );
        Ok(Self {
            waves,
            last_disturb: 0.0,
            rng,
        })
    }

    /// Drop a random disturbance every [`DISTURB_INTERVAL`] and step the waves.
    pub fn update(&mut self, total_time: f32, delta_time: f32) -> anyhow::Result<()> {
        if total_time - self.last_disturb >= DISTURB_INTERVAL {
            self.last_disturb += DISTURB_INTERVAL;
            let i = self
                .rng
                .gen_range(DISTURB_MARGIN..self.waves.rows() - DISTURB_MARGIN);
            let j = self
                .rng
                .gen_range(DISTURB_MARGIN..self.waves.cols() - DISTURB_MARGIN);
            let magnitude = self.rng.gen_range(0.2..0.5);
            self.waves.disturb(i, j, magnitude)?;
        }
        self.waves.update(delta_time);
        Ok(())
    }

    pub fn vertices(&self) -> Vec<ColorVertex> {
        self.waves
            .positions()
            .iter()
            .map(|p| ColorVertex::new((*p).into(), colors::BLUE))
            .collect()
    }
}
