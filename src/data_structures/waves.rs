//! Water surface simulated with the damped 2D wave equation.
//!
//! The surface is an `m` x `n` vertex grid in the xz-plane. Heights are
//! advanced with an explicit finite-difference scheme at a fixed time step;
//! the border rows and columns are held at zero.

use cgmath::{InnerSpace, Vector3};

use crate::data_structures::geometry::grid_indices;

#[derive(Debug, Clone)]
pub struct Waves {
    rows: u32,
    cols: u32,
    time_step: f32,
    spatial_step: f32,
    k1: f32,
    k2: f32,
    k3: f32,
    accumulated: f32,
    prev: Vec<Vector3<f32>>,
    curr: Vec<Vector3<f32>>,
    normals: Vec<Vector3<f32>>,
}

impl Waves {
    pub fn new(m: u32, n: u32, dx: f32, dt: f32, speed: f32, damping: f32) -> Self {
        let d = damping * dt + 2.0;
        let e = (speed * speed) * (dt * dt) / (dx * dx);
        let k1 = (damping * dt - 2.0) / d;
        let k2 = (4.0 - 8.0 * e) / d;
        let k3 = (2.0 * e) / d;

        let count = (m * n) as usize;
        let half_width = (n.saturating_sub(1)) as f32 * dx * 0.5;
        let half_depth = (m.saturating_sub(1)) as f32 * dx * 0.5;
        let mut curr = Vec::with_capacity(count);
        for i in 0..m {
            let z = half_depth - i as f32 * dx;
            for j in 0..n {
                let x = -half_width + j as f32 * dx;
                curr.push(Vector3::new(x, 0.0, z));
            }
        }

        Self {
            rows: m,
            cols: n,
            time_step: dt,
            spatial_step: dx,
            k1,
            k2,
            k3,
            accumulated: 0.0,
            prev: curr.clone(),
            curr,
            normals: vec![Vector3::unit_y(); count],
        }
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn vertex_count(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    pub fn triangle_count(&self) -> usize {
        (self.rows.saturating_sub(1) * self.cols.saturating_sub(1) * 2) as usize
    }

    pub fn position(&self, i: usize) -> Vector3<f32> {
        self.curr[i]
    }

    pub fn normal(&self, i: usize) -> Vector3<f32> {
        self.normals[i]
    }

    pub fn positions(&self) -> &[Vector3<f32>] {
        &self.curr
    }

    pub fn indices(&self) -> Vec<u32> {
        grid_indices(self.rows, self.cols)
    }

    /// Accumulate `dt` and take one simulation step once a full time step has passed.
    ///
    /// Returns whether the surface changed.
    pub fn update(&mut self, dt: f32) -> bool {
        self.accumulated += dt;
        if self.accumulated < self.time_step {
            return false;
        }
        self.accumulated = 0.0;

        let n = self.cols as usize;
        for i in 1..(self.rows as usize).saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let k = i * n + j;
                // The previous solution is no longer needed, so the next one is written over it.
                self.prev[k].y = self.k1 * self.prev[k].y
                    + self.k2 * self.curr[k].y
                    + self.k3
                        * (self.curr[k + n].y
                            + self.curr[k - n].y
                            + self.curr[k + 1].y
                            + self.curr[k - 1].y);
            }
        }
        std::mem::swap(&mut self.prev, &mut self.curr);

        let two_dx = 2.0 * self.spatial_step;
        for i in 1..(self.rows as usize).saturating_sub(1) {
            for j in 1..n.saturating_sub(1) {
                let k = i * n + j;
                let l = self.curr[k - 1].y;
                let r = self.curr[k + 1].y;
                let t = self.curr[k - n].y;
                let b = self.curr[k + n].y;
                self.normals[k] = Vector3::new(-r + l, two_dx, b - t).normalize();
            }
        }
        true
    }

    /// Push the surface at interior vertex `(i, j)` up by `magnitude`, and its
    /// four neighbours by half of it.
    pub fn disturb(&mut self, i: u32, j: u32, magnitude: f32) -> anyhow::Result<()> {
        anyhow::ensure!(
            i > 1 && i + 2 < self.rows && j > 1 && j + 2 < self.cols,
            "Disturbance at ({}, {}) is too close to the border of a {}x{} grid",
            i,
            j,
            self.rows,
            self.cols
        );
        let n = self.cols as usize;
        let k = i as usize * n + j as usize;
        let half = 0.5 * magnitude;
        self.curr[k].y += magnitude;
        self.curr[k + 1].y += half;
        self.curr[k - 1].y += half;
        self.curr[k + n].y += half;
        self.curr[k - n].y += half;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_flat_and_centred() {
        let waves = Waves::new(4, 5, 1.0, 0.03, 4.0, 0.2);
        assert_eq!(waves.vertex_count(), 20);
        assert_eq!(waves.triangle_count(), 24);
        assert_eq!(waves.position(0), Vector3::new(-2.0, 0.0, 1.5));
        assert_eq!(waves.position(19), Vector3::new(2.0, 0.0, -1.5));
        assert!(waves.positions().iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn only_steps_after_a_full_time_step() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(5, 5, 0.5).unwrap();
        assert!(!waves.update(0.01));
        assert!(!waves.update(0.01));
        assert!(waves.update(0.015));
    }

    #[test]
    fn disturbance_spreads_to_neighbours() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(5, 5, 0.4).unwrap();
        let k = 5 * 10 + 5;
        assert_eq!(waves.position(k).y, 0.4);
        assert_eq!(waves.position(k + 1).y, 0.2);
        assert_eq!(waves.position(k - 10).y, 0.2);

        waves.update(0.03);
        // Diagonal neighbour picks up height after one step.
        assert!(waves.position(k + 11).y > 0.0);
    }

    #[test]
    fn normals_tilt_away_from_a_crest() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);
        let k = 5 * 10 + 5;
        assert_eq!(waves.normal(k), Vector3::unit_y());

        waves.disturb(5, 5, 0.4).unwrap();
        waves.update(0.03);
        assert!(waves.normal(k + 1).x > 0.0);
        assert!(waves.normal(k - 1).x < 0.0);
        // Rows run towards -z, so the row below the crest tilts towards -z.
        assert!(waves.normal(k + 10).z < 0.0);
        assert!(waves.normal(k - 10).z > 0.0);
        assert!((waves.normal(k + 1).magnitude() - 1.0).abs() < 1e-5);
        // Far from the disturbance the surface is still flat.
        assert_eq!(waves.normal(10 + 1), Vector3::unit_y());
    }

    #[test]
    fn border_stays_still() {
        let mut waves = Waves::new(12, 12, 1.0, 0.03, 4.0, 0.2);
        waves.disturb(3, 3, 0.5).unwrap();
        for _ in 0..50 {
            waves.update(0.03);
        }
        for j in 0..12 {
            assert_eq!(waves.position(j).y, 0.0);
            assert_eq!(waves.position(11 * 12 + j).y, 0.0);
        }
    }

    #[test]
    fn rejects_disturbance_near_border() {
        let mut waves = Waves::new(10, 10, 1.0, 0.03, 4.0, 0.2);
        assert!(waves.disturb(1, 5, 0.5).is_err());
        assert!(waves.disturb(5, 8, 0.5).is_err());
        assert!(waves.disturb(2, 7, 0.5).is_ok());
    }
}
