//! Frame timing.
//!
//! [`GameTimer`] measures the time between frames and the total running time
//! while leaving out the intervals the application spent paused. Every method
//! that reads the clock has an `_at` variant taking the instant explicitly.

use instant::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct GameTimer {
    base: Instant,
    paused: Duration,
    stop_time: Option<Instant>,
    prev: Instant,
    curr: Instant,
    delta: f64,
}

impl Default for GameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTimer {
    pub fn new() -> Self {
        Self::new_at(Instant::now())
    }

    pub fn new_at(now: Instant) -> Self {
        Self {
            base: now,
            paused: Duration::ZERO,
            stop_time: None,
            prev: now,
            curr: now,
            delta: -1.0,
        }
    }

    /// Seconds elapsed since [`reset`](Self::reset), not counting paused time.
    pub fn total_time(&self) -> f32 {
        let end = self.stop_time.unwrap_or(self.curr);
        end.saturating_duration_since(self.base)
            .saturating_sub(self.paused)
            .as_secs_f32()
    }

    /// Seconds between the last two ticks.
    pub fn delta_time(&self) -> f32 {
        self.delta.max(0.0) as f32
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_time.is_some()
    }

    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&mut self, now: Instant) {
        *self = Self::new_at(now);
    }

    /// Resume after [`stop`](Self::stop). Does nothing if the timer runs.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        if let Some(stop_time) = self.stop_time.take() {
            self.paused += now.saturating_duration_since(stop_time);
            self.prev = now;
        }
    }

    pub fn stop(&mut self) {
        self.stop_at(Instant::now());
    }

    pub fn stop_at(&mut self, now: Instant) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    /// Advance by one frame.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if self.is_stopped() {
            self.delta = 0.0;
            return;
        }
        self.curr = now;
        // Instants can compare out of order across cores after a sleep.
        self.delta = now.saturating_duration_since(self.prev).as_secs_f64();
        self.prev = now;
    }
}

/// Frames per second and milliseconds per frame, averaged over one second.
#[derive(Debug, Default, Clone)]
pub struct FrameStats {
    frame_count: u32,
    elapsed: f32,
    latest: Option<(f32, f32)>,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one frame. Returns `(fps, mspf)` whenever another second of
    /// total time has passed.
    pub fn record(&mut self, total_time: f32) -> Option<(f32, f32)> {
        self.frame_count += 1;
        if total_time - self.elapsed < 1.0 {
            return None;
        }
        let fps = self.frame_count as f32;
        let mspf = 1000.0 / fps;
        self.frame_count = 0;
        self.elapsed += 1.0;
        self.latest = Some((fps, mspf));
        self.latest
    }

    pub fn caption(&self, title: &str) -> String {
        match self.latest {
            Some((fps, mspf)) => format_caption(title, fps, mspf),
            None => title.to_string(),
        }
    }
}

pub fn format_caption(title: &str, fps: f32, mspf: f32) -> String {
    format!("{}    fps: {}   mspf: {}", title, fps, mspf)
}
