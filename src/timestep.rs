//! Fixed timestep driver
//!
//! Real frame deltas go into an accumulator that is drained in constant
//! steps, so the simulation never sees a variable dt. Whatever is left over
//! becomes the interpolation factor for rendering.

use serde::Serialize;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};

/// Frames averaged for the FPS estimate
const FPS_WINDOW: usize = 60;

/// What one real frame did
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepReport {
    /// Fixed steps executed
    pub steps: u32,
    /// Leftover fraction of a step, in [0, 1)
    pub alpha: f32,
    /// Seconds thrown away because the substep limit was hit
    pub dropped: f32,
}

#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_frame_dt: f32,
    max_substeps: u32,
    accumulator: f32,
    alpha: f32,
    // FPS tracking
    frame_times: [f32; FPS_WINDOW],
    frame_index: usize,
    frame_count: usize,
    fps: u32,
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(SIM_DT)
    }
}

impl FixedTimestep {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            max_frame_dt: MAX_FRAME_DT,
            max_substeps: MAX_SUBSTEPS,
            accumulator: 0.0,
            alpha: 0.0,
            frame_times: [0.0; FPS_WINDOW],
            frame_index: 0,
            frame_count: 0,
            fps: 0,
        }
    }

    /// Override the frame clamp and substep limit
    pub fn with_limits(mut self, max_frame_dt: f32, max_substeps: u32) -> Self {
        self.max_frame_dt = max_frame_dt;
        self.max_substeps = max_substeps.max(1);
        self
    }

    #[inline]
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Interpolation factor from the last frame
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Rolling frames-per-second estimate
    #[inline]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Feed one real frame delta, running `update` once per fixed step
    pub fn advance<F: FnMut(f32)>(&mut self, dt: f32, mut update: F) -> StepReport {
        if dt.is_nan() || dt <= 0.0 {
            return StepReport {
                steps: 0,
                alpha: self.alpha,
                dropped: 0.0,
            };
        }

        let dt = dt.min(self.max_frame_dt);
        self.accumulator += dt;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_substeps {
            update(self.step);
            self.accumulator -= self.step;
            steps += 1;
        }

        // Behind by whole steps: give them up and keep only the fraction
        let mut dropped = 0.0;
        if self.accumulator >= self.step {
            let kept = self.accumulator % self.step;
            dropped = self.accumulator - kept;
            self.accumulator = kept;
            log::warn!("Simulation fell behind, dropped {dropped:.3}s");
        }

        self.alpha = (self.accumulator / self.step).clamp(0.0, 1.0 - f32::EPSILON);
        self.track_fps(dt);

        StepReport {
            steps,
            alpha: self.alpha,
            dropped,
        }
    }

    fn track_fps(&mut self, dt: f32) {
        self.frame_times[self.frame_index] = dt;
        self.frame_index = (self.frame_index + 1) % FPS_WINDOW;
        self.frame_count = (self.frame_count + 1).min(FPS_WINDOW);

        let elapsed: f32 = self.frame_times[..self.frame_count].iter().sum();
        if elapsed > 0.0 {
            self.fps = (self.frame_count as f32 / elapsed).round() as u32;
        }
    }
}
