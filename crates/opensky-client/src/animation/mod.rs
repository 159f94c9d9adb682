// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Fixed-rate animation scheduler.
//!
//! The scheduler owns the frame counter for the current fetch interval. The
//! host render loop asks [`AnimationScheduler::frame_due`] whether a frame
//! period has elapsed and then calls [`AnimationScheduler::tick`], which
//! samples every aircraft at `frame / frames_per_fetch`.

use std::time::{Duration, Instant};

use log::debug;

use crate::tracker::Fleet;

/// Default animation rate.
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 30;

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No animation running.
    Idle,
    /// Frame counter advancing.
    Running,
}

/// Drives per-frame sampling of a [`Fleet`].
#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    fetch_interval: Duration,
    frames_per_second: u32,
    state: SchedulerState,
    current_frame: u64,
    /// Incremented on every start; one running timer per generation.
    generation: u64,
    last_frame_at: Option<Instant>,
}

impl AnimationScheduler {
    /// Create an idle scheduler.
    #[must_use]
    pub fn new(fetch_interval: Duration, frames_per_second: u32) -> Self {
        Self {
            fetch_interval,
            frames_per_second: frames_per_second.max(1),
            state: SchedulerState::Idle,
            current_frame: 0,
            generation: 0,
            last_frame_at: None,
        }
    }

    /// Number of frames in one fetch interval.
    #[must_use]
    pub fn frames_per_fetch(&self) -> u64 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "interval and rate are small positive values"
        )]
        let frames = (self.fetch_interval.as_secs_f64() * f64::from(self.frames_per_second)).round() as u64;
        frames.max(1)
    }

    /// Time between two frames.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.frames_per_second
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    #[must_use]
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Progress through the current interval. Not clamped; may exceed 1.0 when
    /// the next snapshot is late.
    #[must_use]
    pub fn progress(&self) -> f64 {
        #[allow(clippy::cast_precision_loss, reason = "frame counts stay far below 2^52")]
        let progress = self.current_frame as f64 / self.frames_per_fetch() as f64;
        progress
    }

    /// Start (or restart) the animation from frame 0.
    ///
    /// Any previous run is superseded, so repeated calls leave exactly one
    /// running sequence.
    pub fn start(&mut self) {
        self.generation += 1;
        self.state = SchedulerState::Running;
        self.current_frame = 0;
        self.last_frame_at = None;
        debug!(
            "Animation started (generation {}, {} frames per fetch)",
            self.generation,
            self.frames_per_fetch()
        );
    }

    /// Stop advancing frames.
    pub fn stop(&mut self) {
        self.state = SchedulerState::Idle;
        self.last_frame_at = None;
    }

    /// Whether a frame should be rendered at `now`. Records `now` as the
    /// frame time when it returns `true`.
    pub fn frame_due(&mut self, now: Instant) -> bool {
        if !self.is_running() {
            return false;
        }

        match self.last_frame_at {
            Some(last) if now.saturating_duration_since(last) < self.frame_period() => false,
            _ => {
                self.last_frame_at = Some(now);
                true
            }
        }
    }

    /// How long the host loop may sleep before the next frame is due.
    #[must_use]
    pub fn time_until_next_frame(&self, now: Instant) -> Option<Duration> {
        if !self.is_running() {
            return None;
        }

        Some(match self.last_frame_at {
            Some(last) => self
                .frame_period()
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        })
    }

    /// Sample every aircraft at the current progress and advance one frame.
    ///
    /// Returns the progress that was sampled, or `None` when idle.
    pub fn tick(&mut self, fleet: &mut Fleet) -> Option<f64> {
        if !self.is_running() {
            return None;
        }

        let progress = self.progress();
        fleet.sample_all(progress);
        self.current_frame += 1;

        Some(progress)
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), DEFAULT_FRAMES_PER_SECOND)
    }
}
