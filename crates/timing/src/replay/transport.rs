//! Playback transport: play/pause/seek over a loaded race, driven by its own
//! frame loop and independent of the clock engine.

use bevy::prelude::*;

use crate::config::{clamp_replay_speed, DEFAULT_REPLAY_SPEED};
use crate::frame_task::FrameTask;

#[derive(Resource, Debug, Clone)]
pub struct ReplayTransport {
    /// Playback cursor in race milliseconds.
    current_ms: f64,
    playing: bool,
    speed: f64,
    /// Largest `total_ms` of the loaded race; the cursor never exceeds it.
    max_total_ms: u64,
    /// Engine time of the previous frame, for frame deltas.
    last_frame_ms: Option<u64>,
    ticker: FrameTask,
}

impl Default for ReplayTransport {
    fn default() -> Self {
        Self {
            current_ms: 0.0,
            playing: false,
            speed: DEFAULT_REPLAY_SPEED,
            max_total_ms: 0,
            last_frame_ms: None,
            ticker: FrameTask::default(),
        }
    }
}

impl ReplayTransport {
    pub fn new(max_total_ms: u64) -> Self {
        Self {
            max_total_ms,
            ..Default::default()
        }
    }

    /// Start playback. Rewinds first if the cursor sits at the end.
    pub fn play(&mut self) {
        if self.current_ms >= self.max_total_ms as f64 {
            self.current_ms = 0.0;
        }
        self.playing = true;
        self.last_frame_ms = None;
        self.ticker.schedule();
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.ticker.cancel();
    }

    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Pause and move the cursor to `ms`, clamped to the race.
    pub fn seek(&mut self, ms: f64) {
        self.pause();
        let ms = if ms.is_nan() { 0.0 } else { ms };
        self.current_ms = ms.clamp(0.0, self.max_total_ms as f64);
    }

    pub fn reset(&mut self) {
        self.pause();
        self.current_ms = 0.0;
    }

    /// Change the speed multiplier. Invalid requests are ignored with a
    /// warning; out-of-range ones are clamped.
    pub fn set_speed(&mut self, speed: f64) -> bool {
        match clamp_replay_speed(speed) {
            Some(speed) => {
                self.speed = speed;
                true
            }
            None => {
                warn!("Ignoring invalid replay speed {}", speed);
                false
            }
        }
    }

    /// The loaded race changed. A cursor past the new end is pulled back.
    pub fn set_max_total_ms(&mut self, max_total_ms: u64) {
        self.max_total_ms = max_total_ms;
        if self.current_ms > max_total_ms as f64 {
            self.current_ms = max_total_ms as f64;
        }
    }

    /// One playback frame at engine time `now_ms`. Advances the cursor by
    /// the frame delta times the speed and pauses exactly at the end.
    pub fn tick(&mut self, now_ms: u64) {
        if !self.playing || !self.ticker.is_active() {
            return;
        }
        let dt = self
            .last_frame_ms
            .map_or(0, |last| now_ms.saturating_sub(last));
        self.last_frame_ms = Some(now_ms);

        let end = self.max_total_ms as f64;
        self.current_ms = (self.current_ms + dt as f64 * self.speed).min(end);
        self.ticker.mark_frame();
        if self.current_ms >= end {
            self.pause();
        }
    }

    /// Deschedule playback (the view owning it went away).
    pub fn teardown(&mut self) {
        self.pause();
    }

    pub fn current_ms(&self) -> f64 {
        self.current_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn max_total_ms(&self) -> u64 {
        self.max_total_ms
    }

    /// Cursor as a fraction of the race, 0 for an empty race.
    pub fn progress(&self) -> f64 {
        if self.max_total_ms == 0 {
            0.0
        } else {
            self.current_ms / self.max_total_ms as f64
        }
    }
}
