//! Cancellable per-frame repeating task.
//!
//! The clock engine and the replay transport each own one `FrameTask`. A Bevy
//! system gated on `is_active()` is the repeating callback; `cancel()` is the
//! single point where the repetition stops. Scheduling while already active
//! returns the existing token, so a second loop can never be created.

/// Handle for one scheduled run of a `FrameTask`.
///
/// Tokens are generation-counted: a token from a cancelled run never matches
/// a later run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskToken(u64);

#[derive(Debug, Default, Clone)]
pub struct FrameTask {
    generation: u64,
    active: Option<TaskToken>,
    frames: u64,
}

impl FrameTask {
    /// Schedule the task. Idempotent while active.
    pub fn schedule(&mut self) -> TaskToken {
        if let Some(token) = self.active {
            return token;
        }
        self.generation += 1;
        self.frames = 0;
        let token = TaskToken(self.generation);
        self.active = Some(token);
        token
    }

    /// Deschedule the task. Returns `true` if it was active.
    pub fn cancel(&mut self) -> bool {
        self.active.take().is_some()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn token(&self) -> Option<TaskToken> {
        self.active
    }

    /// Count one executed frame of the current run.
    pub fn mark_frame(&mut self) {
        if self.is_active() {
            self.frames += 1;
        }
    }

    /// Frames executed since the current run was scheduled.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Number of runs ever scheduled.
    pub fn runs(&self) -> u64 {
        self.generation
    }
}
