//! Integration tests for the timing engines using the `TestRace` harness.
//!
//! These tests spin up a headless Bevy App with `TimingPlugin` and drive it
//! frame by frame through the same events the rendering layer sends.

mod timing_phases;
