//! Headless test support: fake surfaces, a recording provider and a
//! harness that pumps surface events into a [`PlaybackSession`] on a
//! virtual clock.
//!
//! [`PlaybackSession`]: crate::session::PlaybackSession

mod fake;
mod harness;

pub use fake::{FakeProvider, FakeSurface, ProbeLog, SurfaceCommand, SurfaceProbe};
pub use harness::{Harness, TIME_UPDATE_STEP};
pub use crate::time::VirtualTimeProvider;
