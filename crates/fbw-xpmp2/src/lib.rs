#![forbid(unsafe_op_in_unsafe_fn)]

//! Bindings for XPMP2, the library that draws multiplayer and AI traffic.
//!
//! [`Multiplayer`] owns the initialized library; [`LegacyAircraft`] is one aircraft whose data
//! the library pulls each frame. Like the XPLM bindings, everything here runs on the
//! simulator's main thread.

pub mod aircraft;
pub mod api;
pub mod multiplayer;
pub mod prefs;

#[cfg(any(test, feature = "test-host"))]
pub mod test_host;

pub use aircraft::{InfoTexts, LegacyAircraft, LightStatus, Orientation, PlaneId, PlaneSurfaces, TransponderMode};
pub use multiplayer::{EnableOutcome, ModelInfo, Multiplayer, PendingEnable, SoundCone};
pub use prefs::IntPrefs;
