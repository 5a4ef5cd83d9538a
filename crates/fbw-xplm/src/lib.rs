#![forbid(unsafe_op_in_unsafe_fn)]

//! Safe bindings to the X-Plane plugin SDK (XPLM and XPWidgets).
//!
//! The host's C functions are resolved once into [`api::HostApi`] tables; the modules wrap
//! them with owned handles, arena-backed callbacks and UTF-8 strings. All of it is meant to be
//! used from the simulator's main thread, which is the only thread the host calls plugins on.

pub mod api;
pub mod callback;
pub mod camera;
pub mod command;
pub mod config;
pub mod data_access;
pub mod defs;
pub mod entry;
pub mod error;
pub mod graphics;
pub mod handle;
pub mod instance;
pub mod menus;
pub mod planes;
pub mod plugin;
pub mod processing;
pub mod scenery;
pub mod strings;
pub mod text;
pub mod ui_graphics;
pub mod utilities;
pub mod widgets;

#[cfg(any(test, feature = "test-host"))]
pub mod test_host;

pub use config::PluginConfig;
pub use entry::XPlugin;
pub use error::{XplmError, XplmResult};
