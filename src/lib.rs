//! Windowed force-directed graph layout.
//!
//! A [`session::Session`] keeps a center node and its dataset neighbors
//! materialized as simulated bodies, rewires the live graph on every recenter
//! and relaxes the layout one tick at a time until it settles.

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod session;
pub mod window;

pub use config::{ChurnConfig, EngineConfig, OrbitConfig};
pub use engine::{Body, EdgeLine, EngineEvent, LayoutEngine, Lifecycle, LineId, TickReport};
pub use error::{Error, Quantity, Result};
pub use graph::{GraphBuilder, NodeId, NodeKind};
pub use session::{Session, SessionSnapshot, SharedSession};
pub use window::{NeighborWindow, WindowDiff};
