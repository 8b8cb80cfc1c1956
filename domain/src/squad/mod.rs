//! Squads: statically dependent groups of agents.
//!
//! - [`entities::Squad`] — static squad definition
//! - [`registry::SquadRegistry`] — squads by name, ready-set computation
//! - [`result::SquadResult`] — fan-in of a squad's agent results

pub mod entities;
pub mod registry;
pub mod result;

pub use entities::Squad;
pub use registry::{DependencyError, SquadRegistry};
pub use result::{AgentFailure, SquadResult, SquadStatus};
