//! Room geometry: walls, planes, edges, and the queries the image-edge
//! model needs to enumerate propagation paths.
//!
//! - [`Room`] - owns walls/planes/edges and their derived caches
//! - [`Wall`], [`Plane`] - the scene's convex polygons and their plane groups
//! - [`Edge`], [`ReceiverZone`] - shared segments between differently-
//!   oriented walls, and the listener's zone relative to each
//! - [`RoomError`] - validation failures on wall edits

pub mod edge;
pub mod error;
pub mod room;
pub mod wall;

pub use edge::{Edge, EdgeId, ReceiverZone};
pub use error::RoomError;
pub use room::Room;
pub use wall::{Plane, PlaneId, Wall, WallId};
