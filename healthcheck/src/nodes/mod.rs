//! Node model and the stores the engines read from and write back to

pub mod defaults;
pub mod params;
pub mod store;
pub mod types;

pub use params::{InMemoryParamStore, ParamStore};
pub use store::{InMemoryNodeStore, NodeStore};
pub use types::{
    preferred_origin, ConnectionStatus, Node, NodeGroup, NodeId, NodeStatusInfo, Origin,
    RejectedReason, Scheme,
};
