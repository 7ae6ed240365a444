mod component;
mod error;
mod hit;
mod layout;
mod render;
mod state;
mod store;
mod types;
mod view;

pub use component::BookGraphCanvas;
pub use error::GraphError;
pub use state::Action;
pub use types::{DomainEdge, DomainGraph, DomainNode, Theme, Transform};
