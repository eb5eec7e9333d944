//! Object graph access for the lock coordinator.
//!
//! The coordinator never inspects object content. It only needs the shape of
//! the graph: whether an id exists and which ids hang directly below it.
//! Storage backends implement [`ObjectGraph`]; [`SceneGraph`] is the
//! in-memory implementation used by the CLI and tests.

mod scene;


use std::sync::{Arc, RwLock};

pub use scene::SceneGraph;

/// Opaque, stable identifier of a node in the object graph.
pub type ObjectId = String;

/// Read-only view of the object graph structure.
pub trait ObjectGraph {
    /// Whether `id` currently names an object.
    fn exists(&self, id: &str) -> bool;

    /// Direct children of `id`, in the graph's order. Unknown ids have none.
    fn children_of(&self, id: &str) -> Vec<ObjectId>;
}

impl<G: ObjectGraph + ?Sized> ObjectGraph for &G {
    fn exists(&self, id: &str) -> bool {
        (**self).exists(id)
    }

    fn children_of(&self, id: &str) -> Vec<ObjectId> {
        (**self).children_of(id)
    }
}

impl<G: ObjectGraph + ?Sized> ObjectGraph for Arc<G> {
    fn exists(&self, id: &str) -> bool {
        (**self).exists(id)
    }

    fn children_of(&self, id: &str) -> Vec<ObjectId> {
        (**self).children_of(id)
    }
}

/// A graph shared with writers: each query takes the read side briefly.
impl<G: ObjectGraph> ObjectGraph for RwLock<G> {
    fn exists(&self, id: &str) -> bool {
        let graph = self.read().unwrap_or_else(|poison| poison.into_inner());
        graph.exists(id)
    }

    fn children_of(&self, id: &str) -> Vec<ObjectId> {
        let graph = self.read().unwrap_or_else(|poison| poison.into_inner());
        graph.children_of(id)
    }
}
