//! Subtree expansion for tree locks.

use crate::graph::{ObjectGraph, ObjectId};
use std::collections::HashSet;

/// The ids a tree lock on `root` must cover: `root` and all its descendants,
/// depth-first, root first, children in graph order.
///
/// Only reads the graph shape. An unknown root yields an empty list. Ids seen
/// twice are skipped, so a graph with a cycle still terminates.
pub fn resolve_tree<G: ObjectGraph + ?Sized>(graph: &G, root: &str) -> Vec<ObjectId> {
    if !graph.exists(root) {
        return Vec::new();
    }

    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root.to_string()];

    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        stack.extend(graph.children_of(&id).into_iter().rev());
        order.push(id);
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SceneGraph;
    use std::collections::BTreeMap;

    #[test]
    fn resolves_root_and_descendants_in_preorder() {
        let mut graph = SceneGraph::new();
        graph.add_object("scene1", None).unwrap();
        graph.add_object("obj1", Some("scene1")).unwrap();
        graph.add_object("obj2", Some("scene1")).unwrap();
        graph.add_object("tool", Some("obj1")).unwrap();

        assert_eq!(
            resolve_tree(&graph, "scene1"),
            vec!["scene1", "obj1", "tool", "obj2"]
        );
        assert_eq!(resolve_tree(&graph, "obj2"), vec!["obj2"]);
    }

    #[test]
    fn unknown_root_resolves_to_nothing() {
        let graph = SceneGraph::new();
        assert!(resolve_tree(&graph, "ghost").is_empty());
    }

    /// Graph whose storage reports a cycle.
    struct Cyclic(BTreeMap<&'static str, Vec<&'static str>>);

    impl ObjectGraph for Cyclic {
        fn exists(&self, id: &str) -> bool {
            self.0.contains_key(id)
        }

        fn children_of(&self, id: &str) -> Vec<ObjectId> {
            self.0
                .get(id)
                .map(|c| c.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default()
        }
    }

    #[test]
    fn cycles_terminate() {
        let graph = Cyclic(BTreeMap::from([("a", vec!["b"]), ("b", vec!["a", "c"]), ("c", vec![])]));
        assert_eq!(resolve_tree(&graph, "a"), vec!["a", "b", "c"]);
    }
}
