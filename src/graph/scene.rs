//! In-memory scene graph.

use super::{ObjectGraph, ObjectId};
use crate::error::{Result, TreelockError};
use crate::naming::{ensure_unique_name, make_name_unique};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One line of a graph file: an object and, optionally, its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphEntry {
    id: ObjectId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<ObjectId>,
}

/// On-disk YAML layout. Parents must be listed before their children.
#[derive(Debug, Default, Serialize, Deserialize)]
struct GraphFile {
    #[serde(default)]
    objects: Vec<GraphEntry>,
}

/// Tree of object ids kept in memory.
///
/// Every object has at most one parent; objects without a parent are roots
/// (typically scenes or projects). Child order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    children: BTreeMap<ObjectId, Vec<ObjectId>>,
    parents: BTreeMap<ObjectId, ObjectId>,
    roots: Vec<ObjectId>,
}

impl SceneGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a graph from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            TreelockError::UserError(format!(
                "failed to read graph file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a graph from YAML.
    ///
    /// ```yaml
    /// objects:
    ///   - id: scene1
    ///   - id: obj1
    ///     parent: scene1
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let file: GraphFile = serde_yaml::from_str(yaml)
            .map_err(|e| TreelockError::UserError(format!("failed to parse graph YAML: {}", e)))?;

        let mut graph = Self::new();
        for entry in &file.objects {
            graph.add_object(&entry.id, entry.parent.as_deref())?;
        }
        Ok(graph)
    }

    /// Serialize the graph back to YAML, parents first.
    pub fn to_yaml(&self) -> Result<String> {
        let mut objects = Vec::with_capacity(self.len());
        let mut stack: Vec<&ObjectId> = self.roots.iter().rev().collect();
        while let Some(id) = stack.pop() {
            objects.push(GraphEntry {
                id: id.clone(),
                parent: self.parents.get(id).cloned(),
            });
            if let Some(children) = self.children.get(id) {
                stack.extend(children.iter().rev());
            }
        }

        serde_yaml::to_string(&GraphFile { objects })
            .map_err(|e| TreelockError::UserError(format!("failed to serialize graph: {}", e)))
    }

    /// Add an object under `parent`, or as a new root when `parent` is `None`.
    pub fn add_object(&mut self, id: &str, parent: Option<&str>) -> Result<()> {
        ensure_unique_name(id, &self.children)?;

        match parent {
            Some(parent) => {
                let siblings = self
                    .children
                    .get_mut(parent)
                    .ok_or_else(|| TreelockError::NotFound(parent.to_string()))?;
                siblings.push(id.to_string());
                self.parents.insert(id.to_string(), parent.to_string());
            }
            None => self.roots.push(id.to_string()),
        }

        self.children.insert(id.to_string(), Vec::new());
        Ok(())
    }

    /// Add an object named after `name`, suffixed (`name_1`, `name_2`, ...)
    /// if the name is taken. Returns the id actually used.
    pub fn add_object_unique(&mut self, name: &str, parent: Option<&str>) -> Result<ObjectId> {
        let id = make_name_unique(name, &self.children);
        self.add_object(&id, parent)?;
        Ok(id)
    }

    /// Remove an object and its whole subtree. Returns the removed ids.
    pub fn remove_object(&mut self, id: &str) -> Result<Vec<ObjectId>> {
        if !self.children.contains_key(id) {
            return Err(TreelockError::NotFound(id.to_string()));
        }

        match self.parents.remove(id) {
            Some(parent) => {
                if let Some(siblings) = self.children.get_mut(&parent) {
                    siblings.retain(|child| child != id);
                }
            }
            None => self.roots.retain(|root| root != id),
        }

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(children) = self.children.remove(&current) {
                stack.extend(children);
            }
            self.parents.remove(&current);
            removed.push(current);
        }

        Ok(removed)
    }

    /// Parent of `id`, if it has one.
    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).map(String::as_str)
    }

    /// Objects without a parent, in insertion order.
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// All object ids, sorted.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl ObjectGraph for SceneGraph {
    fn exists(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    fn children_of(&self, id: &str) -> Vec<ObjectId> {
        self.children.get(id).cloned().unwrap_or_default()
    }
}
