//! `treelock tree`: show what a tree lock would cover.

use crate::cli::TreeArgs;
use treelock::error::{Result, TreelockError};
use treelock::graph::SceneGraph;
use treelock::locks::resolve_tree;

pub fn cmd_tree(args: TreeArgs) -> Result<()> {
    let graph = SceneGraph::load(&args.graph)?;
    print!("{}", render_tree(&graph, &args.root)?);
    Ok(())
}

/// One id per line, indented two spaces per level below `root`.
fn render_tree(graph: &SceneGraph, root: &str) -> Result<String> {
    let ids = resolve_tree(graph, root);
    if ids.is_empty() {
        return Err(TreelockError::NotFound(root.to_string()));
    }

    let mut out = String::new();
    for id in &ids {
        let mut depth = 0;
        let mut current = id.as_str();
        while current != root {
            match graph.parent_of(current) {
                Some(parent) => {
                    depth += 1;
                    current = parent;
                }
                None => break,
            }
        }
        out.push_str(&"  ".repeat(depth));
        out.push_str(id);
        out.push('\n');
    }
    Ok(out)
}
