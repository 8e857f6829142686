//! Redundant `<clipPath>` removal.
//!
//! Builds a dependency graph over `clipPath` ids inside `<defs>` (an edge
//! from the clip-path a node references to the node itself), removes
//! every id transitively reachable from an actually-referenced id, then
//! deletes whatever ids remain — grounded directly on the original
//! `RedundantElementRemover`/`DependencyGraph`.

use std::collections::{HashMap, HashSet};

use crate::node::{Document, NodeId};

#[derive(Default)]
struct DependencyGraph {
    keys: HashSet<String>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    fn insert_node(&mut self, id: String) {
        self.keys.insert(id);
    }

    fn insert_edge(&mut self, from: String, to: String) {
        self.keys.insert(from.clone());
        self.keys.insert(to.clone());
        self.edges.entry(from).or_default().push(to);
    }

    /// Removes `start` and everything transitively reachable from it.
    fn remove_dependency_path(&mut self, start: &str) {
        let mut stack = vec![start.to_string()];
        while let Some(id) = stack.pop() {
            if self.keys.remove(&id) {
                if let Some(next) = self.edges.get(&id) {
                    stack.extend(next.iter().cloned());
                }
            }
        }
    }

    fn remaining_keys(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }
}

fn extract_id_from_url(url: &str) -> Option<&str> {
    url.strip_prefix("url(#")?.strip_suffix(')')
}

pub fn execute(doc: &mut Document, defs: NodeId, context: NodeId) {
    let mut clip_paths = Vec::new();
    doc.get_descendants(defs, Some("clipPath"), None, &mut clip_paths);
    if clip_paths.is_empty() {
        return;
    }

    let mut graph = DependencyGraph::default();
    for &clip in &clip_paths {
        let Some(id) = doc.get_attribute(clip, "id") else { continue };
        let id = id.to_string();
        match doc.get_attribute(clip, "clip-path").and_then(extract_id_from_url) {
            Some(referenced) => graph.insert_edge(referenced.to_string(), id),
            None => graph.insert_node(id),
        }
    }

    let mut referencing = Vec::new();
    doc.get_descendants(context, None, Some("clip-path"), &mut referencing);
    for node in referencing {
        if let Some(idref) = doc.get_attribute(node, "clip-path").and_then(extract_id_from_url) {
            graph.remove_dependency_path(idref);
        }
    }

    for id in graph.remaining_keys() {
        if let Some(&clip) = clip_paths.iter().find(|&&c| doc.get_attribute(c, "id") == Some(id.as_str())) {
            doc.remove_child(clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_unreferenced_clip_paths() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let defs = doc.create_element("defs");
        doc.append_child(root, defs);
        let a = doc.create_element("clipPath");
        doc.set_attribute(a, "id", "A");
        doc.append_child(defs, a);
        let b = doc.create_element("clipPath");
        doc.set_attribute(b, "id", "B");
        doc.set_attribute(b, "clip-path", "url(#A)");
        doc.append_child(defs, b);

        let body = doc.create_element("g");
        doc.append_child(root, body);

        execute(&mut doc, defs, body);

        assert_eq!(doc.child_count(defs), 0);
    }

    #[test]
    fn keeps_referenced_clip_path_and_everything_chained_from_it() {
        // B is itself clipped by A (edge A -> B in the dependency graph).
        // An external reference to A directly keeps both, per the
        // documented "remove idref and everything transitively reachable
        // from it" rule.
        let mut doc = Document::new("svg");
        let root = doc.root();
        let defs = doc.create_element("defs");
        doc.append_child(root, defs);
        let a = doc.create_element("clipPath");
        doc.set_attribute(a, "id", "A");
        doc.append_child(defs, a);
        let b = doc.create_element("clipPath");
        doc.set_attribute(b, "id", "B");
        doc.set_attribute(b, "clip-path", "url(#A)");
        doc.append_child(defs, b);

        let body = doc.create_element("g");
        doc.append_child(root, body);
        let rect = doc.create_element("rect");
        doc.set_attribute(rect, "clip-path", "url(#A)");
        doc.append_child(body, rect);

        execute(&mut doc, defs, body);

        assert_eq!(doc.child_count(defs), 2);
    }
}
