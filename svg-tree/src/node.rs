//! An ordered, mutable SVG element tree.
//!
//! Nodes live in a flat arena (`Vec<NodeData>`); every node holds a
//! back-index to its parent instead of an owning pointer, which sidesteps
//! both raw cross-pointers and `Rc`/`RefCell` reference-cycle hazards
//! while still supporting `wrap`/`unwrap`-style restructuring (see
//! DESIGN.md for why this was chosen over a `rctree`-style owning tree).

/// An opaque handle into a [`Document`]'s arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

/// The discriminated content of a node.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Element {
        tag: String,
        /// Unique by name, insertion order preserved, last write wins.
        attrs: Vec<(String, String)>,
    },
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Detached nodes are kept in the arena (never deallocated
    /// mid-document) but are unreachable from the root.
    detached: bool,
}

/// An SVG document: a single-rooted arena of [`NodeKind`] nodes.
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Creates a new document whose root is an element with the given tag
    /// (typically `"svg"`).
    pub fn new(root_tag: &str) -> Self {
        let root = NodeData {
            kind: NodeKind::Element { tag: root_tag.to_string(), attrs: Vec::new() },
            parent: None,
            children: Vec::new(),
            detached: false,
        };
        Document { nodes: vec![root], root: NodeId(0) }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind: NodeKind::Element { tag: tag.to_string(), attrs: Vec::new() },
            parent: None,
            children: Vec::new(),
            detached: true,
        });
        id
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_detached(NodeKind::Text(text.into()))
    }

    pub fn create_cdata(&mut self, text: impl Into<String>) -> NodeId {
        self.push_detached(NodeKind::CData(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push_detached(NodeKind::Comment(text.into()))
    }

    fn push_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: None, children: Vec::new(), detached: true });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id).kind, NodeKind::Element { .. })
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.data(id).children.iter().copied()
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.data(id).children.len()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).children.first().copied()
    }

    // -- attributes ---------------------------------------------------

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match &self.data(id).kind {
            NodeKind::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id).iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let NodeKind::Element { attrs, .. } = &mut self.data_mut(id).kind {
            let value = value.into();
            if let Some(entry) = attrs.iter_mut().find(|(n, _)| n == name) {
                entry.1 = value;
            } else {
                attrs.push((name.to_string(), value));
            }
        }
    }

    pub fn clear_attribute(&mut self, id: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.data_mut(id).kind {
            attrs.retain(|(n, _)| n != name);
        }
    }

    // -- structural edits ----------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(child).detached = false;
        self.data_mut(parent).children.push(child);
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(child).detached = false;
        self.data_mut(parent).children.insert(0, child);
    }

    pub fn insert_child_before(&mut self, parent: NodeId, before: NodeId, child: NodeId) {
        self.detach(child);
        self.data_mut(child).parent = Some(parent);
        self.data_mut(child).detached = false;
        let idx = self.data(parent).children.iter().position(|&c| c == before).unwrap_or(0);
        self.data_mut(parent).children.insert(idx, child);
    }

    /// Detaches `child` from its current parent, if any. The node itself
    /// remains valid (and reattachable) in the arena.
    pub fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.data(child).parent {
            self.data_mut(parent).children.retain(|&c| c != child);
        }
        self.data_mut(child).parent = None;
        self.data_mut(child).detached = true;
    }

    pub fn remove_child(&mut self, child: NodeId) {
        self.detach(child);
    }

    /// Wraps the sibling range `[first, last)` of `parent`'s children
    /// (by index) under a newly-created element with tag `tag`, placed
    /// where the range used to start. Returns the new wrapper's id.
    pub fn wrap(&mut self, parent: NodeId, first: usize, last: usize, tag: &str) -> NodeId {
        assert!(first < last);
        let group = self.create_element(tag);
        let moved: Vec<NodeId> = self.data(parent).children[first..last].to_vec();
        {
            let siblings = &mut self.data_mut(parent).children;
            siblings.splice(first..last, std::iter::once(group));
        }
        self.data_mut(group).parent = Some(parent);
        self.data_mut(group).detached = false;
        for child in moved {
            self.data_mut(child).parent = Some(group);
            self.data_mut(group).children.push(child);
        }
        group
    }

    /// Splices `child`'s children into its own position in its parent
    /// and removes `child` itself. Panics if `child` is the root.
    pub fn unwrap(&mut self, child: NodeId) {
        let parent = self.data(child).parent.expect("cannot unwrap the root node");
        let idx = self.data(parent).children.iter().position(|&c| c == child).unwrap();
        let grandchildren = std::mem::take(&mut self.data_mut(child).children);
        for &gc in &grandchildren {
            self.data_mut(gc).parent = Some(parent);
        }
        self.data_mut(parent).children.splice(idx..idx + 1, grandchildren);
        self.data_mut(child).parent = None;
        self.data_mut(child).detached = true;
    }

    /// Pre-order collection of descendants of `root` (exclusive),
    /// optionally filtered by tag name and/or presence of an attribute.
    pub fn get_descendants(&self, root: NodeId, tag_filter: Option<&str>, attr_filter: Option<&str>, out: &mut Vec<NodeId>) {
        for child in self.data(root).children.clone() {
            let matches_tag = tag_filter.map_or(true, |t| self.tag_name(child) == Some(t));
            let matches_attr = attr_filter.map_or(true, |a| self.has_attribute(child, a));
            if matches_tag && matches_attr {
                out.push(child);
            }
            self.get_descendants(child, tag_filter, attr_filter, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_attribute_is_last_write_wins_and_keeps_position() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        doc.set_attribute(root, "fill", "red");
        doc.set_attribute(root, "stroke", "blue");
        doc.set_attribute(root, "fill", "green");
        assert_eq!(doc.get_attribute(root, "fill"), Some("green"));
        let names: Vec<_> = doc.attributes(root).iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["fill", "stroke"]);
    }

    #[test]
    fn wrap_groups_a_sibling_range() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let a = doc.create_element("path");
        let b = doc.create_element("path");
        let c = doc.create_element("path");
        doc.append_child(root, a);
        doc.append_child(root, b);
        doc.append_child(root, c);
        let g = doc.wrap(root, 0, 2, "g");
        let root_children: Vec<_> = doc.children(root).collect();
        assert_eq!(root_children, vec![g, c]);
        let g_children: Vec<_> = doc.children(g).collect();
        assert_eq!(g_children, vec![a, b]);
        assert_eq!(doc.parent(a), Some(g));
    }

    #[test]
    fn unwrap_splices_children_into_parent_position() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let g = doc.create_element("g");
        let a = doc.create_element("path");
        let b = doc.create_element("path");
        doc.append_child(root, g);
        doc.append_child(g, a);
        doc.append_child(g, b);
        doc.unwrap(g);
        let root_children: Vec<_> = doc.children(root).collect();
        assert_eq!(root_children, vec![a, b]);
        assert_eq!(doc.parent(a), Some(root));
    }

    #[test]
    fn get_descendants_filters_by_tag_and_attribute() {
        let mut doc = Document::new("svg");
        let root = doc.root();
        let defs = doc.create_element("defs");
        doc.append_child(root, defs);
        let clip = doc.create_element("clipPath");
        doc.set_attribute(clip, "id", "a");
        doc.append_child(defs, clip);
        let mut out = Vec::new();
        doc.get_descendants(root, Some("clipPath"), None, &mut out);
        assert_eq!(out, vec![clip]);
        out.clear();
        doc.get_descendants(root, None, Some("id"), &mut out);
        assert_eq!(out, vec![clip]);
    }
}
