//! Structural SVG optimization: three sequential passes over a page
//! tree, each safe to run independently but most effective in this
//! order — extraction first so collapsing sees the freshly-wrapped
//! groups, then unused-`<clipPath>` removal last so it sees the final
//! attribute placement.

mod collapse;
mod extract;
mod unused_defs;

use crate::node::{Document, NodeId};

/// Runs the attribute extractor, then the group collapser, then the
/// redundant-`<clipPath>` remover, over `context` (typically a page's
/// top-level `<g>`). `defs` is the page's `<defs>` element, searched
/// for `<clipPath>` candidates by the last pass.
pub fn optimize(doc: &mut Document, defs: NodeId, context: NodeId) {
    extract::execute(doc, context);
    collapse::execute(doc, context);
    unused_defs::execute(doc, defs, context);
}
