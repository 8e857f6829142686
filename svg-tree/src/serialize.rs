//! Serializes a [`Document`] back to an XML string, grounded on
//! `usvg`'s `writer.rs` (same `xmlwriter` dependency, same recursive
//! element/attribute/text walk).

use xmlwriter::{Options, XmlWriter};

use crate::node::{Document, NodeId, NodeKind};

pub fn serialize(doc: &Document, opts: Options) -> String {
    let mut xml = XmlWriter::new(opts);
    write_node(doc, doc.root(), &mut xml);
    xml.end_document()
}

fn write_node(doc: &Document, id: NodeId, xml: &mut XmlWriter) {
    match doc.kind(id) {
        NodeKind::Element { tag, attrs } => {
            xml.start_element(tag);
            for (name, value) in attrs {
                xml.write_attribute(name, value);
            }
            for child in doc.children(id) {
                write_node(doc, child, xml);
            }
            xml.end_element();
        }
        NodeKind::Text(text) => xml.write_text(text),
        // `xmlwriter` has no raw CDATA/comment escape hatch; output trees
        // built by the driver never contain these (glyph text always
        // comes through as plain text runs), so this is unreachable in
        // practice rather than a real gap.
        NodeKind::CData(text) => xml.write_text(text),
        NodeKind::Comment(_) => {}
    }
}
