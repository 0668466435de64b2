use std::path::Path;

use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;

use crate::error::Result;
use crate::model::{Attributes, NodeId, XmlDocument};

/// Reads and parses an XML file into an [`XmlDocument`].
pub fn read_document(path: &Path) -> Result<XmlDocument> {
    let bytes = std::fs::read(path)?;
    parse_bytes(bytes)
}

/// Parses raw input bytes, which must be UTF-8 encoded.
pub fn parse_bytes(bytes: Vec<u8>) -> Result<XmlDocument> {
    let source = String::from_utf8(bytes)?;
    parse_document(&source)
}

/// Parses XML text into an owned element tree.
///
/// Comments and processing instructions are dropped, CDATA sections are
/// merged into the surrounding text and namespace prefixes are stripped from
/// tag and attribute names.
pub fn parse_document(source: &str) -> Result<XmlDocument> {
    let source = source.trim_start_matches('\u{feff}');
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let parsed = Document::parse_with_options(source, options)?;
    let root = parsed.root_element();

    let mut doc = XmlDocument::new(root.tag_name().name());
    fill_element(&mut doc, XmlDocument::ROOT, root);
    debug!(element_count = doc.len(), "parsed XML document");
    Ok(doc)
}

fn fill_element(doc: &mut XmlDocument, id: NodeId, element: Node<'_, '_>) {
    doc.set_attributes(id, attributes_of(element));

    let mut text = String::new();
    for child in element.children() {
        if child.is_element() {
            let child_id = doc.append_child(id, child.tag_name().name(), Attributes::new());
            fill_element(doc, child_id, child);
        } else if child.is_text() {
            if let Some(fragment) = child.text() {
                text.push_str(fragment);
            }
        }
    }
    doc.set_text(id, text.trim());
}

fn attributes_of(element: Node<'_, '_>) -> Attributes {
    element
        .attributes()
        .map(|attr| (attr.name().to_string(), attr.value().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_elements_attributes_and_text_in_order() {
        let doc = parse_document(
            r#"<root><item id="1" status="active"><name> Test </name></item><item id="2"/></root>"#,
        )
        .unwrap();

        assert_eq!(doc.len(), 4);
        let item = doc.node(1);
        assert_eq!(item.tag, "item");
        let attributes: Vec<(&str, &str)> = item
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        assert_eq!(attributes, vec![("id", "1"), ("status", "active")]);
        assert_eq!(doc.node(2).text, "Test");
        assert_eq!(doc.node(3).attribute("id"), Some("2"));
    }

    #[test]
    fn cdata_is_preserved_verbatim_inside_trimmed_text() {
        let doc = parse_document(
            "<root><d><![CDATA[Line 1\n  <b>Line 2</b> & \"x\"\nLine 3]]></d></root>",
        )
        .unwrap();
        assert_eq!(doc.node(1).text, "Line 1\n  <b>Line 2</b> & \"x\"\nLine 3");
    }

    #[test]
    fn namespace_prefixes_are_dropped() {
        let doc = parse_document(
            r#"<a:root xmlns:a="urn:a"><a:item a:code="X">v</a:item></a:root>"#,
        )
        .unwrap();
        assert_eq!(doc.root().tag, "root");
        assert_eq!(doc.node(1).attribute("code"), Some("X"));
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(parse_document("<root><item></root>").is_err());
        assert!(parse_bytes(vec![0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let doc = parse_document("\u{feff}<root/>").unwrap();
        assert_eq!(doc.root().tag, "root");
    }
}
