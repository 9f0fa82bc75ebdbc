//! Lookups in MEI score documents.

use roxmltree::Document;

use crate::error::{Result, ScoreError};
use crate::page::tree::XML_NS;

fn parse(mei: &str) -> Result<Document<'_>> {
    // MEI files may carry a DOCTYPE declaration
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Document::parse_with_options(mei, options).map_err(|e| ScoreError::Xml(e.to_string()))
}

/// Source markup of the element whose `xml:id` is `xml_id`, exactly as it
/// appears in the document.
pub fn element_xml(mei: &str, xml_id: &str) -> Result<Option<String>> {
    let doc = parse(mei)?;
    Ok(doc
        .descendants()
        .find(|n| n.is_element() && n.attribute((XML_NS, "id")) == Some(xml_id))
        .map(|n| mei[n.range()].to_string()))
}

/// `xml:id`s of every element named `tag`, in document order.
pub fn element_ids(mei: &str, tag: &str) -> Result<Vec<String>> {
    let doc = parse(mei)?;
    Ok(doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == tag)
        .filter_map(|n| n.attribute((XML_NS, "id")).map(String::from))
        .collect())
}
