//! Parsing and serialization with `quick-xml`.

use std::fmt::Display;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XmlError;
use crate::tree::{Document, Element, Node, WhitespaceText};

const INDENT: usize = 4;

/// Parses markup text into a [`Document`].
///
/// Whitespace text is kept; comments and processing instructions outside the
/// root element are dropped.
pub fn parse_document(text: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut declaration = None;
    let mut doctype = None;

    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Decl(decl) => declaration = Some(declaration_body(&decl)?),
            Event::DocType(text) => doctype = Some(utf8(&text)?.trim().to_string()),
            Event::Start(start) => stack.push(start_element(&start)?),
            Event::Empty(start) => {
                let element = start_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| XmlError::Parse {
                    reason: "unbalanced end tag".into(),
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    let text = text.unescape().map_err(parse_err)?;
                    parent.children.push(Node::Text(text.into_owned()));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::CData(utf8(&data)?.to_string()));
                }
            }
            Event::Comment(comment) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Comment(utf8(&comment)?.to_string()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Parse {
            reason: format!("unclosed element <{}>", stack[stack.len() - 1].name),
        });
    }
    Ok(Document {
        declaration,
        doctype,
        root: root.ok_or(XmlError::MissingRoot)?,
    })
}

/// Serializes a document with four-space indentation.
///
/// Whitespace-only text is dropped before writing, so writing a parsed
/// document normalizes its layout and output is stable across round trips.
pub fn to_xml_string(document: &Document) -> Result<String, XmlError> {
    let mut out = String::new();
    if let Some(declaration) = &document.declaration {
        out.push_str(&format!("<?xml {declaration}?>\n"));
    }
    if let Some(doctype) = &document.doctype {
        out.push_str(&format!("<!DOCTYPE {doctype}>\n"));
    }

    let root = document.root.stripped(&WhitespaceText);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    write_element(&mut writer, &root)?;
    let body = String::from_utf8(writer.into_inner()).map_err(write_err)?;
    out.push_str(&body);
    out.push('\n');
    Ok(out)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<(), XmlError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_err);
    }

    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_err)?,
            Node::CData(data) => writer
                .write_event(Event::CData(BytesCData::new(data.as_str())))
                .map_err(write_err)?,
            Node::Comment(comment) => writer
                .write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))
                .map_err(write_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(write_err)
}

fn start_element(start: &BytesStart<'_>) -> Result<Element, XmlError> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(parse_err)?;
        let name = utf8(attribute.key.as_ref())?.to_string();
        let value = attribute.unescape_value().map_err(parse_err)?;
        element.attributes.insert(name, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(XmlError::Parse {
                reason: format!("second root element <{}>", element.name),
            })
        }
    }
    Ok(())
}

fn declaration_body(decl: &BytesDecl<'_>) -> Result<String, XmlError> {
    let version = decl.version().map_err(parse_err)?;
    let mut body = format!(r#"version="{}""#, utf8(&version)?);
    if let Some(encoding) = decl.encoding() {
        let encoding = encoding.map_err(parse_err)?;
        body.push_str(&format!(r#" encoding="{}""#, utf8(&encoding)?));
    }
    if let Some(standalone) = decl.standalone() {
        let standalone = standalone.map_err(parse_err)?;
        body.push_str(&format!(r#" standalone="{}""#, utf8(&standalone)?));
    }
    Ok(body)
}

fn utf8(bytes: &[u8]) -> Result<&str, XmlError> {
    std::str::from_utf8(bytes).map_err(parse_err)
}

fn parse_err(e: impl Display) -> XmlError {
    XmlError::Parse {
        reason: e.to_string(),
    }
}

fn write_err(e: impl Display) -> XmlError {
    XmlError::Write {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!DOCTYPE tiles-definitions PUBLIC "-//Apache Software Foundation//DTD Tiles Configuration 2.1//EN" "http://tiles.apache.org/dtds/tiles-config_2_1.dtd">
<tiles-definitions>
  <definition extends="default" name="people/search">
    <put-attribute name="body" value="/WEB-INF/views/people/search.jspx"/>
  </definition>
</tiles-definitions>
"#;

    #[test]
    fn parses_declaration_doctype_and_tree() {
        let doc = parse_document(VIEWS).unwrap();
        assert_eq!(
            doc.declaration.as_deref(),
            Some(r#"version="1.0" encoding="UTF-8" standalone="no""#)
        );
        assert!(doc.doctype.as_deref().unwrap().starts_with("tiles-definitions PUBLIC"));
        assert_eq!(doc.root.name, "tiles-definitions");
        let definition = doc.root.child_elements().next().unwrap();
        assert_eq!(definition.get_attr("name"), Some("people/search"));
    }

    #[test]
    fn serialization_is_a_fixed_point() {
        let doc = parse_document(VIEWS).unwrap();
        let first = to_xml_string(&doc).unwrap();
        let second = to_xml_string(&parse_document(&first).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("<!DOCTYPE tiles-definitions"));
    }

    #[test]
    fn escapes_and_unescapes_attribute_values() {
        let doc = Document::new(
            Element::new("a")
                .attr("href", "/people?search&page=1")
                .text("Tom & Jerry"),
        );
        let text = to_xml_string(&doc).unwrap();
        assert!(text.contains("&amp;page=1"));
        let parsed = parse_document(&text).unwrap();
        assert_eq!(parsed.root.get_attr("href"), Some("/people?search&page=1"));
        assert_eq!(parsed.root.children, vec![Node::Text("Tom & Jerry".into())]);
    }

    #[test]
    fn keeps_comments_inside_root() {
        let doc = parse_document("<div><!-- keep me --><span/></div>").unwrap();
        assert_eq!(doc.root.children[0], Node::Comment(" keep me ".into()));
        let text = to_xml_string(&doc).unwrap();
        assert!(text.contains("<!-- keep me -->"));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(
            parse_document("<div><span></div>"),
            Err(XmlError::Parse { .. })
        ));
        assert!(matches!(parse_document(""), Err(XmlError::MissingRoot)));
        assert!(matches!(
            parse_document("<a/><b/>"),
            Err(XmlError::Parse { .. })
        ));
    }
}
