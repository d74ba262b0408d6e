//! quick-xml reader that builds an [`XmlDom`].
//!
//! Namespaces are resolved by hand against a stack of in-scope `xmlns`
//! declarations so both DocBook 4 (no namespace) and DocBook 5 documents are
//! accepted without a DTD.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

use super::arena::{Attribute, NodeId, QualName, XmlDom};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// One level of namespace declarations.
type Scope = Vec<(Option<String>, String)>;

/// Parse an XML document into an arena DOM.
///
/// Character references and the predefined XML entities become text; any
/// other general entity is kept as an entity-reference node.
pub fn parse_xml(content: &str) -> Result<XmlDom> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut dom = XmlDom::new();
    let mut stack: Vec<NodeId> = vec![dom.document()];
    let mut scopes: Vec<Scope> = Vec::new();
    let mut seen_root = false;

    loop {
        let parent = stack.last().copied().unwrap_or(dom.document());
        match reader.read_event()? {
            Event::Start(e) => {
                let id = open_element(&mut dom, &e, &mut scopes, &mut seen_root, parent)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                open_element(&mut dom, &e, &mut scopes, &mut seen_root, parent)?;
                scopes.pop();
            }
            Event::End(_) => {
                if stack.len() <= 1 {
                    return Err(Error::MalformedDocument(
                        "end tag without matching start tag".to_string(),
                    ));
                }
                stack.pop();
                scopes.pop();
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(&e);
                if stack.len() > 1 {
                    dom.append_text(parent, &text);
                } else if !text.trim().is_empty() {
                    return Err(Error::MalformedDocument(
                        "text content outside of the root element".to_string(),
                    ));
                }
            }
            Event::CData(e) => {
                if stack.len() > 1 {
                    dom.append_text(parent, &String::from_utf8_lossy(&e));
                }
            }
            Event::GeneralRef(e) => {
                if stack.len() > 1 {
                    let name = String::from_utf8_lossy(&e);
                    match resolve_entity(&name) {
                        Some(resolved) => dom.append_text(parent, &resolved),
                        None => {
                            let entity = dom.create_entity_ref(name.into_owned());
                            dom.append(parent, entity);
                        }
                    }
                }
            }
            Event::Comment(e) => {
                let comment = dom.create_comment(String::from_utf8_lossy(&e).into_owned());
                dom.append(parent, comment);
            }
            Event::PI(e) => {
                let raw = String::from_utf8_lossy(&e);
                let raw = raw.trim();
                let (target, data) = raw
                    .split_once(char::is_whitespace)
                    .map(|(t, d)| (t.to_string(), d.trim().to_string()))
                    .unwrap_or_else(|| (raw.to_string(), String::new()));
                let pi = dom.create_processing_instruction(target, data);
                dom.append(parent, pi);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() > 1 {
        return Err(Error::MalformedDocument(format!(
            "unexpected end of document: {} unclosed element(s)",
            stack.len() - 1
        )));
    }
    if !seen_root {
        return Err(Error::MalformedDocument(
            "document has no root element".to_string(),
        ));
    }

    Ok(dom)
}

fn open_element(
    dom: &mut XmlDom,
    e: &BytesStart<'_>,
    scopes: &mut Vec<Scope>,
    seen_root: &mut bool,
    parent: NodeId,
) -> Result<NodeId> {
    if parent == dom.document() {
        if *seen_root {
            return Err(Error::MalformedDocument(
                "document has more than one root element".to_string(),
            ));
        }
        *seen_root = true;
    }

    let mut raw_attrs: Vec<(String, String)> = Vec::new();
    let mut scope: Scope = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw_value = String::from_utf8_lossy(&attr.value).into_owned();
        let value = match unescape(&raw_value) {
            Ok(value) => value.into_owned(),
            Err(_) => raw_value,
        };
        if key == "xmlns" {
            scope.push((None, value.clone()));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            scope.push((Some(prefix.to_string()), value.clone()));
        }
        raw_attrs.push((key, value));
    }
    scopes.push(scope);

    let qname = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let name = resolve_name(&qname, scopes, true);
    let attrs = raw_attrs
        .into_iter()
        .map(|(key, value)| Attribute {
            name: resolve_name(&key, scopes, false),
            value,
        })
        .collect();

    let id = dom.create_element(name, attrs);
    dom.append(parent, id);
    Ok(id)
}

/// Split `prefix:local` and look up the namespace for the prefix.
///
/// Unprefixed attributes are in no namespace; unprefixed elements take the
/// default namespace.
fn resolve_name(qname: &str, scopes: &[Scope], is_element: bool) -> QualName {
    match qname.split_once(':') {
        Some(("xml", local)) => {
            QualName::new(Some("xml".to_string()), local, Some(XML_NS.to_string()))
        }
        Some((prefix, local)) => {
            let ns = lookup_namespace(scopes, Some(prefix));
            QualName::new(Some(prefix.to_string()), local, ns)
        }
        None if is_element => QualName::new(None, qname, lookup_namespace(scopes, None)),
        None => QualName::new(None, qname, None),
    }
}

fn lookup_namespace(scopes: &[Scope], prefix: Option<&str>) -> Option<String> {
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

/// Resolve predefined XML entities and character references.
fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" => Some("'".to_string()),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code).map(String::from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;

    #[test]
    fn test_parse_docbook5_namespaces() {
        let xml = r#"<?xml version="1.0"?>
<article xmlns="http://docbook.org/ns/docbook" xmlns:xlink="http://www.w3.org/1999/xlink">
  <para><link xlink:href="https://example.org">site</link></para>
</article>"#;
        let dom = parse_xml(xml).unwrap();
        let root = dom.root().unwrap();
        assert_eq!(dom.name(root), Some("article"));
        assert_eq!(dom.namespace(root), Some("http://docbook.org/ns/docbook"));

        let link = dom.child_path(root, &["para", "link"]).unwrap();
        assert_eq!(
            dom.attr_ns(link, "http://www.w3.org/1999/xlink", "href"),
            Some("https://example.org")
        );
        assert_eq!(dom.text_content(link), "site");
    }

    #[test]
    fn test_entities_and_char_refs() {
        let xml = "<para>a &amp; b &#8212; &#x2026; &product;</para>";
        let dom = parse_xml(xml).unwrap();
        let para = dom.root().unwrap();
        let kinds: Vec<_> = dom.children(para).map(|c| dom.kind(c).unwrap()).collect();
        assert_eq!(kinds, vec![NodeKind::Text, NodeKind::EntityRef]);
        assert_eq!(dom.text_content(para), "a & b \u{2014} \u{2026} &product;");
    }

    #[test]
    fn test_comments_pis_and_cdata() {
        let xml = "<para><!-- note --><?asciidoc-br?><![CDATA[x < y]]></para>";
        let dom = parse_xml(xml).unwrap();
        let para = dom.root().unwrap();
        let children: Vec<_> = dom.children(para).collect();
        assert_eq!(dom.comment(children[0]), Some(" note "));
        assert_eq!(
            dom.processing_instruction(children[1]),
            Some(("asciidoc-br", ""))
        );
        assert_eq!(dom.text(children[2]), Some("x < y"));
    }

    #[test]
    fn test_unclosed_element_is_fatal() {
        let result = parse_xml("<article><para>text</para>");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_mismatched_end_tag_is_fatal() {
        assert!(parse_xml("<article><para>text</section></article>").is_err());
    }

    #[test]
    fn test_empty_document_is_fatal() {
        let result = parse_xml("<?xml version=\"1.0\"?>\n");
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_xinclude_namespace() {
        let xml = r#"<book xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="ch1.xml"/></book>"#;
        let dom = parse_xml(xml).unwrap();
        let include = dom.element_children(dom.root().unwrap()).next().unwrap();
        assert_eq!(dom.name(include), Some("include"));
        assert_eq!(dom.namespace(include), Some("http://www.w3.org/2001/XInclude"));
        assert_eq!(dom.attr(include, "href"), Some("ch1.xml"));
    }
}
