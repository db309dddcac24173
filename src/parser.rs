//! Read-only element tree for ISO 19139 documents.
//!
//! The tree is built once from `quick_xml` events and then queried with
//! [`ElementPath`]s, which are namespace-resolved before use so a lookup never
//! has to deal with prefixes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

use crate::config::Namespaces;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
struct Node {
    namespace: Option<String>,
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Parsed metadata document. Node 0 is the root element.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn root(&self) -> Element<'_> {
        Element { doc: self, id: 0 }
    }
}

pub fn parse_file(path: &Path) -> Result<Document> {
    let file = File::open(path)?;
    parse_document(BufReader::new(file))
}

pub fn parse_document<R: BufRead>(reader: R) -> Result<Document> {
    let mut reader = NsReader::from_reader(reader);
    reader.config_mut().trim_text(true);

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_resolved_event_into(&mut buf)? {
            (ns, Event::Start(e)) => {
                let id = push_element(&mut nodes, &stack, ns, &e)?;
                stack.push(id);
            }
            (ns, Event::Empty(e)) => {
                push_element(&mut nodes, &stack, ns, &e)?;
            }
            (_, Event::End(_)) => {
                stack.pop();
            }
            (_, Event::Text(e)) => {
                if let Some(&id) = stack.last() {
                    let text = e.unescape()?;
                    append_text(&mut nodes[id], &text);
                }
            }
            (_, Event::CData(e)) => {
                if let Some(&id) = stack.last() {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append_text(&mut nodes[id], &text);
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(&open) = stack.last() {
        return Err(Error::UnexpectedEof(nodes[open].name.clone()));
    }
    if nodes.is_empty() {
        return Err(Error::EmptyDocument);
    }

    debug!("Parsed XML tree with {} elements", nodes.len());
    Ok(Document { nodes })
}

fn push_element(
    nodes: &mut Vec<Node>,
    stack: &[usize],
    ns: ResolveResult,
    e: &BytesStart,
) -> Result<usize> {
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(Error::UnknownPrefix(
                String::from_utf8_lossy(&prefix).into_owned(),
            ))
        }
    };
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        // xmlns宣言は属性として保持しない
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }

    let parent = stack.last().copied();
    // 2つ目以降のルート要素は受け付けない
    if parent.is_none() && !nodes.is_empty() {
        return Err(Error::MultipleRoots(name));
    }

    let id = nodes.len();
    nodes.push(Node {
        namespace,
        name,
        attributes,
        text: None,
        parent,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        nodes[parent].children.push(id);
    }
    Ok(id)
}

fn append_text(node: &mut Node, text: &str) {
    // 最初の子要素より前のテキストのみ保持する
    if node.children.is_empty() {
        node.text.get_or_insert_with(String::new).push_str(text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct QName {
    namespace: Option<String>,
    local: String,
}

/// A child-axis path such as `gmd:citation/gmd:CI_Citation/gmd:title`,
/// evaluated relative to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPath {
    steps: Vec<QName>,
}

impl ElementPath {
    pub fn parse(namespaces: &Namespaces, steps: &[&str]) -> Result<Self> {
        let steps = steps
            .iter()
            .map(|step| match step.split_once(':') {
                Some((prefix, local)) => {
                    let uri = namespaces
                        .resolve(prefix)
                        .ok_or_else(|| Error::UnknownPrefix(prefix.to_string()))?;
                    Ok(QName {
                        namespace: Some(uri.to_string()),
                        local: local.to_string(),
                    })
                }
                None => Ok(QName {
                    namespace: None,
                    local: step.to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }
}

#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a Document,
    id: usize,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.id]
    }

    fn matches(&self, qname: &QName) -> bool {
        let node = self.node();
        node.name == qname.local && node.namespace.as_deref() == qname.namespace.as_deref()
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn namespace(&self) -> Option<&'a str> {
        self.node().namespace.as_deref()
    }

    /// Text before the first child element, `None` when there is none.
    pub fn text(&self) -> Option<&'a str> {
        self.node().text.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        let doc = self.doc;
        self.node().parent.map(|id| Element { doc, id })
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |&id| Element { doc, id })
    }

    /// First element reached by `path`.
    pub fn find(&self, path: &ElementPath) -> Option<Element<'a>> {
        self.find_all(path).into_iter().next()
    }

    /// Every element reached by `path`, in document order.
    pub fn find_all(&self, path: &ElementPath) -> Vec<Element<'a>> {
        let mut current = vec![*self];
        for step in &path.steps {
            current = current
                .iter()
                .flat_map(|el| el.children().filter(move |child| child.matches(step)))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("namespace", &self.namespace())
            .field("name", &self.name())
            .field("text", &self.text())
            .finish()
    }
}
