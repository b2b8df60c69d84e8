// Minimal XML tree for the inventory system's SOAP payloads
// Namespaces are dropped; elements are matched on local names

use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("XML document has no root element")]
    Empty,

    #[error("XML document ended inside <{0}>")]
    Unclosed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First descendant (or self) with the given name, depth first
    pub fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Text of the named direct child, empty when absent
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map(|child| child.text.as_str()).unwrap_or("")
    }
}

fn local_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Parse a document into its root element
pub fn parse(input: &str) -> Result<XmlNode, XmlError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                stack.push(XmlNode {
                    name: local_name(element.local_name().as_ref()),
                    ..Default::default()
                });
            }
            Event::Empty(element) => {
                let node = XmlNode {
                    name: local_name(element.local_name().as_ref()),
                    ..Default::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None if root.is_none() => root = Some(node),
                    None => {}
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None if root.is_none() => root = Some(node),
                        None => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(XmlError::Unclosed(unclosed.name));
    }

    root.ok_or(XmlError::Empty)
}
