//! Owned XML tree for a loaded feed.
//!
//! The tree is converted out of `roxmltree` once, so it can be memoized by the
//! importer without borrowing the source text.

use crate::core::archive::DocumentOrigin;
use crate::utils::error::{ImportError, Result};
use std::io::Read;
use std::slice;

/// Yandex realty feed namespace.
pub const REALTY_NAMESPACE: &str = "http://webmaster.yandex.ru/schemas/feed/realty/2010-06";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    namespace: Option<String>,
    name: String,
    attributes: Vec<XmlAttribute>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| XmlAttribute {
                namespace: attr.namespace().map(str::to_string),
                name: attr.name().to_string(),
                value: attr.value().to_string(),
            })
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(XmlElement::from_node(child)))
                } else if child.is_text() {
                    child.text().map(|text| XmlNode::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            namespace: node.tag_name().namespace().map(str::to_string),
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// True when the element has this local name in this namespace.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.name == name && self.namespace.as_deref() == Some(namespace)
    }

    /// Looks up an attribute without a namespace prefix.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.namespace.is_none() && attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// All descendant elements in document order, not including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    pub fn first_descendant(&self, namespace: &str, name: &str) -> Option<&XmlElement> {
        self.descendants().find(|element| element.is(namespace, name))
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }
}

/// Pre-order walk over descendant elements.
pub struct Descendants<'a> {
    stack: Vec<slice::Iter<'a, XmlNode>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(XmlNode::Element(element)) => {
                    self.stack.push(element.children.iter());
                    return Some(element);
                }
                Some(XmlNode::Text(_)) => continue,
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// 解析完成的 feed 文件及其來源
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    root: XmlElement,
    origin: DocumentOrigin,
}

impl FeedDocument {
    pub fn parse(xml: &str, origin: DocumentOrigin) -> Result<Self> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let document = roxmltree::Document::parse(xml)?;

        Ok(Self {
            root: XmlElement::from_node(document.root_element()),
            origin,
        })
    }

    /// Reads the whole stream and parses it; the reader is dropped on return.
    pub fn from_reader<R: Read>(mut reader: R, origin: DocumentOrigin) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let xml = String::from_utf8(bytes)
            .map_err(|e| ImportError::format(format!("feed is not valid UTF-8: {}", e)))?;

        Self::parse(&xml, origin)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn origin(&self) -> &DocumentOrigin {
        &self.origin
    }

    /// The root element followed by all of its descendants, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }
}
