//! Document tree abstraction used by the classifier and the link filter
//!
//! The classifier only needs a handful of navigation primitives: parent and
//! sibling lookup, tag names, attributes and text extraction. `DomNode` and
//! `DomDocument` capture that contract; `HtmlPage` implements it on top of
//! `scraper`'s html5ever-backed tree.

use ego_tree::NodeRef;
use scraper::{Html, Node};

use crate::extractor::text::contains_ignore_case;

/// Navigation contract over one node of a parsed document
pub trait DomNode: Copy {
    /// The enclosing element, if any. Never returns the document root.
    fn parent_element(&self) -> Option<Self>;

    /// The next sibling that is an element, skipping text and comments
    fn next_element_sibling(&self) -> Option<Self>;

    /// Direct element children in document order
    fn child_elements(&self) -> Vec<Self>;

    /// All descendant elements whose tag is one of `names`, in document order
    fn descendants_named(&self, names: &[&str]) -> Vec<Self>;

    /// Lowercase tag name for elements, `None` for text nodes
    fn tag_name(&self) -> Option<&str>;

    /// Attribute value for elements
    fn attr(&self, name: &str) -> Option<&str>;

    /// All descendant text concatenated without separators
    fn text_content(&self) -> String;

    /// All descendant text joined by single spaces
    fn joined_text(&self) -> String;

    fn is_named(&self, names: &[&str]) -> bool {
        self.tag_name().is_some_and(|tag| names.contains(&tag))
    }

    /// Walk strictly upward from this node and return the first element
    /// accepted by `predicate`.
    fn find_ancestor<P>(&self, predicate: P) -> Option<Self>
    where
        P: Fn(&Self) -> bool,
    {
        let mut current = self.parent_element();
        while let Some(node) = current {
            if predicate(&node) {
                return Some(node);
            }
            current = node.parent_element();
        }
        None
    }

    /// Like `find_ancestor`, but considers this node first
    fn closest<P>(&self, predicate: P) -> Option<Self>
    where
        P: Fn(&Self) -> bool,
    {
        if predicate(self) {
            Some(*self)
        } else {
            self.find_ancestor(predicate)
        }
    }
}

/// A parsed document that can be searched and pruned
pub trait DomDocument {
    type Node<'a>: DomNode
    where
        Self: 'a;

    /// Text nodes whose content contains `needle`, case-insensitively,
    /// in document order
    fn text_nodes_containing(&self, needle: &str) -> Vec<Self::Node<'_>>;

    /// Elements with the given tag name in document order
    fn elements_named(&self, name: &str) -> Vec<Self::Node<'_>>;

    /// Detach every element whose tag is listed, together with its subtree
    fn remove_elements(&mut self, names: &[String]);
}

fn node_text<'a>(node: &NodeRef<'a, Node>) -> Option<&'a str> {
    match node.value() {
        Node::Text(text) => Some(&**text),
        _ => None,
    }
}

fn text_pieces<'a>(node: NodeRef<'a, Node>) -> impl Iterator<Item = &'a str> {
    node.descendants().filter_map(|n| node_text(&n))
}

impl<'a> DomNode for NodeRef<'a, Node> {
    fn parent_element(&self) -> Option<Self> {
        NodeRef::parent(self).filter(|parent| parent.value().is_element())
    }

    fn next_element_sibling(&self) -> Option<Self> {
        self.next_siblings().find(|sibling| sibling.value().is_element())
    }

    fn child_elements(&self) -> Vec<Self> {
        self.children()
            .filter(|child| child.value().is_element())
            .collect()
    }

    fn descendants_named(&self, names: &[&str]) -> Vec<Self> {
        self.descendants()
            .skip(1)
            .filter(|node| node.is_named(names))
            .collect()
    }

    fn tag_name(&self) -> Option<&str> {
        self.value().as_element().map(|element| element.name())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.value()
            .as_element()
            .and_then(|element| element.attr(name))
    }

    fn text_content(&self) -> String {
        text_pieces(*self).collect()
    }

    fn joined_text(&self) -> String {
        text_pieces(*self).collect::<Vec<_>>().join(" ")
    }
}

/// An HTML page parsed with `scraper`
pub struct HtmlPage {
    html: Html,
}

impl HtmlPage {
    /// Parse raw markup. html5ever recovers from malformed input, so this
    /// never fails.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }
}

impl DomDocument for HtmlPage {
    type Node<'a> = NodeRef<'a, Node>;

    fn text_nodes_containing(&self, needle: &str) -> Vec<Self::Node<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter(|node| node_text(node).is_some_and(|text| contains_ignore_case(text, needle)))
            .collect()
    }

    fn elements_named(&self, name: &str) -> Vec<Self::Node<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter(|node| node.tag_name() == Some(name))
            .collect()
    }

    fn remove_elements(&mut self, names: &[String]) {
        let doomed: Vec<_> = self
            .html
            .tree
            .root()
            .descendants()
            .filter(|node| {
                node.tag_name()
                    .is_some_and(|tag| names.iter().any(|name| name == tag))
            })
            .map(|node| node.id())
            .collect();

        for id in doomed {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}
