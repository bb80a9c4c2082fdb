//! UI tree builder.
//!
//! Render functions produce a [`Node`] tree. Attribute values are either
//! plain text or event handlers; handlers never reach the wire. Lowering
//! (see `lower`) strips them into the session's event registry and assigns
//! element identifiers that the client echoes back in event reports.

mod events;
mod lower;

pub use events::{EventHandler, EventRegistry};
pub(crate) use lower::lower_tree;

use std::fmt;
use std::sync::Arc;

/// One node of the UI tree under construction.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, AttrValue)>,
    pub(crate) children: Vec<Child>,
}

/// An attribute value: text on the wire, or a handler captured at render
/// time.
#[derive(Clone)]
pub enum AttrValue {
    Text(String),
    Handler(Arc<EventHandler>),
}

/// A child: a text run or a nested node.
#[derive(Debug, Clone)]
pub enum Child {
    Text(String),
    Node(Node),
}

impl Node {
    /// Start a node with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set a text attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), AttrValue::Text(value.into())));
        self
    }

    /// Bind an event handler under the given event name (e.g. `onclick`).
    ///
    /// The handler is lifted into the event registry during lowering; the
    /// serialized node advertises the event name in `data-events`.
    pub fn on(mut self, event: impl Into<String>, handler: EventHandler) -> Self {
        self.attrs
            .push((event.into(), AttrValue::Handler(Arc::new(handler))));
        self
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append a sequence of children.
    pub fn children<C: Into<Child>>(mut self, children: impl IntoIterator<Item = C>) -> Self {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}
