//! Tree lowering - builder tree to wire tree.
//!
//! Walks the rendered [`Node`] tree, moves handler attributes into the
//! session's [`EventRegistry`], and produces the serializable [`WireNode`]
//! form. Elements that carry handlers receive an `id` (the explicit `id`
//! attribute when present, a generated `e{n}` otherwise) and advertise
//! their handled events in a `data-events` attribute so the thin client
//! knows which listeners to attach.

use serde_json::Value;

use super::{AttrValue, Child, EventRegistry, Node};
use crate::wire::{WireChild, WireNode};

/// Per-render element id generator (`e0`, `e1`, ...).
#[derive(Default)]
struct IdGen {
    next: u64,
}

impl IdGen {
    fn next_id(&mut self) -> String {
        let id = format!("e{}", self.next);
        self.next += 1;
        id
    }
}

/// Lower a rendered tree, rebuilding the registry from its handlers.
pub(crate) fn lower_tree(root: Node, registry: &EventRegistry) -> WireNode {
    registry.begin_render();
    let mut ids = IdGen::default();
    lower_node(root, registry, &mut ids)
}

fn lower_node(node: Node, registry: &EventRegistry, ids: &mut IdGen) -> WireNode {
    let Node {
        tag,
        attrs,
        children,
    } = node;

    let mut wire_attrs = serde_json::Map::new();
    let mut handlers = Vec::new();
    let mut explicit_id = None;

    for (name, value) in attrs {
        match value {
            AttrValue::Text(text) => {
                if name == "id" {
                    explicit_id = Some(text.clone());
                }
                wire_attrs.insert(name, Value::String(text));
            }
            AttrValue::Handler(handler) => handlers.push((name, handler)),
        }
    }

    if !handlers.is_empty() {
        let id = explicit_id.unwrap_or_else(|| ids.next_id());
        let events: Vec<&str> = handlers.iter().map(|(name, _)| name.as_str()).collect();
        wire_attrs.insert("id".to_string(), Value::String(id.clone()));
        wire_attrs.insert("data-events".to_string(), Value::String(events.join(" ")));

        for (event, handler) in handlers {
            registry.bind(&id, &event, handler);
        }
    }

    let wire_children = children
        .into_iter()
        .map(|child| match child {
            Child::Text(text) => WireChild::Text(text),
            Child::Node(node) => WireChild::Node(lower_node(node, registry, ids)),
        })
        .collect();

    WireNode {
        tag,
        attrs: wire_attrs,
        children: wire_children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::EventHandler;
    use serde_json::json;

    #[test]
    fn test_plain_node_lowers_without_ids() {
        let registry = EventRegistry::new();
        let wire = lower_tree(Node::new("div").child("hi"), &registry);

        assert_eq!(
            serde_json::to_value(&wire).unwrap(),
            json!({"tag": "div", "attrs": {}, "children": ["hi"]})
        );
        assert_eq!(registry.bound_elements(), 0);
    }

    #[test]
    fn test_handler_node_gets_id_and_advertisement() {
        let registry = EventRegistry::new();
        let tree = Node::new("button")
            .on("onclick", EventHandler::sync(|| Ok(())))
            .child("Click Me");

        let wire = lower_tree(tree, &registry);
        assert_eq!(wire.attrs.get("id"), Some(&json!("e0")));
        assert_eq!(wire.attrs.get("data-events"), Some(&json!("onclick")));
        assert!(registry.lookup("e0", "onclick").is_some());
    }

    #[test]
    fn test_explicit_id_is_preserved() {
        let registry = EventRegistry::new();
        let tree = Node::new("button")
            .attr("id", "save")
            .on("onclick", EventHandler::sync(|| Ok(())));

        let wire = lower_tree(tree, &registry);
        assert_eq!(wire.attrs.get("id"), Some(&json!("save")));
        assert!(registry.lookup("save", "onclick").is_some());
    }

    #[test]
    fn test_nested_handlers_get_distinct_ids() {
        let registry = EventRegistry::new();
        let tree = Node::new("div")
            .child(Node::new("button").on("onclick", EventHandler::sync(|| Ok(()))))
            .child(Node::new("input").on("onchange", EventHandler::sync(|| Ok(()))));

        lower_tree(tree, &registry);
        assert!(registry.lookup("e0", "onclick").is_some());
        assert!(registry.lookup("e1", "onchange").is_some());
    }

    #[test]
    fn test_multiple_events_on_one_element() {
        let registry = EventRegistry::new();
        let tree = Node::new("input")
            .on("onchange", EventHandler::sync(|| Ok(())))
            .on("onblur", EventHandler::sync(|| Ok(())));

        let wire = lower_tree(tree, &registry);
        assert_eq!(wire.attrs.get("data-events"), Some(&json!("onchange onblur")));
        assert!(registry.lookup("e0", "onchange").is_some());
        assert!(registry.lookup("e0", "onblur").is_some());
    }

    #[test]
    fn test_relowering_shadows_previous_render() {
        let registry = EventRegistry::new();
        lower_tree(
            Node::new("button").on("onclick", EventHandler::sync(|| Ok(()))),
            &registry,
        );
        assert!(registry.lookup("e0", "onclick").is_some());

        // Second render binds a different event; the old binding is gone.
        lower_tree(
            Node::new("input").on("onchange", EventHandler::sync(|| Ok(()))),
            &registry,
        );
        assert!(registry.lookup("e0", "onclick").is_none());
        assert!(registry.lookup("e0", "onchange").is_some());
    }
}
