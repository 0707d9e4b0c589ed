//! Schema node renderer.
//!
//! Maps schema nodes to widgets by an exhaustive match on the node kind and the
//! declared value type. Order is preserved; `null` entries and nodes of unknown
//! type produce no widget.

use super::{ActionControl, BooleanControl, FloatControl, GroupContainer, IntegerControl, Widget};
use crate::registry::SyncRegistry;
use crate::schema::{Node, ParameterDescriptor, ValueType};

/// Renders one node; `None` for a `null` entry or an unknown node type.
pub fn render_node(node: Option<&Node>, registry: &SyncRegistry) -> Option<Widget> {
    match node? {
        Node::Parameter(parameter) => Some(render_parameter(parameter, registry)),
        Node::Group(group) => Some(Widget::Group(GroupContainer::new(group, registry))),
        Node::Unknown => None,
    }
}

/// Renders a sequence of nodes in order.
pub fn render_tree(nodes: &[Option<Node>], registry: &SyncRegistry) -> Vec<Widget> {
    nodes
        .iter()
        .filter_map(|node| render_node(node.as_ref(), registry))
        .collect()
}

fn render_parameter(parameter: &ParameterDescriptor, registry: &SyncRegistry) -> Widget {
    match &parameter.value_type {
        ValueType::Integer => Widget::Integer(IntegerControl::new(parameter, registry)),
        // Single and double precision are drawn the same way.
        ValueType::Float | ValueType::Double => {
            Widget::Float(FloatControl::new(parameter, registry))
        }
        ValueType::Boolean => Widget::Boolean(BooleanControl::new(parameter, registry)),
        ValueType::Action => Widget::Action(ActionControl::new(parameter)),
        ValueType::String | ValueType::Other(_) => Widget::Label(parameter.name.clone()),
    }
}

/// Depth-first lookup of the widget standing for parameter `id`.
pub fn find<'a>(widgets: &'a [Widget], id: &str) -> Option<&'a Widget> {
    widgets.iter().find_map(|widget| {
        if widget.id() == Some(id) {
            return Some(widget);
        }
        match widget {
            Widget::Group(group) => find(group.children(), id),
            _ => None,
        }
    })
}

/// Mutable counterpart of [`find`].
pub fn find_mut<'a>(widgets: &'a mut [Widget], id: &str) -> Option<&'a mut Widget> {
    for widget in widgets {
        if widget.id() == Some(id) {
            return Some(widget);
        }
        if let Widget::Group(group) = widget {
            if let Some(found) = find_mut(group.children_mut(), id) {
                return Some(found);
            }
        }
    }
    None
}
