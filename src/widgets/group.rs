//! Labelled section holding nested widgets.

use egui::Ui;

use super::{render::render_tree, tree_ui, Outbox, Widget};
use crate::registry::SyncRegistry;
use crate::schema::GroupDescriptor;

/// Stateless container; its children are the group's content, in order.
#[derive(Debug)]
pub struct GroupContainer {
    id: String,
    name: String,
    children: Vec<Widget>,
}

impl GroupContainer {
    /// Renders the group's content, registering each bound child.
    pub fn new(descriptor: &GroupDescriptor, registry: &SyncRegistry) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            children: render_tree(&descriptor.content, registry),
        }
    }

    /// Id as sent, possibly empty. Not used for lookup.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Section label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Child widgets in schema order.
    pub fn children(&self) -> &[Widget] {
        &self.children
    }

    /// Mutable child widgets.
    pub fn children_mut(&mut self) -> &mut [Widget] {
        &mut self.children
    }

    /// Framed section: bold name, separator, then the children.
    pub fn ui(&mut self, ui: &mut Ui, outbox: &mut dyn Outbox) {
        ui.group(|ui| {
            ui.strong(self.name.as_str());
            ui.separator();
            tree_ui(&mut self.children, ui, outbox);
        });
    }
}
