//! Fire-and-forget command button.

use egui::Ui;
use serde_json::Value;

use super::Outbox;
use crate::protocol::ClientMessage;
use crate::schema::ParameterDescriptor;

/// Triggers a server-side action. Holds no value and never registers for updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionControl {
    id: String,
    name: String,
}

impl ActionControl {
    /// Button for the action parameter `descriptor`.
    pub fn new(descriptor: &ParameterDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
        }
    }

    /// Parameter id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Button label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends the command: one update with a `null` value.
    pub fn activate(&self, outbox: &mut dyn Outbox) {
        outbox.send(ClientMessage::update(self.id.clone(), Value::Null));
    }

    /// Name label and an `apply` button.
    pub fn ui(&mut self, ui: &mut Ui, outbox: &mut dyn Outbox) {
        ui.horizontal(|ui| {
            ui.label(self.name.as_str());
            if ui.button("apply").clicked() {
                self.activate(outbox);
            }
        });
    }
}
