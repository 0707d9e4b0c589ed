//! One panel session: transport, registry, mounted widgets and pending alerts.
//!
//! The session is what a front end drives. Once per frame it calls
//! [`Session::pump`] to apply whatever the server sent, then draws the widget
//! tree with [`Session::ui`], which routes user edits back out through the
//! transport.

use egui::Ui;
use tracing::{debug, info};

use crate::error::Alert;
use crate::protocol::{ServerMessage, ValueUpdate};
use crate::registry::SyncRegistry;
use crate::schema::SchemaTree;
use crate::transport::{Connector, Transport, TransportState};
use crate::widgets::{self, Outbox, Widget};

/// A live panel: the connection, the mounted controls and pending alerts.
///
/// Single-threaded. The front end calls [`Session::pump`] once per frame before
/// drawing.
pub struct Session {
    transport: Transport,
    registry: SyncRegistry,
    widgets: Vec<Widget>,
    alerts: Vec<Alert>,
}

impl Session {
    /// Starts a session against the server behind `page_address`.
    pub fn connect(page_address: &str, connector: Option<&dyn Connector>) -> Self {
        let mut alerts = Vec::new();
        let transport = Transport::connect(page_address, connector, &mut alerts);
        Self {
            transport,
            registry: SyncRegistry::new(),
            widgets: Vec::new(),
            alerts,
        }
    }

    /// Applies every pending server message. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(message) = self.transport.next_message(&mut self.alerts) {
            self.handle(message);
            handled += 1;
        }
        handled
    }

    /// Applies one server message.
    pub fn handle(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Interface(tree) => self.mount(&tree),
            ServerMessage::Update(entries) => self.apply_updates(&entries),
            ServerMessage::Unknown(kind) => debug!(%kind, "message type ignored"),
        }
    }

    fn mount(&mut self, tree: &SchemaTree) {
        // Old controls go first so their registry entries cannot shadow the new ones.
        self.widgets.clear();
        self.widgets = widgets::render_tree(tree, &self.registry);
        info!(
            nodes = tree.len(),
            bound = self.registry.len(),
            "interface mounted"
        );
    }

    fn apply_updates(&mut self, entries: &[ValueUpdate]) {
        for entry in entries {
            let applied = self.registry.dispatch(&entry.id, &entry.value);
            debug!(id = %entry.id, value = %entry.value, applied, "update");
        }
    }

    /// Asks the server to resend every current value.
    pub fn refresh(&mut self) {
        self.transport.refresh();
    }

    /// Connection state.
    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    /// Underlying transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Ids currently bound to a control.
    pub fn registry(&self) -> &SyncRegistry {
        &self.registry
    }

    /// Mounted top-level widgets, in schema order.
    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    /// Widget bound to parameter `id`, searching nested groups.
    pub fn find(&self, id: &str) -> Option<&Widget> {
        widgets::find(&self.widgets, id)
    }

    /// Runs `interact` on the widget for `id` with the transport as outbox.
    ///
    /// Returns `false` when no such widget is mounted.
    pub fn interact(
        &mut self,
        id: &str,
        interact: impl FnOnce(&mut Widget, &mut dyn Outbox),
    ) -> bool {
        match widgets::find_mut(&mut self.widgets, id) {
            Some(widget) => {
                interact(widget, &mut self.transport);
                true
            }
            None => false,
        }
    }

    /// Alerts not yet dismissed, oldest first.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// Removes the oldest alert.
    pub fn dismiss_alert(&mut self) -> Option<Alert> {
        if self.alerts.is_empty() {
            None
        } else {
            Some(self.alerts.remove(0))
        }
    }

    /// Draws the widget tree.
    pub fn ui(&mut self, ui: &mut Ui) {
        widgets::tree_ui(&mut self.widgets, ui, &mut self.transport);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("registry", &self.registry)
            .field("widgets", &self.widgets.len())
            .field("alerts", &self.alerts)
            .finish()
    }
}
