//! Widgets built from the interface schema.
//!
//! This module turns schema nodes into stateful controls and draws them with
//! `egui`. The model side (state, registry hookup, outbound messages) is kept
//! apart from the drawing code so it can be driven without a window.
//!
//! ## Design
//!
//! - **One generic control:** integer, float and boolean parameters share
//!   [`BoundControl`], parameterized by a [`ValueKind`] that converts raw JSON
//!   values and formats the readout.
//! - **Optimistic edits:** a user edit updates the control's displayed value at
//!   once, then sends one update message through the [`Outbox`]. The server's
//!   echo, if any, arrives later through the registry.
//! - **No echo loops:** values applied through the registry never reach the
//!   outbox.
//! - **Lifetime-bound registration:** a control's registry entry is removed when
//!   the control is dropped, so re-rendering the interface leaves no stale
//!   callbacks behind.

pub mod action;
pub mod bound;
pub mod group;
pub mod render;

use egui::Ui;

use crate::protocol::ClientMessage;

pub use action::ActionControl;
pub use bound::{
    BooleanControl, BooleanKind, BoundControl, FloatControl, FloatKind, IntegerControl,
    IntegerKind, SliderKind, SliderSpec, ValueKind,
};
pub use group::GroupContainer;
pub use render::{find, find_mut, render_node, render_tree};

/// Where widgets send the messages produced by user interaction.
pub trait Outbox {
    /// Queues or transmits one outbound message.
    fn send(&mut self, message: ClientMessage);
}

impl Outbox for Vec<ClientMessage> {
    fn send(&mut self, message: ClientMessage) {
        self.push(message);
    }
}

/// A rendered schema node.
#[derive(Debug)]
pub enum Widget {
    /// Integer slider, or static text when unbounded.
    Integer(IntegerControl),
    /// Float slider with a formatted readout, or static text when unbounded.
    Float(FloatControl),
    /// Checkbox.
    Boolean(BooleanControl),
    /// Button.
    Action(ActionControl),
    /// Labelled section with its own children.
    Group(GroupContainer),
    /// Parameter of a type without a control; shows its name only.
    Label(String),
}

impl Widget {
    /// Parameter id, when the widget stands for a parameter. Groups have none.
    pub fn id(&self) -> Option<&str> {
        match self {
            Widget::Integer(control) => Some(control.id()),
            Widget::Float(control) => Some(control.id()),
            Widget::Boolean(control) => Some(control.id()),
            Widget::Action(control) => Some(control.id()),
            Widget::Group(_) | Widget::Label(_) => None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Widget::Integer(control) => control.name(),
            Widget::Float(control) => control.name(),
            Widget::Boolean(control) => control.name(),
            Widget::Action(control) => control.name(),
            Widget::Group(group) => group.name(),
            Widget::Label(name) => name,
        }
    }

    /// Draws the widget, sending any user edit through `outbox`.
    pub fn ui(&mut self, ui: &mut Ui, outbox: &mut dyn Outbox) {
        match self {
            Widget::Integer(control) => control.slider_ui(ui, outbox),
            Widget::Float(control) => control.slider_ui(ui, outbox),
            Widget::Boolean(control) => control.toggle_ui(ui, outbox),
            Widget::Action(control) => control.ui(ui, outbox),
            Widget::Group(group) => group.ui(ui, outbox),
            Widget::Label(name) => {
                ui.label(name.as_str());
            }
        }
    }
}

/// Draws a whole widget tree.
pub fn tree_ui(widgets: &mut [Widget], ui: &mut Ui, outbox: &mut dyn Outbox) {
    for widget in widgets {
        widget.ui(ui, outbox);
    }
}
