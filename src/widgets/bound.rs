//! Generic bound parameter control.
//!
//! A [`BoundControl`] owns the displayed value of one parameter and keeps it in
//! sync from both ends: user edits go out through the [`Outbox`], server updates
//! come in through the [`SyncRegistry`]. What differs between integer, float and
//! boolean parameters is captured by a [`ValueKind`]: how raw JSON converts into
//! the displayed value, and how that value is shown.

use std::cell::RefCell;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::rc::Rc;

use egui::{Slider, Ui};
use serde_json::Value;
use tracing::{debug, warn};

use super::Outbox;
use crate::format::format_value;
use crate::protocol::ClientMessage;
use crate::registry::{Registration, SyncRegistry};
use crate::schema::{Bounds, ParameterDescriptor};

/// Value conversion strategy of a bound control.
pub trait ValueKind: 'static {
    /// Displayed value type.
    type Value: Clone + PartialEq + Debug + 'static;

    /// Converts a raw JSON value, `None` when it has no meaning for this kind.
    fn convert(raw: &Value) -> Option<Self::Value>;

    /// Value put on the wire for an edit.
    fn to_json(value: &Self::Value) -> Value;

    /// Displayed value when the initial value does not convert.
    fn fallback() -> Self::Value;

    /// Plain text of a value.
    fn display(value: &Self::Value) -> String;
}

/// Kinds drawn as a slider when the parameter is bounded.
pub trait SliderKind: ValueKind {
    /// Slider range for `bounds`.
    fn slider_range(bounds: Bounds) -> RangeInclusive<Self::Value>;

    /// Slider increment.
    fn step(bounds: Bounds) -> f64;

    /// Readout next to the slider.
    fn readout(value: &Self::Value, _bounds: Bounds) -> String {
        Self::display(value)
    }
}

/// Whole numbers, converted like `parseInt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerKind;

/// Floating point numbers, converted like `parseFloat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatKind;

/// Booleans, converted by truthiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BooleanKind;

impl ValueKind for IntegerKind {
    type Value = i64;

    fn convert(raw: &Value) -> Option<i64> {
        match raw {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Value::String(s) => parse_int_prefix(s),
            _ => None,
        }
    }

    fn to_json(value: &i64) -> Value {
        Value::from(*value)
    }

    fn fallback() -> i64 {
        0
    }

    fn display(value: &i64) -> String {
        value.to_string()
    }
}

impl SliderKind for IntegerKind {
    fn slider_range(bounds: Bounds) -> RangeInclusive<i64> {
        (bounds.min as i64)..=(bounds.max as i64)
    }

    fn step(_bounds: Bounds) -> f64 {
        1.0
    }
}

impl ValueKind for FloatKind {
    type Value = f64;

    fn convert(raw: &Value) -> Option<f64> {
        match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_float_prefix(s),
            _ => None,
        }
    }

    fn to_json(value: &f64) -> Value {
        Value::from(*value)
    }

    fn fallback() -> f64 {
        0.0
    }

    fn display(value: &f64) -> String {
        value.to_string()
    }
}

impl SliderKind for FloatKind {
    fn slider_range(bounds: Bounds) -> RangeInclusive<f64> {
        bounds.min..=bounds.max
    }

    fn step(bounds: Bounds) -> f64 {
        bounds.span() / 1000.0
    }

    fn readout(value: &f64, bounds: Bounds) -> String {
        format_value(*value, bounds.min, bounds.max)
    }
}

impl ValueKind for BooleanKind {
    type Value = bool;

    fn convert(raw: &Value) -> Option<bool> {
        Some(truthy(raw))
    }

    fn to_json(value: &bool) -> Value {
        Value::Bool(*value)
    }

    fn fallback() -> bool {
        false
    }

    fn display(value: &bool) -> String {
        value.to_string()
    }
}

// Leading optional sign and decimal digits; trailing junk is ignored.
fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['+', '-']));
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    text[..digits_start + digits_len].parse().ok()
}

// Longest leading decimal literal, or a signed `Infinity`; trailing junk is ignored.
fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let sign_len = usize::from(text.starts_with(['+', '-']));
    if text[sign_len..].starts_with("Infinity") {
        let infinity = if text.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        return Some(infinity);
    }

    let count_digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };
    let mut end = sign_len;
    let int_digits = count_digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let exp_sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = count_digits(end + 1 + exp_sign);
        if exp_digits > 0 {
            end += 1 + exp_sign + exp_digits;
        }
    }
    text[..end].parse().ok()
}

fn truthy(raw: &Value) -> bool {
    match raw {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn user_touched(response: &egui::Response) -> bool {
    response.dragged() || response.drag_stopped() || response.clicked() || response.has_focus()
}

/// Slider parameters of a bounded control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderSpec {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
    /// Increment between positions.
    pub step: f64,
}

/// Control owning the displayed value of one parameter.
#[derive(Debug)]
pub struct BoundControl<K: ValueKind> {
    id: String,
    name: String,
    bounds: Option<Bounds>,
    value: Rc<RefCell<K::Value>>,
    _registration: Registration,
    _kind: PhantomData<K>,
}

/// Integer parameter (`i`).
pub type IntegerControl = BoundControl<IntegerKind>;
/// Float parameter (`f` or `d`).
pub type FloatControl = BoundControl<FloatKind>;
/// Boolean parameter (`b`).
pub type BooleanControl = BoundControl<BooleanKind>;

impl<K: ValueKind> BoundControl<K> {
    /// Builds the control and registers it under the parameter id.
    pub fn new(descriptor: &ParameterDescriptor, registry: &SyncRegistry) -> Self {
        let initial = K::convert(&descriptor.value).unwrap_or_else(|| {
            warn!(
                id = %descriptor.id,
                value = %descriptor.value,
                value_type = %descriptor.value_type,
                "initial value does not convert, using default"
            );
            K::fallback()
        });
        let value = Rc::new(RefCell::new(initial));

        let cell = Rc::downgrade(&value);
        let id = descriptor.id.clone();
        let registration = registry.register(descriptor.id.clone(), move |raw: &Value| {
            let Some(cell) = cell.upgrade() else {
                return;
            };
            match K::convert(raw) {
                Some(converted) => *cell.borrow_mut() = converted,
                None => debug!(id = %id, value = %raw, "inbound value does not convert, ignored"),
            }
        });

        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            bounds: descriptor.bounds(),
            value,
            _registration: registration,
            _kind: PhantomData,
        }
    }

    /// Parameter id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slider bounds, when both ends were sent.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Currently displayed value.
    pub fn value(&self) -> K::Value {
        self.value.borrow().clone()
    }

    /// Applies a user edit: shows it immediately, then reports it to the server.
    pub fn set_from_user(&mut self, new_value: K::Value, outbox: &mut dyn Outbox) {
        *self.value.borrow_mut() = new_value.clone();
        outbox.send(ClientMessage::update(self.id.clone(), K::to_json(&new_value)));
    }
}

impl<K: SliderKind> BoundControl<K> {
    /// Slider settings, `None` for an unbounded parameter.
    pub fn slider(&self) -> Option<SliderSpec> {
        self.bounds.map(|bounds| SliderSpec {
            min: bounds.min,
            max: bounds.max,
            step: K::step(bounds),
        })
    }

    /// Text shown for the current value.
    pub fn readout(&self) -> String {
        let value = self.value.borrow();
        match self.bounds {
            Some(bounds) => K::readout(&value, bounds),
            None => K::display(&value),
        }
    }
}

impl<K> BoundControl<K>
where
    K: SliderKind,
    K::Value: egui::emath::Numeric,
{
    /// Label, readout and slider; static text when unbounded.
    pub fn slider_ui(&mut self, ui: &mut Ui, outbox: &mut dyn Outbox) {
        ui.horizontal(|ui| {
            ui.label(self.name.as_str());
            ui.label(self.readout());

            let Some(bounds) = self.bounds else {
                return;
            };
            // The slider may snap the value to its step while drawing; only
            // direct input on it counts as a user change.
            let mut value = self.value();
            let response = ui.add(
                Slider::new(&mut value, K::slider_range(bounds))
                    .step_by(K::step(bounds))
                    .show_value(false),
            );
            if response.changed() && user_touched(&response) {
                self.set_from_user(value, outbox);
            }
        });
    }
}

impl BoundControl<BooleanKind> {
    /// Two-state toggle labelled by the parameter name.
    pub fn toggle_ui(&mut self, ui: &mut Ui, outbox: &mut dyn Outbox) {
        let mut value = self.value();
        if ui.checkbox(&mut value, self.name.as_str()).changed() {
            self.set_from_user(value, outbox);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueType;
    use serde_json::json;

    fn descriptor(id: &str, value_type: ValueType, value: Value, bounds: Option<(f64, f64)>) -> ParameterDescriptor {
        ParameterDescriptor {
            id: id.to_string(),
            name: format!("{id} name"),
            value_type,
            value,
            min: bounds.map(|b| b.0),
            max: bounds.map(|b| b.1),
        }
    }

    #[test]
    fn integer_conversion_follows_parse_int() {
        assert_eq!(IntegerKind::convert(&json!(5)), Some(5));
        assert_eq!(IntegerKind::convert(&json!(5.9)), Some(5));
        assert_eq!(IntegerKind::convert(&json!(-5.9)), Some(-5));
        assert_eq!(IntegerKind::convert(&json!(" 42px")), Some(42));
        assert_eq!(IntegerKind::convert(&json!("-3")), Some(-3));
        assert_eq!(IntegerKind::convert(&json!("abc")), None);
        assert_eq!(IntegerKind::convert(&json!(true)), None);
        assert_eq!(IntegerKind::convert(&Value::Null), None);
    }

    #[test]
    fn float_conversion_follows_parse_float() {
        assert_eq!(FloatKind::convert(&json!(1)), Some(1.0));
        assert_eq!(FloatKind::convert(&json!("0.25")), Some(0.25));
        assert_eq!(FloatKind::convert(&json!(" 1.5px")), Some(1.5));
        assert_eq!(FloatKind::convert(&json!(".5")), Some(0.5));
        assert_eq!(FloatKind::convert(&json!("7.")), Some(7.0));
        assert_eq!(FloatKind::convert(&json!("1e3x")), Some(1000.0));
        assert_eq!(FloatKind::convert(&json!("2e")), Some(2.0));
        assert_eq!(FloatKind::convert(&json!("-Infinity")), Some(f64::NEG_INFINITY));
        assert_eq!(FloatKind::convert(&json!("inf")), None);
        assert_eq!(FloatKind::convert(&json!("NaN")), None);
        assert_eq!(FloatKind::convert(&json!("-.")), None);
        assert_eq!(FloatKind::convert(&json!([1])), None);
    }

    #[test]
    fn boolean_conversion_is_truthiness() {
        assert!(BooleanKind::convert(&json!(1)).unwrap_or(false));
        assert!(BooleanKind::convert(&json!("off")).unwrap_or(false));
        assert!(!BooleanKind::convert(&json!(0)).unwrap_or(true));
        assert!(!BooleanKind::convert(&json!("")).unwrap_or(true));
        assert!(!BooleanKind::convert(&Value::Null).unwrap_or(true));
    }

    #[test]
    fn integer_slider_spec() {
        let registry = SyncRegistry::new();
        let control = IntegerControl::new(
            &descriptor("P1", ValueType::Integer, json!(5), Some((0.0, 10.0))),
            &registry,
        );
        assert_eq!(control.value(), 5);
        assert_eq!(control.slider(), Some(SliderSpec { min: 0.0, max: 10.0, step: 1.0 }));
        assert_eq!(control.readout(), "5");
        assert!(registry.contains("P1"));
    }

    #[test]
    fn float_readout_is_formatted() {
        let registry = SyncRegistry::new();
        let control = FloatControl::new(
            &descriptor("P2", ValueType::Float, json!(1.0), Some((0.01, 2.0))),
            &registry,
        );
        let spec = control.slider().unwrap();
        assert!((spec.step - 0.00199).abs() < 1e-12);
        assert_eq!(control.readout(), "1.00");
    }

    #[test]
    fn unbounded_control_has_no_slider() {
        let registry = SyncRegistry::new();
        let control = FloatControl::new(
            &descriptor("P3", ValueType::Double, json!(0.3), None),
            &registry,
        );
        assert!(control.slider().is_none());
        assert_eq!(control.readout(), "0.3");
    }

    #[test]
    fn user_edit_updates_state_then_sends() {
        let registry = SyncRegistry::new();
        let mut control = IntegerControl::new(
            &descriptor("P1", ValueType::Integer, json!(5), Some((0.0, 10.0))),
            &registry,
        );
        let mut outbox: Vec<ClientMessage> = Vec::new();

        control.set_from_user(8, &mut outbox);

        assert_eq!(control.value(), 8);
        assert_eq!(outbox, vec![ClientMessage::update("P1", json!(8))]);
    }

    #[test]
    fn inbound_value_is_converted_and_bad_ones_ignored() {
        let registry = SyncRegistry::new();
        let control = BooleanControl::new(
            &descriptor("T", ValueType::Boolean, json!(0), None),
            &registry,
        );
        assert!(!control.value());

        registry.dispatch("T", &json!(1));
        assert!(control.value());

        let registry = SyncRegistry::new();
        let control = FloatControl::new(
            &descriptor("F", ValueType::Float, json!(2.5), None),
            &registry,
        );
        registry.dispatch("F", &json!("not a number"));
        assert_eq!(control.value(), 2.5);
    }

    #[test]
    fn unconvertible_initial_value_falls_back() {
        let registry = SyncRegistry::new();
        let control = IntegerControl::new(
            &descriptor("P", ValueType::Integer, json!("n/a"), None),
            &registry,
        );
        assert_eq!(control.value(), 0);
    }

    fn draw_frames<K>(
        control: &mut BoundControl<K>,
        outbox: &mut Vec<ClientMessage>,
        frames: usize,
    ) where
        K: SliderKind,
        K::Value: egui::emath::Numeric,
    {
        let ctx = egui::Context::default();
        for _ in 0..frames {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| control.slider_ui(ui, &mut *outbox));
            });
        }
    }

    #[test]
    fn drawing_slider_without_input_sends_nothing() {
        let registry = SyncRegistry::new();
        let mut control = FloatControl::new(
            &descriptor("P2", ValueType::Float, json!(1.0), Some((0.01, 2.0))),
            &registry,
        );
        let mut outbox: Vec<ClientMessage> = Vec::new();

        draw_frames(&mut control, &mut outbox, 3);
        assert!(outbox.is_empty(), "unexpected sends: {outbox:?}");
        assert_eq!(control.value(), 1.0);

        let registry = SyncRegistry::new();
        let mut control = FloatControl::new(
            &descriptor("F", ValueType::Float, json!(0.5), Some((0.0, 1.0))),
            &registry,
        );
        registry.dispatch("F", &json!(0.123456789));

        draw_frames(&mut control, &mut outbox, 3);
        assert!(outbox.is_empty(), "unexpected sends: {outbox:?}");
        assert_eq!(control.value(), 0.123456789);
    }

    #[test]
    fn dropping_control_deregisters() {
        let registry = SyncRegistry::new();
        let control = IntegerControl::new(
            &descriptor("P1", ValueType::Integer, json!(1), None),
            &registry,
        );
        drop(control);
        assert!(registry.is_empty());
    }
}
