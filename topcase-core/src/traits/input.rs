//! Input event sink traits
//!
//! Sinks receive normalized events and forward them to whatever input
//! subsystem the host runs (evdev, a HID gadget, a test recorder).

use heapless::String;

use crate::config::{Bounds, KeyCode, MAX_NAME_LEN};

/// Highest orientation value a finger reports
pub const MAX_FINGER_ORIENTATION: i32 = 16384;

/// Multi-touch slots announced to the sink
pub const MAX_MT_SLOTS: u8 = 16;

/// Upper bound of the pressure axis
pub const MAX_PRESSURE: i32 = 300;

/// Upper bound of the contact and tool axes
pub const MAX_AXIS_SIZE: i32 = 5000;

/// The sink refused to register the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationError;

/// Inclusive axis range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

/// What a keyboard sink must support
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardCapabilities {
    pub name: String<MAX_NAME_LEN>,
    pub vendor_id: u16,
    /// Caps lock LED present
    pub caps_lock_led: bool,
    /// Autorepeat is left to the sink
    pub soft_repeat: bool,
}

impl KeyboardCapabilities {
    /// Every key code the keyboard can report
    pub fn keys(&self) -> impl Iterator<Item = KeyCode> {
        crate::config::keymap::keyboard_keys()
    }
}

/// What a multi-touch sink must support
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackpadCapabilities {
    pub name: String<MAX_NAME_LEN>,
    pub vendor_id: u16,
    /// Calibrated model id
    pub model: u8,
    pub position_x: AxisRange,
    pub position_y: AxisRange,
    pub pressure: AxisRange,
    pub touch_major: AxisRange,
    pub touch_minor: AxisRange,
    pub width_major: AxisRange,
    pub width_minor: AxisRange,
    pub orientation: AxisRange,
    pub max_slots: u8,
    /// Reports absolute pointer positions
    pub pointer: bool,
    /// The whole surface is the button
    pub button_pad: bool,
    pub button: KeyCode,
}

impl TrackpadCapabilities {
    /// Capabilities of a trackpad calibrated to `bounds`
    pub fn for_bounds(name: String<MAX_NAME_LEN>, vendor_id: u16, model: u8, bounds: &Bounds) -> Self {
        let size = AxisRange::new(0, MAX_AXIS_SIZE);
        Self {
            name,
            vendor_id,
            model,
            position_x: AxisRange::new(bounds.x_min, bounds.x_max),
            position_y: AxisRange::new(bounds.y_min, bounds.y_max),
            pressure: AxisRange::new(0, MAX_PRESSURE),
            touch_major: size,
            touch_minor: size,
            width_major: size,
            width_minor: size,
            orientation: AxisRange::new(-MAX_FINGER_ORIENTATION, MAX_FINGER_ORIENTATION),
            max_slots: MAX_MT_SLOTS,
            pointer: true,
            button_pad: true,
            button: crate::config::keymap::BTN_LEFT,
        }
    }
}

/// State of one multi-touch slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotState {
    /// Tracking id
    pub id: i32,
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub touch_major: i32,
    pub touch_minor: i32,
    pub width_major: i32,
    pub width_minor: i32,
    pub orientation: i32,
}

/// Keyboard event sink
pub trait KeyboardSink {
    /// Announce the device, called once at attach
    fn register(&mut self, caps: &KeyboardCapabilities) -> Result<(), RegistrationError>;

    /// Key went down (`pressed`) or up
    fn key(&mut self, key: KeyCode, pressed: bool);

    /// End of one report
    fn sync(&mut self);
}

/// Multi-touch event sink
pub trait TrackpadSink {
    /// Announce the device, called once the model is known
    fn register(&mut self, caps: &TrackpadCapabilities) -> Result<(), RegistrationError>;

    /// Update one contact slot
    fn slot(&mut self, slot: u8, state: &SlotState);

    /// Button state
    fn button(&mut self, button: KeyCode, pressed: bool);

    /// End of one report
    fn sync(&mut self);
}
