//! Trackpad decoder
//!
//! The trackpad stays silent towards the host until the info channel has
//! reported its model: the model selects the calibration the multi-touch
//! sink is registered with, and touch reports before that are dropped.

use topcase_protocol::payload::{Finger, InfoReport, TouchReport};

use crate::config::{TopcaseConfig, TrackpadModel};
use crate::traits::input::MAX_FINGER_ORIENTATION;
use crate::traits::{SlotState, TrackpadCapabilities, TrackpadSink};

/// Pressure and contact and tool sizes are reported at half resolution
const SIZE_SCALE: i32 = 2;

/// Registration progress of the trackpad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackpadStatus {
    /// Waiting for the first info report
    Undiscovered,
    /// Registered and forwarding touches
    Active { model: u8 },
    /// Registration failed; stays off until detach
    Disabled,
}

/// Trackpad state for one attached device
#[derive(Debug)]
pub struct Trackpad {
    model: Option<&'static TrackpadModel>,
    status: TrackpadStatus,
}

impl Default for Trackpad {
    fn default() -> Self {
        Self::new()
    }
}

impl Trackpad {
    pub const fn new() -> Self {
        Self {
            model: None,
            status: TrackpadStatus::Undiscovered,
        }
    }

    pub fn status(&self) -> TrackpadStatus {
        self.status
    }

    /// Calibration in use, once known
    pub fn model(&self) -> Option<&'static TrackpadModel> {
        self.model
    }

    /// Handle device information; only the first report has any effect
    pub fn handle_info<S: TrackpadSink>(&mut self, info: &InfoReport, config: &TopcaseConfig, sink: &mut S) {
        if self.status != TrackpadStatus::Undiscovered {
            return;
        }

        info!("trackpad model {=u8:#x}", info.model);
        let model = match config.model_or_fallback(info.model) {
            Some(model) => {
                if model.id != info.model {
                    warn!("unknown trackpad model, assuming {=u8}", model.id);
                }
                model
            }
            None => {
                error!("no calibration for trackpad model {=u8}", info.model);
                self.status = TrackpadStatus::Disabled;
                return;
            }
        };

        let caps = TrackpadCapabilities::for_bounds(
            config.trackpad_name.clone(),
            config.vendor_id,
            model.id,
            &model.bounds,
        );
        match sink.register(&caps) {
            Ok(()) => {
                self.model = Some(model);
                self.status = TrackpadStatus::Active { model: model.id };
            }
            Err(_) => {
                error!("could not register trackpad");
                self.status = TrackpadStatus::Disabled;
            }
        }
    }

    /// Forward one touch report as slot updates, button state and a sync
    pub fn handle_touch<S: TrackpadSink>(&mut self, report: &TouchReport, sink: &mut S) {
        let Some(model) = self.model else {
            return;
        };

        if report.truncated() {
            warn!(
                "touch report announces {=u8} fingers, carries {=usize}",
                report.announced,
                report.fingers.len()
            );
        }

        for (slot, finger) in report.fingers.iter().enumerate() {
            if !finger.is_touching() {
                continue;
            }
            sink.slot(slot as u8, &slot_state(slot, finger, model));
        }

        sink.button(crate::config::keymap::BTN_LEFT, report.clicked);
        sink.sync();
    }
}

fn slot_state(slot: usize, finger: &Finger, model: &TrackpadModel) -> SlotState {
    SlotState {
        id: slot as i32,
        x: finger.abs_x as i32,
        y: model.bounds.flip_y(finger.abs_y as i32),
        pressure: finger.pressure as i32 * SIZE_SCALE,
        touch_major: finger.touch_major as i32 * SIZE_SCALE,
        touch_minor: finger.touch_minor as i32 * SIZE_SCALE,
        width_major: finger.tool_major as i32 * SIZE_SCALE,
        width_minor: finger.tool_minor as i32 * SIZE_SCALE,
        orientation: MAX_FINGER_ORIENTATION - finger.orientation as i32,
    }
}
