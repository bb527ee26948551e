//! Message routing
//!
//! Hands each inbound message to the decoder of its logical device.

use topcase_protocol::Message;

use crate::config::TopcaseConfig;
use crate::keyboard::KeyboardState;
use crate::trackpad::Trackpad;
use crate::traits::{KeyboardCapabilities, KeyboardSink, TrackpadSink};

/// Per-device decoders and the sinks they feed
#[derive(Debug)]
pub struct Devices<K, P> {
    pub(crate) config: TopcaseConfig,
    pub(crate) keyboard: KeyboardState,
    pub(crate) keyboard_sink: K,
    pub(crate) keyboard_enabled: bool,
    pub(crate) trackpad: Trackpad,
    pub(crate) trackpad_sink: P,
}

impl<K: KeyboardSink, P: TrackpadSink> Devices<K, P> {
    /// Set up decoders and register the keyboard with its sink
    ///
    /// A keyboard the sink refuses stays disabled for the life of the
    /// device; the trackpad registers later, once its model is known.
    pub fn new(config: TopcaseConfig, mut keyboard_sink: K, trackpad_sink: P) -> Self {
        let caps = KeyboardCapabilities {
            name: config.keyboard_name.clone(),
            vendor_id: config.vendor_id,
            caps_lock_led: true,
            soft_repeat: true,
        };
        let keyboard_enabled = match keyboard_sink.register(&caps) {
            Ok(()) => true,
            Err(_) => {
                error!("could not register keyboard");
                false
            }
        };

        Self {
            config,
            keyboard: KeyboardState::new(),
            keyboard_sink,
            keyboard_enabled,
            trackpad: Trackpad::new(),
            trackpad_sink,
        }
    }

    /// Route one message
    pub fn dispatch(&mut self, msg: Message) {
        match msg {
            Message::Keyboard(report) => {
                if self.keyboard_enabled {
                    self.keyboard.process(&report, &mut self.keyboard_sink);
                }
            }
            Message::BacklightAck { len, level } => match level {
                Some(level) => debug!("backlight level {=u16} acknowledged", level),
                None => warn!("malformed backlight acknowledgement, len {=u16}", len),
            },
            Message::Touch(report) => {
                self.trackpad.handle_touch(&report, &mut self.trackpad_sink);
            }
            Message::MultiTouchEnabled => {
                info!("multi-touch enabled");
            }
            Message::Info(report) => {
                self.trackpad
                    .handle_info(&report, &self.config, &mut self.trackpad_sink);
            }
            Message::Unexpected {
                device,
                msg_type,
                len,
            } => {
                warn!(
                    "unexpected message type {=u16:#x} len {=u16} for {:?}",
                    msg_type,
                    len,
                    device
                );
            }
            Message::Unrouted { device: _ } => {}
        }
    }

    pub fn keyboard_enabled(&self) -> bool {
        self.keyboard_enabled
    }

    pub fn trackpad(&self) -> &Trackpad {
        &self.trackpad
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub(crate) fn into_sinks(self) -> (K, P) {
        (self.keyboard_sink, self.trackpad_sink)
    }
}
