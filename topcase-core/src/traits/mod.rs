//! Collaborator traits
//!
//! These traits define the interface between the driver logic and the
//! bus and input subsystems of the host.

pub mod input;
pub mod transport;

pub use input::{
    AxisRange, KeyboardCapabilities, KeyboardSink, RegistrationError, SlotState,
    TrackpadCapabilities, TrackpadSink,
};
pub use transport::{SpiTransport, Transport};
