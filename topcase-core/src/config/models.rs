//! Trackpad calibration table
//!
//! Each trackpad generation reports raw coordinates in its own range. The
//! model id comes from the info channel and selects the bounding box used
//! for axis registration and the Y flip.

/// Raw coordinate bounds of a trackpad surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounds {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl Bounds {
    /// Flip a raw Y coordinate; the device counts upwards from the front edge
    pub const fn flip_y(&self, raw_y: i32) -> i32 {
        self.y_min + self.y_max - raw_y
    }
}

/// Calibration entry for one trackpad model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackpadModel {
    /// Model id as reported by the info channel
    pub id: u8,
    pub bounds: Bounds,
}

/// Known trackpad models
pub static TRACKPAD_MODELS: [TrackpadModel; 4] = [
    // MacBookPro11,4/11,5/12,1
    TrackpadModel {
        id: 3,
        bounds: Bounds { x_min: -4828, y_min: -203, x_max: 5345, y_max: 6803 },
    },
    // MacBook8,1/9,1/10,1
    TrackpadModel {
        id: 4,
        bounds: Bounds { x_min: -5087, y_min: -182, x_max: 5579, y_max: 6089 },
    },
    // MacBookPro13,1/13,2/14,1/14,2
    TrackpadModel {
        id: 5,
        bounds: Bounds { x_min: -6243, y_min: -170, x_max: 6749, y_max: 7685 },
    },
    // MacBookPro13,3/14,3
    TrackpadModel {
        id: 6,
        bounds: Bounds { x_min: -7456, y_min: -163, x_max: 7976, y_max: 9283 },
    },
];

/// Look up a model by id
pub fn find_model(id: u8) -> Option<&'static TrackpadModel> {
    TRACKPAD_MODELS.iter().find(|model| model.id == id)
}
