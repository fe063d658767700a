#![forbid(unsafe_code)]

//! Observed frame geometry.

use serde::{Deserialize, Serialize};

/// Content size reported from inside an embedded frame.
///
/// Dimensions arrive as JSON numbers and may be fractional (CSS pixel
/// measurements); they are stored exactly as reported. The frame element's
/// integer attributes are derived through [`display`](Self::display), which
/// rounds up to the nearest whole unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservedSize {
    /// Reported content width.
    pub width: f64,
    /// Reported content height.
    pub height: f64,
}

impl ObservedSize {
    /// The zero size a panel starts with before any report arrives.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a size from reported dimensions.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width attribute for the frame element (rounded up, clamped).
    #[must_use]
    pub fn display_width(&self) -> u32 {
        ceil_unit(self.width)
    }

    /// Height attribute for the frame element (rounded up, clamped).
    #[must_use]
    pub fn display_height(&self) -> u32 {
        ceil_unit(self.height)
    }

    /// Both frame element attributes as `(width, height)`.
    #[must_use]
    pub fn display(&self) -> (u32, u32) {
        (self.display_width(), self.display_height())
    }
}

/// Round a reported dimension up to a whole displayable unit.
///
/// Non-positive and non-numeric reports clamp to `0`; oversized reports
/// clamp to `u32::MAX` rather than wrapping.
fn ceil_unit(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let ceiled = value.ceil();
    if ceiled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        ceiled as u32
    }
}
