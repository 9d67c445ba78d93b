//! Clock hand geometry.

use crate::geometry::{Position, Rect};
use crate::time::TimeOfDay;

/// Rotation bias which makes an unrotated hand point at 6 o'clock.
pub const ANGLE_BIAS: f32 = -180.;

/// Corner radius of all hands.
const CORNER_RADIUS: f32 = 8.;

/// Clock hand.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Hand {
    Hour,
    Minute,
    Second,
}

impl Hand {
    /// All hands, in drawing order.
    pub const ALL: [Hand; 3] = [Hand::Hour, Hand::Minute, Hand::Second];

    /// Rotation of this hand in degrees, clockwise.
    ///
    /// Hands jump to their next position, there is no interpolation between
    /// the units. The hour is not reduced to a 12-hour face, since anything
    /// past 360° is the same rotation.
    pub fn angle(self, time: TimeOfDay) -> f32 {
        match self {
            Self::Hour => time.hour() as f32 * 30. + ANGLE_BIAS,
            Self::Minute => time.minute() as f32 * 6. + ANGLE_BIAS,
            Self::Second => time.second() as f32 * 6. + ANGLE_BIAS,
        }
    }

    /// Hand length relative to the face radius.
    pub const fn length_factor(self) -> f32 {
        match self {
            Self::Hour => 0.6,
            Self::Minute => 0.8,
            Self::Second => 1.1,
        }
    }

    /// Hand width and its offset left of the pivot.
    const fn width(self) -> (f32, f32) {
        match self {
            Self::Hour => (12., 8.),
            Self::Minute => (8., 4.),
            Self::Second => (4., 2.),
        }
    }

    /// Width of the hand's outline.
    const fn stroke_width(self) -> f32 {
        match self {
            Self::Hour => 8.,
            Self::Minute => 4.,
            Self::Second => 2.,
        }
    }
}

/// Drawable outline of a hand.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct HandShape {
    /// Unrotated outline, starting at the pivot and extending downwards.
    pub rect: Rect,
    pub corner_radius: f32,
    pub stroke_width: f32,
    /// Clockwise rotation around `pivot` in degrees.
    pub angle: f32,
    pub pivot: Position<f32>,
}

impl HandShape {
    /// Create the outline for a hand on a face of the given radius.
    ///
    /// All fixed dimensions are multiplied by `scale`, while the length only
    /// depends on `radius`.
    pub fn new(
        hand: Hand,
        center: Position<f32>,
        radius: f32,
        time: TimeOfDay,
        scale: f32,
    ) -> Self {
        let (width, offset) = hand.width();
        let rect = Rect::new(
            center.x - offset * scale,
            center.y,
            width * scale,
            radius * hand.length_factor(),
        );

        Self {
            rect,
            pivot: center,
            angle: hand.angle(time),
            corner_radius: CORNER_RADIUS * scale,
            stroke_width: hand.stroke_width() * scale,
        }
    }
}

/// Outlines for all three hands.
pub fn hand_shapes(
    center: Position<f32>,
    radius: f32,
    time: TimeOfDay,
    scale: f32,
) -> [HandShape; 3] {
    Hand::ALL.map(|hand| HandShape::new(hand, center, radius, time, scale))
}
