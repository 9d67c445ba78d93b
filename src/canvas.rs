//! Drawing surface abstraction.

use resvg::tiny_skia::{self, FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::config::Color;
use crate::geometry::{Position, Rect, Size};

/// Cubic bézier control point distance for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// Clockwise rotation around a pivot.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Rotation {
    pub degrees: f32,
    pub pivot: Position<f32>,
}

impl Rotation {
    pub const fn new(degrees: f32, pivot: Position<f32>) -> Self {
        Self { degrees, pivot }
    }

    fn transform(rotation: Option<Self>) -> Transform {
        match rotation {
            Some(Self { degrees, pivot }) => Transform::from_rotate_at(degrees, pivot.x, pivot.y),
            None => Transform::identity(),
        }
    }
}

/// Surface for drawing the clock face.
pub trait Canvas {
    /// Drawable area in pixels.
    fn dimensions(&self) -> Size<f32>;

    /// Fill the entire surface.
    fn clear(&mut self, color: Color);

    /// Fill a closed polygon.
    fn fill_polygon(&mut self, points: &[Position<f32>], color: Color, rotation: Option<Rotation>);

    /// Fill a rectangle with rounded corners.
    fn fill_round_rect(&mut self, rect: Rect, corner_radius: f32, color: Color);

    /// Outline a rectangle with rounded corners.
    fn stroke_round_rect(
        &mut self,
        rect: Rect,
        corner_radius: f32,
        stroke_width: f32,
        color: Color,
        rotation: Option<Rotation>,
    );
}

impl Canvas for Pixmap {
    fn dimensions(&self) -> Size<f32> {
        Size::new(self.width() as f32, self.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        self.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, 255));
    }

    fn fill_polygon(
        &mut self,
        points: &[Position<f32>],
        color: Color,
        rotation: Option<Rotation>,
    ) {
        let (first, rest) = match points.split_first() {
            Some(split) => split,
            None => return,
        };

        let mut builder = PathBuilder::new();
        builder.move_to(first.x, first.y);
        for point in rest {
            builder.line_to(point.x, point.y);
        }
        builder.close();

        // Collapsed polygons have no path.
        if let Some(path) = builder.finish() {
            let transform = Rotation::transform(rotation);
            self.fill_path(&path, &paint(color), FillRule::Winding, transform, None);
        }
    }

    fn fill_round_rect(&mut self, rect: Rect, corner_radius: f32, color: Color) {
        if let Some(path) = round_rect(rect, corner_radius) {
            self.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
        }
    }

    fn stroke_round_rect(
        &mut self,
        rect: Rect,
        corner_radius: f32,
        stroke_width: f32,
        color: Color,
        rotation: Option<Rotation>,
    ) {
        if let Some(path) = round_rect(rect, corner_radius) {
            let stroke = Stroke { width: stroke_width, ..Default::default() };
            let transform = Rotation::transform(rotation);
            self.stroke_path(&path, &paint(color), &stroke, transform, None);
        }
    }
}

/// Anti-aliased solid color paint.
fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = true;
    paint
}

/// Rounded rectangle path.
///
/// The radius is clamped to half of the shorter side.
fn round_rect(rect: Rect, radius: f32) -> Option<Path> {
    let Rect { origin: Position { x, y }, size: Size { width, height } } = rect;
    if !(width > 0. && height > 0.) {
        return None;
    }

    let radius = radius.min(width / 2.).min(height / 2.).max(0.);
    let control = radius * (1. - KAPPA);
    let (right, bottom) = (x + width, y + height);

    let mut builder = PathBuilder::new();
    builder.move_to(x + radius, y);
    builder.line_to(right - radius, y);
    builder.cubic_to(right - control, y, right, y + control, right, y + radius);
    builder.line_to(right, bottom - radius);
    builder.cubic_to(right, bottom - control, right - control, bottom, right - radius, bottom);
    builder.line_to(x + radius, bottom);
    builder.cubic_to(x + control, bottom, x, bottom - control, x, bottom - radius);
    builder.line_to(x, y + radius);
    builder.cubic_to(x, y + control, x + control, y, x + radius, y);
    builder.close();
    builder.finish()
}
