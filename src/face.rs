//! Clock face painting.

use crate::canvas::{Canvas, Rotation};
use crate::config::{Color, Config};
use crate::geometry::{Position, Size};
use crate::hands::{Hand, hand_shapes};
use crate::layout::ClockLayout;
use crate::time::TimeOfDay;
use crate::wave::WavePolygon;

/// Draw the decorative wave with its canvas origin at `origin`.
///
/// Degenerate waves are not drawn.
pub fn paint_wave<C: Canvas>(
    canvas: &mut C,
    wave: &WavePolygon,
    origin: Position<f32>,
    color: Color,
) {
    if wave.is_degenerate() {
        return;
    }

    let points: Vec<_> = wave.points().iter().map(|point| *point + origin).collect();
    let rotation = Rotation::new(wave.rotation(), wave.center() + origin);
    canvas.fill_polygon(&points, color, Some(rotation));
}

/// Draw all clock hands rotated around `center`.
pub fn paint_hands<C: Canvas>(
    canvas: &mut C,
    center: Position<f32>,
    radius: f32,
    time: TimeOfDay,
    scale: f32,
    colors: [Color; 3],
) {
    if !(radius.is_finite() && radius > 0.) {
        return;
    }

    for (shape, color) in hand_shapes(center, radius, time, scale).into_iter().zip(colors) {
        let rotation = Rotation::new(shape.angle, shape.pivot);
        canvas.stroke_round_rect(
            shape.rect,
            shape.corner_radius,
            shape.stroke_width,
            color,
            Some(rotation),
        );
    }
}

/// Digital readout text for the hour, minute and second buttons.
pub fn readout_labels(time: TimeOfDay) -> [String; 3] {
    [time.hour(), time.minute(), time.second()].map(|value| value.to_string())
}

/// Complete clock window content, except for text.
pub struct ClockFace<'a> {
    config: &'a Config,
    scale: f32,
}

impl<'a> ClockFace<'a> {
    /// Create a painter for a window with the given DPI scale factor.
    pub fn new(config: &'a Config, scale: f32) -> Self {
        Self { config, scale }
    }

    /// Paint the face onto a canvas covering the whole window.
    pub fn paint<C: Canvas>(&self, canvas: &mut C, time: TimeOfDay) {
        let colors = &self.config.colors;
        let layout = ClockLayout::new(canvas.dimensions());

        canvas.clear(colors.background);

        // Wave canvas is a square centered in the face area.
        let face_center = layout.face.center();
        let width = self.config.wave.width * self.scale;
        let wave = WavePolygon::new(self.config.wave.params(self.scale), Size::new(width, width));
        let origin = Position::new(face_center.x - width / 2., face_center.y - width / 2.);
        paint_wave(canvas, &wave, origin, colors.wave);

        let hand_colors = Hand::ALL.map(|hand| match hand {
            Hand::Hour => colors.hour_hand,
            Hand::Minute => colors.minute_hand,
            Hand::Second => colors.second_hand,
        });
        paint_hands(canvas, face_center, layout.dial_radius(), time, self.scale, hand_colors);

        for button in layout.readout {
            canvas.fill_round_rect(button, button.size.height / 2., colors.button);
        }
    }
}

#[cfg(test)]
mod tests {
    use resvg::tiny_skia::Pixmap;

    use super::*;
    use crate::geometry::Rect;
    use crate::wave::{NUMBER_OF_POINTS, WaveParams};

    /// Canvas recording all draw calls.
    struct Recorder {
        size: Size<f32>,
        ops: Vec<Op>,
    }

    #[derive(PartialEq, Debug)]
    enum Op {
        Clear(Color),
        Polygon(usize, Color, Option<Rotation>),
        FillRect(Rect, Color),
        StrokeRect(Rect, Color, Option<Rotation>),
    }

    impl Recorder {
        fn new(width: f32, height: f32) -> Self {
            Self { size: Size::new(width, height), ops: Vec::new() }
        }
    }

    impl Canvas for Recorder {
        fn dimensions(&self) -> Size<f32> {
            self.size
        }

        fn clear(&mut self, color: Color) {
            self.ops.push(Op::Clear(color));
        }

        fn fill_polygon(
            &mut self,
            points: &[Position<f32>],
            color: Color,
            rotation: Option<Rotation>,
        ) {
            self.ops.push(Op::Polygon(points.len(), color, rotation));
        }

        fn fill_round_rect(&mut self, rect: Rect, _corner_radius: f32, color: Color) {
            self.ops.push(Op::FillRect(rect, color));
        }

        fn stroke_round_rect(
            &mut self,
            rect: Rect,
            _corner_radius: f32,
            _stroke_width: f32,
            color: Color,
            rotation: Option<Rotation>,
        ) {
            self.ops.push(Op::StrokeRect(rect, color, rotation));
        }
    }

    fn time(hour: u8, minute: u8, second: u8) -> TimeOfDay {
        TimeOfDay::new(hour, minute, second).unwrap()
    }

    fn rgb(pixmap: &Pixmap, x: u32, y: u32) -> Color {
        let pixel = pixmap.pixel(x, y).unwrap();
        Color::new(pixel.red(), pixel.green(), pixel.blue())
    }

    #[test]
    fn labels_are_unpadded() {
        assert_eq!(readout_labels(time(3, 5, 45)), ["3", "5", "45"]);
        assert_eq!(readout_labels(time(0, 0, 0)), ["0", "0", "0"]);
    }

    #[test]
    fn draw_order() {
        let config = Config::default();
        let colors = &config.colors;
        let mut canvas = Recorder::new(260., 280.);
        ClockFace::new(&config, 1.).paint(&mut canvas, time(3, 15, 45));

        let center = Position::new(130., 100.);
        assert_eq!(canvas.ops.len(), 8);
        assert_eq!(canvas.ops[0], Op::Clear(colors.background));
        assert_eq!(
            canvas.ops[1],
            Op::Polygon(NUMBER_OF_POINTS, colors.wave, Some(Rotation::new(-8., center)))
        );

        let angles = [-90., -90., 90.];
        let hand_colors = [colors.hour_hand, colors.minute_hand, colors.second_hand];
        for (i, (angle, color)) in angles.into_iter().zip(hand_colors).enumerate() {
            match &canvas.ops[2 + i] {
                Op::StrokeRect(_, op_color, rotation) => {
                    assert_eq!(*op_color, color);
                    assert_eq!(*rotation, Some(Rotation::new(angle, center)));
                },
                op => panic!("expected hand, got {op:?}"),
            }
        }

        assert_eq!(canvas.ops[5], Op::FillRect(Rect::new(20., 200., 60., 40.), colors.button));
        assert_eq!(canvas.ops[6], Op::FillRect(Rect::new(100., 200., 60., 40.), colors.button));
        assert_eq!(canvas.ops[7], Op::FillRect(Rect::new(180., 200., 60., 40.), colors.button));
    }

    #[test]
    fn unmeasured_canvas_only_clears() {
        let config = Config::default();
        let mut canvas = Recorder::new(0., 0.);
        ClockFace::new(&config, 1.).paint(&mut canvas, time(12, 0, 0));

        // Readout buttons collapse to empty rectangles.
        assert_eq!(canvas.ops[0], Op::Clear(config.colors.background));
        let rest = &canvas.ops[1..];
        assert!(rest.iter().all(|op| matches!(op, Op::Polygon(..) | Op::FillRect(..))));
        assert!(!canvas.ops.iter().any(|op| matches!(op, Op::StrokeRect(..))));
    }

    #[test]
    fn degenerate_wave_is_skipped() {
        let mut canvas = Recorder::new(100., 100.);
        let wave = WavePolygon::new(WaveParams::default(), Size::default());
        paint_wave(&mut canvas, &wave, Position::new(10., 10.), Color::new(1, 2, 3));
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn wave_is_translated() {
        let mut canvas = Recorder::new(100., 100.);
        let wave = WavePolygon::new(WaveParams::default(), Size::new(40., 40.));
        paint_wave(&mut canvas, &wave, Position::new(10., 20.), Color::new(1, 2, 3));

        let rotation = Some(Rotation::new(-8., Position::new(30., 40.)));
        let expected = Op::Polygon(NUMBER_OF_POINTS, Color::new(1, 2, 3), rotation);
        assert_eq!(canvas.ops, vec![expected]);
    }

    #[test]
    fn hands_need_a_radius() {
        let mut canvas = Recorder::new(100., 100.);
        let colors = [Color::new(0, 0, 0); 3];
        let center = Position::new(50., 50.);
        paint_hands(&mut canvas, center, 0., time(1, 2, 3), 1., colors);
        paint_hands(&mut canvas, center, f32::NAN, time(1, 2, 3), 1., colors);
        assert!(canvas.ops.is_empty());
    }

    #[test]
    fn pixmap_rendering() {
        let config = Config::default();
        let colors = &config.colors;
        let mut pixmap = Pixmap::new(260, 280).unwrap();
        ClockFace::new(&config, 1.).paint(&mut pixmap, time(0, 0, 0));

        // Corner outside of the wave.
        assert_eq!(rgb(&pixmap, 2, 2), colors.background);

        // Inside the wave, away from the hands.
        assert_eq!(rgb(&pixmap, 230, 100), colors.wave);

        // Right edge of the hour hand, pointing up.
        assert_eq!(rgb(&pixmap, 138, 85), colors.hour_hand);

        // Center of the hour button.
        assert_eq!(rgb(&pixmap, 50, 220), colors.button);
    }
}
