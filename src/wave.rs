//! Decorative wave circle.

use std::f64::consts::PI;

use crate::geometry::{Position, Size};

/// Number of vertices in every wave polygon.
pub const NUMBER_OF_POINTS: usize = 360;

/// Rotation applied to every wave in addition to its own rotation.
pub const DEFAULT_ROTATION: f32 = -8.;

/// Wave shape parameters.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct WaveParams {
    /// Number of wave crests around the circle.
    pub edges: u32,
    /// Radial displacement of the crests.
    pub amplitude: f32,
    /// Outline width reserved inside the canvas bounds.
    pub stroke_width: f32,
    /// Rotation in degrees on top of [`DEFAULT_ROTATION`].
    pub rotation: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self { edges: 12, amplitude: 20., stroke_width: 0., rotation: 0. }
    }
}

/// Closed polygon oscillating around a circle.
#[derive(Clone, PartialEq, Debug)]
pub struct WavePolygon {
    points: Vec<Position<f32>>,
    center: Position<f32>,
    rotation: f32,
    degenerate: bool,
}

impl WavePolygon {
    /// Generate the wave for a canvas.
    ///
    /// The polygon is centered on the canvas and its base radius is derived
    /// from the canvas width. A canvas without width collapses all vertices
    /// onto its center.
    pub fn new(params: WaveParams, canvas: Size<f32>) -> Self {
        let center_x = half(canvas.width);
        let center_y = half(canvas.height);
        let center = Position::new(center_x as f32, center_y as f32);
        let rotation = DEFAULT_ROTATION + params.rotation;

        let degenerate = !(canvas.width.is_finite() && canvas.width > 0.)
            || !canvas.height.is_finite()
            || !params.amplitude.is_finite()
            || !params.stroke_width.is_finite();
        if degenerate {
            let points = vec![center; NUMBER_OF_POINTS];
            return Self { points, center, rotation, degenerate };
        }

        let base_radius = center_x - params.stroke_width as f64 / 2.;
        let amplitude = params.amplitude as f64;
        let edges = params.edges as f64;
        let increment = 360. / NUMBER_OF_POINTS as f64;

        let points = (0..NUMBER_OF_POINTS)
            .map(|i| {
                let theta = (i as f64 * increment) * PI / 180.;
                let radius = base_radius + (theta * edges).sin() * amplitude;
                let x = center_x + radius * theta.cos();
                let y = center_y + radius * theta.sin();
                Position::new(x as f32, y as f32)
            })
            .collect();

        Self { points, center, rotation, degenerate }
    }

    /// Polygon vertices in order.
    ///
    /// The path is closed from the last vertex back to the first one, the
    /// first vertex is not repeated.
    pub fn points(&self) -> &[Position<f32>] {
        &self.points
    }

    pub fn center(&self) -> Position<f32> {
        self.center
    }

    /// Total clockwise rotation around the center in degrees.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Whether the wave collapsed due to an unmeasured canvas.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }
}

/// Half of a canvas dimension, treating unmeasured dimensions as zero.
fn half(length: f32) -> f64 {
    if length.is_finite() { length as f64 / 2. } else { 0. }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(edges: u32, amplitude: f32) -> WaveParams {
        WaveParams { edges, amplitude, stroke_width: 0., rotation: 0. }
    }

    /// Unperturbed radius, taken from the first vertex where the sine is zero.
    fn base_radius(wave: &WavePolygon) -> f32 {
        let delta = wave.points()[0] - wave.center();
        delta.x.hypot(delta.y)
    }

    #[test]
    fn vertex_count() {
        for size in [Size::new(256., 256.), Size::new(0., 0.), Size::new(1., 500.)] {
            let wave = WavePolygon::new(WaveParams::default(), size);
            assert_eq!(wave.points().len(), NUMBER_OF_POINTS);
        }
    }

    #[test]
    fn radius_follows_sine() {
        let canvas = Size::new(256., 200.);
        for edges in [1, 12, 37] {
            for amplitude in [0., 20., 100.] {
                let wave = WavePolygon::new(params(edges, amplitude), canvas);
                assert_eq!(base_radius(&wave), 128.);

                let center = wave.center();
                for (i, point) in wave.points().iter().enumerate() {
                    let theta = (i as f64).to_radians();
                    let expected = 128. + (theta * edges as f64).sin() * amplitude as f64;

                    let (dx, dy) = (point.x - center.x, point.y - center.y);
                    let radius = dx.hypot(dy) as f64;

                    assert!(
                        (radius - expected).abs() < 1e-3 * expected,
                        "edges={edges} amplitude={amplitude} i={i}: {radius} != {expected}"
                    );
                }
            }
        }
    }

    #[test]
    fn first_vertex_on_positive_x_axis() {
        let wave = WavePolygon::new(params(12, 20.), Size::new(256., 256.));
        assert_eq!(wave.points()[0], Position::new(256., 128.));
    }

    #[test]
    fn stroke_shrinks_radius() {
        let wave_params = WaveParams { stroke_width: 20., ..params(12, 20.) };
        let wave = WavePolygon::new(wave_params, Size::new(256., 256.));
        assert_eq!(base_radius(&wave), 118.);
    }

    #[test]
    fn centered_on_canvas() {
        let wave = WavePolygon::new(params(12, 20.), Size::new(300., 100.));
        assert_eq!(wave.center(), Position::new(150., 50.));
    }

    #[test]
    fn rotation_includes_bias() {
        let wave = WavePolygon::new(WaveParams::default(), Size::new(10., 10.));
        assert_eq!(wave.rotation(), -8.);

        let wave_params = WaveParams { rotation: 30., ..Default::default() };
        let wave = WavePolygon::new(wave_params, Size::new(10., 10.));
        assert_eq!(wave.rotation(), 22.);
    }

    #[test]
    fn zero_canvas_is_degenerate() {
        let wave = WavePolygon::new(WaveParams::default(), Size::new(0., 0.));
        assert!(wave.is_degenerate());
        assert_eq!(base_radius(&wave), 0.);
        assert!(wave.points().iter().all(|point| *point == Position::new(0., 0.)));
    }

    #[test]
    fn non_finite_input_never_produces_nan() {
        let sizes = [Size::new(f32::NAN, 10.), Size::new(10., f32::INFINITY), Size::new(-5., 5.)];
        for size in sizes {
            let wave = WavePolygon::new(WaveParams::default(), size);
            assert!(wave.is_degenerate());
            assert!(wave.points().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        }

        let wave_params = WaveParams { amplitude: f32::NAN, ..Default::default() };
        let wave = WavePolygon::new(wave_params, Size::new(10., 10.));
        assert!(wave.is_degenerate());
    }

    #[test]
    fn recomputes_after_measurement() {
        let unmeasured = WavePolygon::new(WaveParams::default(), Size::default());
        let measured = WavePolygon::new(WaveParams::default(), Size::new(256., 256.));
        assert!(unmeasured.is_degenerate());
        assert!(!measured.is_degenerate());
        assert_ne!(unmeasured.points(), measured.points());
    }
}
