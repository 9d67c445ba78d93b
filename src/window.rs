//! Clock window state.

use std::mem;

use glutin::display::Display;
use resvg::tiny_skia::Pixmap;
use smithay_client_toolkit::compositor::{CompositorState, Region};
use smithay_client_toolkit::reexports::client::protocol::wl_surface::WlSurface;
use smithay_client_toolkit::reexports::client::{Connection, QueueHandle};
use smithay_client_toolkit::shell::WaylandSurface;
use smithay_client_toolkit::shell::wlr_layer::{
    Anchor, KeyboardInteractivity, Layer, LayerSurface,
};
use tracing::error;

use crate::config::Config;
use crate::face::{ClockFace, readout_labels};
use crate::geometry::Size;
use crate::layout::ClockLayout;
use crate::renderer::{Renderer, SizedRenderer};
use crate::time::TimeOfDay;
use crate::{ProtocolStates, Result, State};

/// Layer shell namespace of the clock window.
const NAMESPACE: &str = "horologe";

pub struct Window {
    queue: QueueHandle<State>,
    connection: Connection,
    window: LayerSurface,

    renderer: Renderer,

    size: Size<u32>,
    scale: i32,

    stalled: bool,
    dirty: bool,
}

impl Window {
    pub fn new(
        config: &Config,
        queue: QueueHandle<State>,
        connection: Connection,
        protocol_states: &ProtocolStates,
        display: Display,
    ) -> Self {
        let surface = protocol_states.compositor.create_surface(&queue);

        // Cover the entire output, the compositor picks the size.
        let window = protocol_states.layer.create_layer_surface(
            &queue,
            surface.clone(),
            Layer::Top,
            Some(NAMESPACE),
            None,
        );
        window.set_anchor(Anchor::LEFT | Anchor::TOP | Anchor::RIGHT | Anchor::BOTTOM);
        window.set_keyboard_interactivity(KeyboardInteractivity::None);
        window.set_size(0, 0);
        window.commit();

        let renderer = Renderer::new(&config.font, display, surface);

        Self {
            connection,
            renderer,
            window,
            queue,
            stalled: true,
            dirty: true,
            scale: 1,
            size: Default::default(),
        }
    }

    /// Render the clock.
    pub fn draw(&mut self, config: &Config, time: TimeOfDay) {
        // Wait for a change and the initial configure.
        if !self.dirty || self.size == Size::default() {
            self.stalled = true;
            return;
        }
        self.dirty = false;

        let surface = self.window.wl_surface();
        surface.set_buffer_scale(self.scale);
        surface.damage(0, 0, self.size.width as i32, self.size.height as i32);

        let scale = self.scale as f64;
        let physical_size = self.size * scale;
        let result = self.renderer.draw(physical_size, scale, |renderer| {
            renderer.clear(config.colors.background);

            // Shapes are rendered on the CPU, only text uses OpenGL directly.
            let (width, height) = (physical_size.width, physical_size.height);
            let mut pixmap = Pixmap::new(width, height)
                .ok_or_else(|| format!("invalid clock face size: {width}x{height}"))?;
            ClockFace::new(config, scale as f32).paint(&mut pixmap, time);
            renderer.draw_face(&pixmap)?;

            Self::draw_readout(renderer, config, physical_size, time)
        });

        if let Err(err) = result {
            error!("Clock rendering failed: {err}");
        }

        // Request a new frame.
        surface.frame(&self.queue, surface.clone());

        // Apply surface changes.
        surface.commit();
    }

    /// Render the digital readout labels onto their buttons.
    fn draw_readout(
        renderer: &mut SizedRenderer,
        config: &Config,
        size: Size<u32>,
        time: TimeOfDay,
    ) -> Result<()> {
        let layout = ClockLayout::new(size.into());
        let metrics = renderer.rasterizer.metrics()?;

        for (label, button) in readout_labels(time).iter().zip(layout.readout) {
            let line = renderer.rasterizer.rasterize_line(label);
            let origin = line.centered_origin(button, &metrics);
            renderer.batch_text(&line, origin);
        }

        renderer.flush(config.colors.button_text);

        Ok(())
    }

    /// Unstall the renderer.
    ///
    /// This will render a new frame if there currently is no frame request
    /// pending.
    pub fn unstall(&mut self, config: &Config, time: TimeOfDay) {
        // Ensure we actually draw even if renderer isn't stalled.
        self.dirty = true;

        if !mem::take(&mut self.stalled) {
            return;
        }

        self.draw(config, time);
        let _ = self.connection.flush();
    }

    /// Check if the window owns this surface.
    pub fn owns_surface(&self, surface: &WlSurface) -> bool {
        self.window.wl_surface() == surface
    }

    /// Update the window's logical size.
    pub fn set_size(&mut self, compositor: &CompositorState, size: Size<u32>) {
        if self.size == size {
            return;
        }

        self.size = size;
        self.dirty = true;

        // Update the opaque region, it is committed atomically on redraw.
        if let Ok(region) = Region::new(compositor) {
            region.add(0, 0, size.width as i32, size.height as i32);
            self.window.wl_surface().set_opaque_region(Some(region.wl_region()));
        }
    }

    /// Update the DPI scale factor.
    pub fn set_scale_factor(&mut self, scale: i32) {
        if self.scale == scale {
            return;
        }

        self.scale = scale;
        self.dirty = true;
    }
}
