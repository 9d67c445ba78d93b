use std::error::Error;
use std::process;
use std::ptr::NonNull;
use std::result::Result as StdResult;

use calloop::{EventLoop, LoopHandle};
use calloop_wayland_source::WaylandSource;
use glutin::display::{Display, DisplayApiPreference};
use raw_window_handle::{RawDisplayHandle, WaylandDisplayHandle};
use smithay_client_toolkit::compositor::{CompositorHandler, CompositorState};
use smithay_client_toolkit::output::{OutputHandler, OutputState};
use smithay_client_toolkit::reexports::client::globals::{self, GlobalList};
use smithay_client_toolkit::reexports::client::protocol::wl_output::{Transform, WlOutput};
use smithay_client_toolkit::reexports::client::protocol::wl_surface::WlSurface;
use smithay_client_toolkit::reexports::client::{Connection, QueueHandle};
use smithay_client_toolkit::registry::{ProvidesRegistryState, RegistryState};
use smithay_client_toolkit::shell::WaylandSurface;
use smithay_client_toolkit::shell::wlr_layer::{
    LayerShell, LayerShellHandler, LayerSurface, LayerSurfaceConfigure,
};
use smithay_client_toolkit::{
    delegate_compositor, delegate_layer, delegate_output, delegate_registry, registry_handlers,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::sampler::{Sampler, TimeSink};
use crate::time::{LocalClock, TimeOfDay, TimeSource};
use crate::window::Window;

mod canvas;
mod config;
mod face;
mod geometry;
mod hands;
mod layout;
mod renderer;
mod sampler;
mod text;
mod time;
mod vertex;
mod wave;
mod window;

mod gl {
    #![allow(clippy::all, unsafe_op_in_unsafe_fn)]
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

/// Convenience result wrapper.
pub type Result<T> = StdResult<T, Box<dyn Error>>;

fn main() {
    // Setup logging.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Started Horologe");

    if let Err(err) = run() {
        error!("[CRITICAL] {err}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    // Initialize Wayland connection.
    let connection = Connection::connect_to_env()?;
    let (globals, queue) = globals::registry_queue_init(&connection)?;

    // Initialize calloop event loop.
    let mut event_loop = EventLoop::try_new()?;

    // Setup shared state.
    let mut state = State::new(&connection, &globals, queue.handle(), event_loop.handle())?;

    // Insert wayland source into calloop loop.
    let wayland_source = WaylandSource::new(connection, queue);
    wayland_source.insert(event_loop.handle())?;

    // Start event loop.
    while !state.terminated {
        event_loop.dispatch(None, &mut state)?;
    }

    Ok(())
}

/// Wayland protocol handler state.
pub struct State {
    event_loop: LoopHandle<'static, Self>,
    protocol_states: ProtocolStates,
    sampler: Option<Sampler<Self>>,
    terminated: bool,
    time: TimeOfDay,
    config: Config,

    window: Window,
}

impl State {
    fn new(
        connection: &Connection,
        globals: &GlobalList,
        queue: QueueHandle<Self>,
        event_loop: LoopHandle<'static, Self>,
    ) -> Result<Self> {
        let protocol_states = ProtocolStates::new(globals, &queue)?;
        let config = Config::load();

        // Setup the OpenGL display.
        let display = NonNull::new(connection.backend().display_ptr().cast())
            .ok_or("invalid Wayland display")?;
        let raw_display_handle = RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display));
        let egl_display = unsafe { Display::new(raw_display_handle, DisplayApiPreference::Egl)? };

        let window = Window::new(&config, queue, connection.clone(), &protocol_states, egl_display);

        Ok(Self {
            protocol_states,
            event_loop,
            window,
            config,
            time: LocalClock.now(),
            terminated: Default::default(),
            sampler: Default::default(),
        })
    }

    /// Start updating the time, if it isn't running already.
    fn start_sampler(&mut self) {
        if self.sampler.as_ref().is_some_and(Sampler::is_running) {
            return;
        }

        match Sampler::new(&self.event_loop, LocalClock, self.config.clock.interval) {
            Ok(sampler) => self.sampler = Some(sampler),
            Err(err) => error!("Failed to start clock updates: {err}"),
        }
    }

    /// Stop all updates and exit the event loop.
    fn terminate(&mut self) {
        if let Some(mut sampler) = self.sampler.take() {
            sampler.cancel();
        }
        self.terminated = true;
    }
}

impl TimeSink for State {
    fn publish(&mut self, time: TimeOfDay) {
        self.time = time;
        self.window.unstall(&self.config, time);
    }
}

impl ProvidesRegistryState for State {
    registry_handlers![OutputState];

    fn registry(&mut self) -> &mut RegistryState {
        &mut self.protocol_states.registry
    }
}

impl CompositorHandler for State {
    fn scale_factor_changed(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        surface: &WlSurface,
        factor: i32,
    ) {
        if !self.window.owns_surface(surface) {
            return;
        }

        self.window.set_scale_factor(factor);
        self.window.unstall(&self.config, self.time);
    }

    fn transform_changed(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _surface: &WlSurface,
        _transform: Transform,
    ) {
    }

    fn frame(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        surface: &WlSurface,
        _time: u32,
    ) {
        if self.window.owns_surface(surface) {
            self.window.draw(&self.config, self.time);
        }
    }

    fn surface_enter(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _surface: &WlSurface,
        _output: &WlOutput,
    ) {
    }

    fn surface_leave(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _surface: &WlSurface,
        _output: &WlOutput,
    ) {
    }
}

impl OutputHandler for State {
    fn output_state(&mut self) -> &mut OutputState {
        &mut self.protocol_states.output
    }

    fn new_output(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _output: WlOutput,
    ) {
    }

    fn update_output(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _output: WlOutput,
    ) {
    }

    fn output_destroyed(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        _output: WlOutput,
    ) {
    }
}

impl LayerShellHandler for State {
    fn closed(&mut self, _connection: &Connection, _queue: &QueueHandle<Self>, _: &LayerSurface) {
        info!("Clock window closed");
        self.terminate();
    }

    fn configure(
        &mut self,
        _connection: &Connection,
        _queue: &QueueHandle<Self>,
        layer: &LayerSurface,
        configure: LayerSurfaceConfigure,
        _serial: u32,
    ) {
        if !self.window.owns_surface(layer.wl_surface()) {
            return;
        }

        let compositor = &self.protocol_states.compositor;
        self.window.set_size(compositor, configure.new_size.into());

        // Time updates only start once the window can be drawn.
        self.start_sampler();

        self.window.unstall(&self.config, self.time);
    }
}

delegate_compositor!(State);
delegate_output!(State);
delegate_layer!(State);

delegate_registry!(State);

#[derive(Debug)]
struct ProtocolStates {
    compositor: CompositorState,
    registry: RegistryState,
    output: OutputState,
    layer: LayerShell,
}

impl ProtocolStates {
    fn new(globals: &GlobalList, queue: &QueueHandle<State>) -> Result<Self> {
        Ok(Self {
            registry: RegistryState::new(globals),
            compositor: CompositorState::bind(globals, queue)?,
            layer: LayerShell::bind(globals, queue)?,
            output: OutputState::new(globals, queue),
        })
    }
}
