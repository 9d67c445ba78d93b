//! OpenGL rendering.

use std::ffi::{CStr, CString};
use std::mem;
use std::num::NonZeroU32;
use std::ops::Deref;
use std::ptr::{self, NonNull};
use std::sync::Once;

use glutin::config::{Api, ConfigTemplateBuilder};
use glutin::context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext, Version};
use glutin::display::Display;
use glutin::prelude::*;
use glutin::surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::{RawWindowHandle, WaylandWindowHandle};
use resvg::tiny_skia::Pixmap;
use smithay_client_toolkit::reexports::client::Proxy;
use smithay_client_toolkit::reexports::client::protocol::wl_surface::WlSurface;

use crate::Result;
use crate::config::{Color, Font};
use crate::geometry::Size;
use crate::gl;
use crate::gl::types::{GLenum, GLfloat, GLint, GLshort, GLuint};
use crate::text::{GlRasterizer, TextLine};
use crate::vertex::{GlyphVertex, MAX_BATCH_SIZE, VertexBatcher};

const TEXT_VERTEX_SHADER: &str = include_str!("../shaders/text.v.glsl");
const TEXT_FRAGMENT_SHADER: &str = include_str!("../shaders/text.f.glsl");

/// OpenGL renderer.
pub struct Renderer {
    sized: Option<SizedRenderer>,
    surface: WlSurface,
    display: Display,
    font: Font,
}

impl Renderer {
    /// Initialize a new renderer.
    pub fn new(font: &Font, display: Display, surface: WlSurface) -> Self {
        static GL_INIT: Once = Once::new();
        GL_INIT.call_once(|| {
            gl::load_with(|symbol| match CString::new(symbol) {
                Ok(symbol) => display.get_proc_address(symbol.as_c_str()).cast(),
                Err(_) => ptr::null(),
            });
        });

        Renderer { display, surface, font: font.clone(), sized: Default::default() }
    }

    /// Perform drawing with this renderer.
    ///
    /// The `size` is the window's size in physical pixels.
    pub fn draw<F>(&mut self, size: Size<u32>, scale: f64, fun: F) -> Result<()>
    where
        F: FnOnce(&mut SizedRenderer) -> Result<()>,
    {
        let sized = match self.sized {
            Some(ref mut sized) => {
                sized.resize(size)?;
                sized
            },
            None => {
                let sized = SizedRenderer::new(&self.display, &self.surface, size, &self.font)?;
                self.sized.insert(sized)
            },
        };
        sized.make_current()?;
        sized.rasterizer.set_scale_factor(scale);

        // Map pixels to clip space, with the origin in the top-left corner.
        sized.program.bind();
        let [offset_x, offset_y, scale_x, scale_y] = projection(size);
        unsafe {
            gl::Uniform4f(sized.program.projection, offset_x, offset_y, scale_x, scale_y);
            gl::Viewport(0, 0, size.width as i32, size.height as i32);
        }

        fun(sized)?;

        unsafe { gl::Flush() };

        sized.swap_buffers()
    }
}

/// Render state requiring known size.
///
/// This state is initialized on-demand, to avoid Mesa's issue with resizing
/// before the first draw.
pub struct SizedRenderer {
    pub rasterizer: GlRasterizer,
    batcher: VertexBatcher<GlyphVertex>,
    program: TextProgram,
    face: Option<Texture>,

    egl_surface: Surface<WindowSurface>,
    egl_context: PossiblyCurrentContext,

    size: Size<u32>,
}

impl SizedRenderer {
    /// Create sized renderer state.
    fn new(display: &Display, surface: &WlSurface, size: Size<u32>, font: &Font) -> Result<Self> {
        // Create EGL surface and context and make it current.
        let (egl_surface, egl_context) = Self::create_surface(display, surface, size)?;

        let program = TextProgram::new()?;
        let rasterizer = GlRasterizer::new(font, 1.)?;

        unsafe { gl::Enable(gl::BLEND) };

        Ok(Self {
            egl_surface,
            egl_context,
            rasterizer,
            program,
            size,
            batcher: Default::default(),
            face: Default::default(),
        })
    }

    /// Clear the entire window.
    pub fn clear(&self, color: Color) {
        let [r, g, b] = color.as_f32();
        unsafe {
            gl::ClearColor(r, g, b, 1.);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
    }

    /// Draw a CPU-rendered image covering the entire window.
    pub fn draw_face(&mut self, face: &Pixmap) -> Result<()> {
        let width = face.width() as i32;
        let height = face.height() as i32;

        // Reuse the texture while the window size is unchanged.
        let texture = match self.face {
            Some(ref texture) if texture.width == width && texture.height == height => texture,
            _ => &*self.face.insert(Texture::new(width, height)),
        };
        texture.upload_buffer(0, 0, width, height, face.data());

        let bounds = (0, 0, i16::try_from(width)?, i16::try_from(height)?);
        let quad = GlyphVertex::quad(bounds, (0., 0., 1., 1.), true);
        self.batcher.push_quad(texture.id, quad);

        self.flush(Color::new(0, 0, 0));

        Ok(())
    }

    /// Stage a line of text with its baseline origin at `x`/`y`.
    pub fn batch_text(&mut self, line: &TextLine, (mut x, y): (i16, i16)) {
        for glyph in &line.glyphs {
            if let Some(quad) = glyph.vertices(x, y) {
                self.batcher.push_quad(glyph.texture_id, quad);
            }
            x += glyph.advance.0 as i16;
        }
    }

    /// Draw all staged vertices.
    ///
    /// Monochrome glyphs use `text_color`, multicolor textures keep their own
    /// colors.
    pub fn flush(&mut self, text_color: Color) {
        self.program.bind();

        let [r, g, b] = text_color.as_f32();
        unsafe { gl::Uniform3f(self.program.text_color, r, g, b) };

        let mut batches = self.batcher.batches();
        while let Some(batch) = batches.next() {
            batch.draw();
        }
    }

    /// Resize the renderer.
    fn resize(&mut self, size: Size<u32>) -> Result<()> {
        if self.size == size {
            return Ok(());
        }

        let (width, height) = non_zero(size)?;
        self.egl_surface.resize(&self.egl_context, width, height);

        self.size = size;

        Ok(())
    }

    /// Make EGL surface current.
    fn make_current(&self) -> Result<()> {
        Ok(self.egl_context.make_current(&self.egl_surface)?)
    }

    /// Perform OpenGL buffer swap.
    fn swap_buffers(&self) -> Result<()> {
        Ok(self.egl_surface.swap_buffers(&self.egl_context)?)
    }

    /// Create a new EGL surface.
    fn create_surface(
        display: &Display,
        surface: &WlSurface,
        size: Size<u32>,
    ) -> Result<(Surface<WindowSurface>, PossiblyCurrentContext)> {
        let (width, height) = non_zero(size)?;

        // Create EGL config.
        let config_template = ConfigTemplateBuilder::new().with_api(Api::GLES2).build();
        let egl_config = unsafe { display.find_configs(config_template)?.next() }
            .ok_or("no suitable EGL config")?;

        // Create EGL context.
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
            .build(None);
        let egl_context = unsafe { display.create_context(&egl_config, &context_attributes)? };
        let egl_context = egl_context.treat_as_possibly_current();

        let surface = NonNull::new(surface.id().as_ptr().cast()).ok_or("invalid Wayland surface")?;
        let raw_window_handle = RawWindowHandle::Wayland(WaylandWindowHandle::new(surface));
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new()
            .build(raw_window_handle, width, height);

        let egl_surface =
            unsafe { display.create_window_surface(&egl_config, &surface_attributes)? };

        // Ensure rendering never blocks.
        egl_context.make_current(&egl_surface)?;
        egl_surface.set_swap_interval(&egl_context, SwapInterval::DontWait)?;

        Ok((egl_surface, egl_context))
    }
}

/// Shader program for textured quads.
struct TextProgram {
    id: GLuint,
    vao: GLuint,
    vbo: GLuint,
    ebo: GLuint,

    projection: GLint,
    text_color: GLint,
}

impl TextProgram {
    fn new() -> Result<Self> {
        // Create buffer with all possible vertex indices.
        let mut vertex_indices = Vec::with_capacity(MAX_BATCH_SIZE / 4 * 6);
        for index in 0..(MAX_BATCH_SIZE / 4) as u16 {
            let index = index * 4;
            vertex_indices.extend_from_slice(&[index, index + 1, index + 3]);
            vertex_indices.extend_from_slice(&[index + 1, index + 2, index + 3]);
        }

        unsafe {
            let vertex_shader = Shader::new(gl::VERTEX_SHADER, TEXT_VERTEX_SHADER)?;
            let fragment_shader = Shader::new(gl::FRAGMENT_SHADER, TEXT_FRAGMENT_SHADER)?;

            let id = gl::CreateProgram();
            gl::AttachShader(id, *vertex_shader);
            gl::AttachShader(id, *fragment_shader);
            gl::BindAttribLocation(id, 0, c"aVertexPosition".as_ptr());
            gl::BindAttribLocation(id, 1, c"aTexCoord".as_ptr());
            gl::BindAttribLocation(id, 2, c"aFlags".as_ptr());
            gl::LinkProgram(id);

            let mut linked = 0;
            gl::GetProgramiv(id, gl::LINK_STATUS, &mut linked);
            if linked == 0 {
                gl::DeleteProgram(id);
                return Err("text shader linking failed".into());
            }
            gl::UseProgram(id);

            let projection = uniform_location(id, c"uProjection");
            let text_color = uniform_location(id, c"uTextColor");
            gl::Uniform1i(uniform_location(id, c"uAtlas"), 0);

            let mut vao = 0;
            gl::GenVertexArraysOES(1, &mut vao);
            gl::BindVertexArrayOES(vao);

            let mut ebo = 0;
            gl::GenBuffers(1, &mut ebo);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, ebo);
            gl::BufferData(
                gl::ELEMENT_ARRAY_BUFFER,
                (vertex_indices.len() * mem::size_of::<u16>()) as isize,
                vertex_indices.as_ptr() as *const _,
                gl::STATIC_DRAW,
            );

            let mut vbo = 0;
            gl::GenBuffers(1, &mut vbo);
            gl::BindBuffer(gl::ARRAY_BUFFER, vbo);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                (MAX_BATCH_SIZE * mem::size_of::<GlyphVertex>()) as isize,
                ptr::null(),
                gl::STREAM_DRAW,
            );

            let stride = mem::size_of::<GlyphVertex>() as i32;

            // Pixel position.
            let mut offset = 0;
            gl::VertexAttribPointer(0, 2, gl::SHORT, gl::FALSE, stride, offset as *const _);
            gl::EnableVertexAttribArray(0);
            offset += 2 * mem::size_of::<GLshort>();

            // UV position.
            gl::VertexAttribPointer(1, 2, gl::FLOAT, gl::FALSE, stride, offset as *const _);
            gl::EnableVertexAttribArray(1);
            offset += 2 * mem::size_of::<GLfloat>();

            // Multicolor flag.
            gl::VertexAttribPointer(2, 1, gl::FLOAT, gl::FALSE, stride, offset as *const _);
            gl::EnableVertexAttribArray(2);

            Ok(Self { id, vao, vbo, ebo, projection, text_color })
        }
    }

    /// Make this program active for drawing.
    fn bind(&self) {
        unsafe {
            gl::UseProgram(self.id);
            gl::BindVertexArrayOES(self.vao);
            gl::BindBuffer(gl::ELEMENT_ARRAY_BUFFER, self.ebo);
            gl::BindBuffer(gl::ARRAY_BUFFER, self.vbo);
            gl::BlendFunc(gl::SRC1_COLOR_EXT, gl::ONE_MINUS_SRC1_COLOR_EXT);
        }
    }
}

impl Drop for TextProgram {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteBuffers(1, &self.vbo);
            gl::DeleteBuffers(1, &self.ebo);
            gl::DeleteVertexArraysOES(1, &self.vao);
            gl::DeleteProgram(self.id);
        }
    }
}

struct Shader {
    id: GLuint,
}

impl Deref for Shader {
    type Target = GLuint;

    fn deref(&self) -> &Self::Target {
        &self.id
    }
}

impl Shader {
    fn new(shader_type: GLenum, source: &str) -> Result<Self> {
        unsafe {
            let id = gl::CreateShader(shader_type);
            gl::ShaderSource(
                id,
                1,
                [source.as_ptr()].as_ptr() as *const _,
                &(source.len() as i32) as *const _,
            );
            gl::CompileShader(id);

            // Wrap immediately, so the shader is deleted on error.
            let shader = Self { id };

            let mut compiled = 0;
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut compiled);
            if compiled == 0 {
                return Err(format!("shader compilation failed for type {shader_type:#x}").into());
            }

            Ok(shader)
        }
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe { gl::DeleteShader(self.id) };
    }
}

/// OpenGL texture.
pub struct Texture {
    pub id: GLuint,
    pub width: i32,
    pub height: i32,
}

impl Texture {
    /// Create a new texture.
    pub fn new(width: i32, height: i32) -> Self {
        let mut id = 0;
        unsafe {
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::GenTextures(1, &mut id);
            gl::BindTexture(gl::TEXTURE_2D, id);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA as i32,
                width,
                height,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                ptr::null(),
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }

        Self { id, width, height }
    }

    /// Upload an RGBA buffer to a region of the texture.
    pub fn upload_buffer(&self, x: i32, y: i32, width: i32, height: i32, buffer: &[u8]) {
        debug_assert_eq!(width as usize * height as usize * 4, buffer.len());

        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.id);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                x,
                y,
                width,
                height,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                buffer.as_ptr() as *const _,
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            gl::DeleteTextures(1, &self.id);
        }
    }
}

/// Look up a uniform by name.
fn uniform_location(program: GLuint, name: &CStr) -> GLint {
    unsafe { gl::GetUniformLocation(program, name.as_ptr()) }
}

/// Pixel to clip space projection as `[offset_x, offset_y, scale_x, scale_y]`.
fn projection(size: Size<u32>) -> [f32; 4] {
    [-1., 1., 2. / size.width as f32, -2. / size.height as f32]
}

/// Convert a surface size to EGL dimensions.
fn non_zero(size: Size<u32>) -> Result<(NonZeroU32, NonZeroU32)> {
    match (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
        (Some(width), Some(height)) => Ok((width, height)),
        _ => Err(format!("invalid surface size {}x{}", size.width, size.height).into()),
    }
}
