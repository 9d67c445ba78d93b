//! Glyph rasterization and atlas caching.

use std::borrow::Cow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::{cmp, mem};

use crossfont::{
    BitmapBuffer, FontDesc, FontKey, GlyphKey, Metrics, Rasterize, RasterizedGlyph, Rasterizer,
    Size as FontSize, Slant, Style, Weight,
};
use tracing::debug;

use crate::Result;
use crate::config::Font;
use crate::geometry::Rect;
use crate::gl::types::GLuint;
use crate::renderer::Texture;

/// Width and height of every glyph atlas texture.
///
/// GLES2 only guarantees 2048, but 4096 is supported by all mobile GPUs we
/// care about.
const ATLAS_SIZE: i32 = 4096;

/// Glyph rasterizer backed by OpenGL textures.
pub struct GlRasterizer {
    cache: HashMap<char, GlSubTexture>,
    atlas: Atlas,

    metrics: Option<Metrics>,
    rasterizer: Rasterizer,
    family: String,
    size: FontSize,
    font: FontKey,

    scale_factor: f64,
}

impl GlRasterizer {
    pub fn new(font: &Font, scale_factor: f64) -> Result<Self> {
        let size = FontSize::new(font.size);
        let mut rasterizer = Rasterizer::new()?;
        let font_key = Self::load_font(&mut rasterizer, &font.family, size, scale_factor)?;

        Ok(Self {
            scale_factor,
            rasterizer,
            size,
            family: font.family.clone(),
            font: font_key,
            metrics: Default::default(),
            atlas: Default::default(),
            cache: Default::default(),
        })
    }

    /// Update the DPI scale factor.
    ///
    /// This drops all cached glyphs when the factor changed.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if self.scale_factor == scale_factor {
            return;
        }
        self.scale_factor = scale_factor;

        // Keep the old font if the new size fails to load.
        self.font = Self::load_font(&mut self.rasterizer, &self.family, self.size, scale_factor)
            .unwrap_or(self.font);

        self.atlas = Atlas::default();
        self.cache = HashMap::new();
        self.metrics = None;
    }

    /// Rasterize all glyphs of a single line of text.
    ///
    /// Glyph advances include kerning. Rasterization stops at the first glyph
    /// which cannot be rasterized.
    pub fn rasterize_line(&mut self, text: &str) -> TextLine {
        let mut line = TextLine::default();

        let mut last_key = self.glyph_key(' ');
        for c in text.chars() {
            let mut glyph = match self.rasterize_char(c) {
                Ok(glyph) => glyph,
                Err(_) => break,
            };

            let previous_key = mem::replace(&mut last_key, self.glyph_key(c));
            let kerning = self.rasterizer.kerning(previous_key, last_key);
            glyph.advance.0 += kerning.0 as i32;
            glyph.advance.1 += kerning.1 as i32;

            line.width += glyph.advance.0;
            line.glyphs.push(glyph);
        }

        line
    }

    /// Get rasterized OpenGL glyph.
    pub fn rasterize_char(&mut self, character: char) -> Result<GlSubTexture> {
        let glyph_key = self.glyph_key(character);

        let entry = match self.cache.entry(character) {
            Entry::Occupied(entry) => return Ok(*entry.get()),
            Entry::Vacant(entry) => entry,
        };

        let rasterized_glyph = self.rasterizer.get_glyph(glyph_key)?;
        let glyph = self.atlas.insert(&rasterized_glyph)?;

        Ok(*entry.insert(glyph))
    }

    /// Get font metrics.
    pub fn metrics(&mut self) -> Result<Metrics> {
        if let Some(metrics) = self.metrics {
            return Ok(metrics);
        }

        // Metrics are only available once a glyph was loaded.
        if let Err(err) = self.rasterize_char(' ') {
            debug!("Failed to load glyph for font metrics: {err}");
        }
        let metrics = self.rasterizer.metrics(self.font, self.font_size())?;
        Ok(*self.metrics.insert(metrics))
    }

    fn glyph_key(&self, character: char) -> GlyphKey {
        GlyphKey { font_key: self.font, size: self.font_size(), character }
    }

    fn load_font(
        rasterizer: &mut Rasterizer,
        family: &str,
        size: FontSize,
        scale_factor: f64,
    ) -> Result<FontKey> {
        let style = Style::Description { slant: Slant::Normal, weight: Weight::Normal };
        let desc = FontDesc::new(family, style);
        Ok(rasterizer.load_font(&desc, size.scale(scale_factor as f32))?)
    }

    /// Font size with the scale factor applied.
    fn font_size(&self) -> FontSize {
        self.size.scale(self.scale_factor as f32)
    }
}

/// Rasterized line of text.
#[derive(Default, Debug)]
pub struct TextLine {
    pub glyphs: Vec<GlSubTexture>,
    /// Sum of all glyph advances.
    pub width: i32,
}

impl TextLine {
    /// Origin which centers this line inside `rect`.
    ///
    /// The returned Y coordinate is the text's baseline.
    pub fn centered_origin(&self, rect: Rect, metrics: &Metrics) -> (i16, i16) {
        let x = rect.origin.x as f64 + (rect.size.width as f64 - self.width as f64) / 2.;
        let y = rect.origin.y as f64
            + (rect.size.height as f64 - metrics.line_height) / 2.
            + metrics.line_height
            + metrics.descent as f64;
        (x.round() as i16, y.round() as i16)
    }
}

/// Atlas combining multiple glyphs in OpenGL textures.
///
/// Glyphs are placed left to right in rows as tall as their tallest glyph. A
/// new texture is started once a row exceeds the texture's height.
pub struct Atlas {
    textures: Vec<Texture>,
    row_height: i32,
    cursor_x: i32,
    cursor_y: i32,
}

impl Default for Atlas {
    fn default() -> Self {
        Self {
            textures: vec![Texture::new(ATLAS_SIZE, ATLAS_SIZE)],
            row_height: Default::default(),
            cursor_x: Default::default(),
            cursor_y: Default::default(),
        }
    }
}

impl Atlas {
    /// Insert a glyph into the atlas.
    fn insert<'a, E: Into<AtlasEntry<'a>>>(&mut self, entry: E) -> Result<GlSubTexture> {
        let entry = entry.into();

        if entry.width > ATLAS_SIZE || entry.height > ATLAS_SIZE {
            return Err("glyph too big for atlas".into());
        }

        // Start a new row.
        if self.cursor_x + entry.width > ATLAS_SIZE {
            self.cursor_y += mem::take(&mut self.row_height);
            self.cursor_x = 0;
        }

        // Start a new texture.
        if self.cursor_y + entry.height > ATLAS_SIZE {
            self.textures.push(Texture::new(ATLAS_SIZE, ATLAS_SIZE));
            self.row_height = 0;
            self.cursor_x = 0;
            self.cursor_y = 0;
        }

        let texture = &self.textures[self.textures.len() - 1];
        let (x, y) = (self.cursor_x, self.cursor_y);
        texture.upload_buffer(x, y, entry.width, entry.height, &entry.buffer);

        let subtexture = GlSubTexture {
            uv_bot: self.cursor_y as f32 / ATLAS_SIZE as f32,
            uv_left: self.cursor_x as f32 / ATLAS_SIZE as f32,
            uv_height: entry.height as f32 / ATLAS_SIZE as f32,
            uv_width: entry.width as f32 / ATLAS_SIZE as f32,
            multicolor: entry.multicolor,
            texture_id: texture.id,
            advance: entry.advance,
            height: entry.height as i16,
            width: entry.width as i16,
            left: entry.left as i16,
            top: entry.top as i16,
        };

        self.row_height = cmp::max(self.row_height, entry.height);
        self.cursor_x += entry.width;

        Ok(subtexture)
    }
}

/// Subtexture cached inside an [`Atlas`].
#[derive(Copy, Clone, Debug)]
pub struct GlSubTexture {
    pub texture_id: GLuint,
    pub multicolor: bool,
    pub top: i16,
    pub left: i16,
    pub width: i16,
    pub height: i16,
    pub uv_bot: f32,
    pub uv_left: f32,
    pub uv_width: f32,
    pub uv_height: f32,
    pub advance: (i32, i32),
}

/// Element stored in the texture atlas.
struct AtlasEntry<'a> {
    buffer: Cow<'a, [u8]>,
    width: i32,
    height: i32,
    top: i32,
    left: i32,
    advance: (i32, i32),
    multicolor: bool,
}

impl<'a> From<&'a RasterizedGlyph> for AtlasEntry<'a> {
    fn from(glyph: &'a RasterizedGlyph) -> Self {
        let (buffer, multicolor) = match &glyph.buffer {
            BitmapBuffer::Rgb(buffer) => (Cow::Owned(rgb_to_rgba(buffer)), false),
            BitmapBuffer::Rgba(buffer) => (Cow::Borrowed(buffer.as_slice()), true),
        };

        Self {
            multicolor,
            buffer,
            width: glyph.width,
            height: glyph.height,
            top: glyph.top,
            left: glyph.left,
            advance: glyph.advance,
        }
    }
}

/// Convert subpixel coverage to an opaque RGBA buffer.
fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    debug_assert_eq!(rgb.len() % 3, 0);

    let mut rgba = vec![255; rgb.len() / 3 * 4];
    for (rgb, rgba) in rgb.chunks_exact(3).zip(rgba.chunks_exact_mut(4)) {
        rgba[..3].copy_from_slice(rgb);
    }

    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(line_height: f64, descent: f32) -> Metrics {
        Metrics {
            average_advance: 10.,
            line_height,
            descent,
            underline_position: 0.,
            underline_thickness: 0.,
            strikeout_position: 0.,
            strikeout_thickness: 0.,
        }
    }

    #[test]
    fn rgba_conversion() {
        let rgba = rgb_to_rgba(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(rgba, [1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(rgb_to_rgba(&[]).is_empty());
    }

    #[test]
    fn centered_line() {
        let line = TextLine { glyphs: Vec::new(), width: 20 };
        let rect = Rect::new(100., 50., 60., 40.);

        // Baseline sits one line height minus descent below the line's top.
        let (x, y) = line.centered_origin(rect, &metrics(20., -4.));
        assert_eq!((x, y), (120, 76));
    }

    #[test]
    fn overflowing_line() {
        let line = TextLine { glyphs: Vec::new(), width: 80 };
        let (x, _) = line.centered_origin(Rect::new(0., 0., 60., 40.), &metrics(20., -4.));
        assert_eq!(x, -10);
    }
}
