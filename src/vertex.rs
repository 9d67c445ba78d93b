//! OpenGL vertex batching.

use std::{cmp, mem, ptr};

use crate::gl;
use crate::gl::types::GLuint;
use crate::text::GlSubTexture;

/// Maximum vertices drawn in a single batch.
///
/// This is the closest number to `u16::MAX` dividable by the 4 vertices of a
/// quad, since that's the maximum possible index in `glDrawElements` in
/// GLES2.
pub const MAX_BATCH_SIZE: usize = (u16::MAX - u16::MAX % 4) as usize;

/// Batch vertices by texture ID.
///
/// Groups together quads with the same texture ID into a rendering batch and
/// limits the maximum size of each batch.
pub struct VertexBatcher<V> {
    texture_ids: Vec<GLuint>,
    vertices: Vec<V>,
}

impl<V> Default for VertexBatcher<V> {
    fn default() -> Self {
        Self { texture_ids: Vec::new(), vertices: Vec::new() }
    }
}

impl<V> VertexBatcher<V> {
    /// Add all vertices of a quad to the batcher.
    pub fn push_quad(&mut self, texture_id: GLuint, quad: [V; 4]) {
        for vertex in quad {
            self.texture_ids.push(texture_id);
            self.vertices.push(vertex);
        }
    }

    /// Get all vertex batches.
    pub fn batches(&mut self) -> VertexBatches<'_, V> {
        sort_quads(&mut self.texture_ids, &mut self.vertices);

        VertexBatches {
            texture_ids: &mut self.texture_ids,
            vertices: &mut self.vertices,
            offset: 0,
        }
    }
}

/// Iterator over batched vertex groups.
///
/// All pending vertices are discarded once this is dropped.
pub struct VertexBatches<'a, V> {
    texture_ids: &'a mut Vec<GLuint>,
    vertices: &'a mut Vec<V>,
    offset: usize,
}

impl<V> Drop for VertexBatches<'_, V> {
    fn drop(&mut self) {
        self.texture_ids.clear();
        self.vertices.clear();
    }
}

impl<V> VertexBatches<'_, V> {
    /// Get the next vertex batch.
    pub fn next(&mut self) -> Option<VertexBatch<'_, V>> {
        let vertex_count = self.vertices.len();
        if self.offset >= vertex_count {
            return None;
        }

        // Group vertices with identical texture ID, up to `MAX_BATCH_SIZE`.
        let texture_id = self.texture_ids[self.offset];
        let max_end = cmp::min(vertex_count, self.offset + MAX_BATCH_SIZE);
        let batch_size = self.texture_ids[self.offset..max_end]
            .iter()
            .position(|id| id != &texture_id)
            .unwrap_or(max_end - self.offset);
        let batch_end = self.offset + batch_size;

        let old_offset = mem::replace(&mut self.offset, batch_end);

        Some(VertexBatch { vertices: &self.vertices[old_offset..self.offset], texture_id })
    }
}

/// Batch of vertices with consistent texture ID.
pub struct VertexBatch<'a, V> {
    texture_id: GLuint,
    vertices: &'a [V],
}

impl<V> VertexBatch<'_, V> {
    /// Render this batch.
    ///
    /// The program's vertex and index buffers must be bound already.
    pub fn draw(&self) {
        let vertex_count = self.vertices.len();
        unsafe {
            gl::BindTexture(gl::TEXTURE_2D, self.texture_id);

            gl::BufferSubData(
                gl::ARRAY_BUFFER,
                0,
                (vertex_count * mem::size_of::<V>()) as isize,
                self.vertices.as_ptr() as *const _,
            );

            let num_indices = (vertex_count / 4 * 6) as i32;
            gl::DrawElements(gl::TRIANGLES, num_indices, gl::UNSIGNED_SHORT, ptr::null());
        }
    }
}

impl GlSubTexture {
    /// OpenGL vertices for this subtexture with its origin at `x`/`y`.
    pub fn vertices(&self, x: i16, y: i16) -> Option<[GlyphVertex; 4]> {
        if self.width == 0 || self.height == 0 {
            return None;
        }

        let x = x + self.left;
        let y = y - self.top;

        Some(GlyphVertex::quad(
            (x, y, self.width, self.height),
            (self.uv_left, self.uv_bot, self.uv_width, self.uv_height),
            self.multicolor,
        ))
    }
}

/// Textured vertex.
#[repr(C)]
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct GlyphVertex {
    // Vertex position.
    pub x: i16,
    pub y: i16,

    // Offsets into the texture.
    pub u: f32,
    pub v: f32,

    // Vertex flags.
    pub flags: f32,
}

impl GlyphVertex {
    /// Vertices of a textured rectangle.
    ///
    /// Both the position and UV rectangles are `(left, top, width, height)`.
    /// Multicolor textures are drawn with their own colors, instead of being
    /// used as mask for the text color.
    pub fn quad(
        (x, y, width, height): (i16, i16, i16, i16),
        (u, v, uv_width, uv_height): (f32, f32, f32, f32),
        multicolor: bool,
    ) -> [Self; 4] {
        let flags = if multicolor { 1. } else { 0. };

        let bottom_left = Self { x, y: y + height, u, v: v + uv_height, flags };
        let top_left = Self { x, y, u, v, flags };
        let top_right = Self { x: x + width, y, u: u + uv_width, v, flags };
        let bottom_right =
            Self { x: x + width, y: y + height, u: u + uv_width, v: v + uv_height, flags };

        [bottom_left, top_left, top_right, bottom_right]
    }
}

/// Stable insertion sort of quads by texture ID.
///
/// This will use `ids` as a discriminant for sorting and perform the same
/// permutations on `vertices`, moving all 4 vertices of a quad together.
fn sort_quads<T>(ids: &mut [GLuint], vertices: &mut [T]) {
    let quads = ids.len() / 4;
    for i in 1..quads {
        let mut j = i;
        while j > 0 && ids[(j - 1) * 4] > ids[j * 4] {
            for k in 0..4 {
                ids.swap((j - 1) * 4 + k, j * 4 + k);
                vertices.swap((j - 1) * 4 + k, j * 4 + k);
            }
            j -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(tag: i16) -> [GlyphVertex; 4] {
        GlyphVertex::quad((tag, 0, 1, 1), (0., 0., 1., 1.), false)
    }

    #[test]
    fn quad_corners() {
        let [bottom_left, top_left, top_right, bottom_right] =
            GlyphVertex::quad((10, 20, 30, 40), (0.5, 0.25, 0.5, 0.75), true);

        assert_eq!((bottom_left.x, bottom_left.y), (10, 60));
        assert_eq!((top_left.x, top_left.y), (10, 20));
        assert_eq!((top_right.x, top_right.y), (40, 20));
        assert_eq!((bottom_right.x, bottom_right.y), (40, 60));

        assert_eq!((top_left.u, top_left.v), (0.5, 0.25));
        assert_eq!((bottom_right.u, bottom_right.v), (1., 1.));
        assert_eq!(top_left.flags, 1.);
    }

    #[test]
    fn batches_group_textures() {
        let mut batcher = VertexBatcher::default();
        batcher.push_quad(2, quad(0));
        batcher.push_quad(1, quad(1));
        batcher.push_quad(2, quad(2));

        let mut batches = batcher.batches();

        let batch = batches.next().unwrap();
        assert_eq!(batch.texture_id, 1);
        assert_eq!(batch.vertices, quad(1));

        let batch = batches.next().unwrap();
        assert_eq!(batch.texture_id, 2);
        assert_eq!(batch.vertices.len(), 8);
        assert_eq!(batch.vertices[..4], quad(0));
        assert_eq!(batch.vertices[4..], quad(2));

        assert!(batches.next().is_none());
        drop(batches);

        // Drawn vertices are discarded.
        assert!(batcher.batches().next().is_none());
    }

    #[test]
    fn batches_are_limited() {
        let mut batcher = VertexBatcher::default();
        for _ in 0..MAX_BATCH_SIZE / 4 + 1 {
            batcher.push_quad(1, quad(0));
        }

        let mut batches = batcher.batches();
        assert_eq!(batches.next().unwrap().vertices.len(), MAX_BATCH_SIZE);
        assert_eq!(batches.next().unwrap().vertices.len(), 4);
        assert!(batches.next().is_none());
    }

    #[test]
    fn empty_batcher() {
        let mut batcher = VertexBatcher::<GlyphVertex>::default();
        assert!(batcher.batches().next().is_none());
    }
}
