//! Bitmap fonts: a texture atlas plus per-glyph metrics.

use crate::{FontError, FontResult, Texture};
use glam::Vec2;
use pyxis_core::{
    alloc::HashMap,
    geometry::{Rect, Size},
};

/// Placement of one character inside the font texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Source rectangle in texels.
    pub source: Rect<f32>,
    /// Offset from the pen position to the glyph's top-left corner.
    pub offset: Vec2,
    /// Horizontal pen advance after drawing the glyph.
    pub advance: f32,
}

impl Glyph {
    pub fn new(source: Rect<f32>, offset: Vec2, advance: f32) -> Self {
        Self {
            source,
            offset,
            advance,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BitmapFont {
    name: String,
    texture: Texture,
    line_height: f32,
    glyphs: HashMap<char, Glyph>,
}

impl BitmapFont {
    pub fn new(name: impl Into<String>, texture: Texture, line_height: f32) -> Self {
        Self {
            name: name.into(),
            texture,
            line_height,
            glyphs: HashMap::default(),
        }
    }

    /// Register a glyph, replacing any previous glyph for `character`.
    pub fn add_glyph(&mut self, character: char, glyph: Glyph) -> FontResult<()> {
        let (width, height) = (self.texture.width() as f32, self.texture.height() as f32);
        let source = glyph.source;
        if source.x < 0.0
            || source.y < 0.0
            || source.x + source.width > width
            || source.y + source.height > height
        {
            return Err(FontError::GlyphOutOfBounds { character });
        }
        self.glyphs.insert(character, glyph);
        Ok(())
    }

    /// Build a monospaced font from a uniform grid of cells.
    ///
    /// Cells are read left-to-right, top-to-bottom with `padding` texels
    /// between them, assigning consecutive code points starting at
    /// `first_char`.
    pub fn from_grid(
        name: impl Into<String>,
        texture: Texture,
        cell: Size<u32>,
        padding: u32,
        first_char: char,
        count: u32,
    ) -> FontResult<Self> {
        let texture_size = texture.size();
        let columns = (texture_size.width + padding) / (cell.width + padding).max(1);
        let rows = (texture_size.height + padding) / (cell.height + padding).max(1);
        if cell.width == 0 || cell.height == 0 || columns == 0 || rows == 0 {
            return Err(FontError::InvalidGrid {
                cell_width: cell.width,
                cell_height: cell.height,
                texture_width: texture_size.width,
                texture_height: texture_size.height,
            });
        }

        let capacity = columns * rows;
        if count > capacity {
            return Err(FontError::TooManyGlyphs {
                requested: count,
                capacity,
            });
        }

        let mut font = Self::new(name, texture, cell.height as f32);
        for i in 0..count {
            // Code points that land in the surrogate range have no glyph.
            let Some(character) = char::from_u32(first_char as u32 + i) else {
                continue;
            };
            let x = (i % columns) * (cell.width + padding);
            let y = (i / columns) * (cell.height + padding);
            let source = Rect::new(x as f32, y as f32, cell.width as f32, cell.height as f32);
            font.add_glyph(character, Glyph::new(source, Vec2::ZERO, cell.width as f32))?;
        }

        tracing::debug!(font = %font.name, glyphs = font.glyphs.len(), "built grid font");
        Ok(font)
    }

    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs.get(&character)
    }

    /// Normalized texture coordinates of a glyph's source rectangle.
    pub fn glyph_uv(&self, glyph: &Glyph) -> Rect<f32> {
        debug_assert!(
            self.texture.width() > 0 && self.texture.height() > 0,
            "font '{}' has an empty {}x{} atlas",
            self.name,
            self.texture.width(),
            self.texture.height()
        );
        let (width, height) = (self.texture.width() as f32, self.texture.height() as f32);
        Rect::new(
            glyph.source.x / width,
            glyph.source.y / height,
            glyph.source.width / width,
            glyph.source.height / height,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyxis_test_utils::MockRenderContext;

    fn atlas(width: u32, height: u32) -> Texture {
        Texture::new(&MockRenderContext::new(), "atlas", width, height)
    }

    #[test]
    fn grid_assigns_consecutive_characters() {
        let font =
            BitmapFont::from_grid("mono", atlas(64, 32), Size::new(8, 16), 0, 'A', 10).unwrap();

        assert_eq!(font.glyph_count(), 10);
        assert_eq!(font.line_height(), 16.0);
        let j = font.glyph('J').unwrap();
        assert_eq!(j.source, Rect::new(8.0, 16.0, 8.0, 16.0));
        assert_eq!(j.advance, 8.0);
        assert!(font.glyph('K').is_none());
    }

    #[test]
    fn grid_respects_padding() {
        let font = BitmapFont::from_grid("pad", atlas(20, 8), Size::new(8, 8), 4, '0', 2).unwrap();
        assert_eq!(font.glyph('1').unwrap().source.x, 12.0);
    }

    #[test]
    fn grid_rejects_bad_cells() {
        let err = BitmapFont::from_grid("x", atlas(4, 4), Size::new(8, 8), 0, 'a', 1).unwrap_err();
        assert!(matches!(err, FontError::InvalidGrid { cell_width: 8, .. }));

        let err = BitmapFont::from_grid("x", atlas(16, 8), Size::new(8, 8), 0, 'a', 3).unwrap_err();
        assert_eq!(
            err,
            FontError::TooManyGlyphs {
                requested: 3,
                capacity: 2
            }
        );
    }

    #[test]
    fn add_glyph_checks_bounds() {
        let mut font = BitmapFont::new("manual", atlas(16, 16), 16.0);
        let err = font
            .add_glyph('x', Glyph::new(Rect::new(10.0, 0.0, 8.0, 8.0), Vec2::ZERO, 8.0))
            .unwrap_err();
        assert_eq!(err, FontError::GlyphOutOfBounds { character: 'x' });
    }

    #[test]
    fn glyph_uv_is_normalized() {
        let font = BitmapFont::from_grid("mono", atlas(32, 16), Size::new(8, 8), 0, 'a', 8).unwrap();
        let uv = font.glyph_uv(font.glyph('b').unwrap());
        assert_eq!(uv, Rect::new(0.25, 0.0, 0.25, 0.5));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has an empty 0x8 atlas")]
    fn glyph_uv_rejects_empty_atlas() {
        let font = BitmapFont::new("empty", atlas(0, 8), 8.0);
        let glyph = Glyph::new(Rect::new(0.0, 0.0, 0.0, 0.0), Vec2::ZERO, 0.0);
        font.glyph_uv(&glyph);
    }
}
