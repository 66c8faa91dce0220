use std::fmt;

/// Errors raised while creating a [`GraphicsContext`](crate::GraphicsContext).
#[derive(Debug)]
pub enum GraphicsError {
    /// No adapter matched the requested backends and power preference.
    NoAdapter,
    /// The adapter refused the device request.
    DeviceCreation(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::NoAdapter => write!(f, "no suitable GPU adapter found"),
            GraphicsError::DeviceCreation(msg) => write!(f, "failed to create GPU device: {}", msg),
        }
    }
}

impl std::error::Error for GraphicsError {}

pub type GraphicsResult<T> = Result<T, GraphicsError>;

/// Errors raised while building a [`BitmapFont`](crate::BitmapFont).
#[derive(Debug, Clone, PartialEq)]
pub enum FontError {
    /// The grid cell does not fit the texture even once.
    InvalidGrid {
        cell_width: u32,
        cell_height: u32,
        texture_width: u32,
        texture_height: u32,
    },
    /// More glyphs were requested than the grid holds.
    TooManyGlyphs { requested: u32, capacity: u32 },
    /// A glyph's source rectangle reaches outside the font texture.
    GlyphOutOfBounds { character: char },
}

impl fmt::Display for FontError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontError::InvalidGrid {
                cell_width,
                cell_height,
                texture_width,
                texture_height,
            } => write!(
                f,
                "glyph cell {}x{} does not fit a {}x{} texture",
                cell_width, cell_height, texture_width, texture_height
            ),
            FontError::TooManyGlyphs {
                requested,
                capacity,
            } => write!(
                f,
                "{} glyphs requested but the grid only holds {}",
                requested, capacity
            ),
            FontError::GlyphOutOfBounds { character } => {
                write!(f, "glyph {:?} lies outside the font texture", character)
            }
        }
    }
}

impl std::error::Error for FontError {}

pub type FontResult<T> = Result<T, FontError>;
