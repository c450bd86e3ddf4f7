use std::path::Path;

use crate::AssetError;

/// Decoded RGBA8 image, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidTexture(format!(
                "zero-sized texture {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(AssetError::InvalidTexture(format!(
                "{width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let texture = Self::decode(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            width = texture.width,
            height = texture.height,
            "decoded texture"
        );
        Ok(texture)
    }

    /// Single-colour texture.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self::from_fn(width, height, |_, _| color)
    }

    /// Two-colour checkerboard with square cells of `cell` pixels.
    pub fn checker(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        Self::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 { a } else { b }
        })
    }

    /// Horizontal stripes alternating between `color` and fully transparent.
    pub fn stripes(size: u32, stripe: u32, color: [u8; 4]) -> Self {
        let stripe = stripe.max(1);
        Self::from_fn(size, size, |_, y| {
            if (y / stripe) % 2 == 0 {
                color
            } else {
                [0, 0, 0, 0]
            }
        })
    }

    /// Square atlas of `rows * rows` flat cells, filled row-major from
    /// `colors` (cycled if fewer colours than cells are given).
    pub fn atlas(cell_size: u32, rows: u32, colors: &[[u8; 4]]) -> Self {
        let rows = rows.max(1);
        let cell_size = cell_size.max(1);
        let size = cell_size * rows;
        Self::from_fn(size, size, |x, y| {
            if colors.is_empty() {
                return [255, 0, 255, 255];
            }
            let cell = (y / cell_size) * rows + x / cell_size;
            colors[cell as usize % colors.len()]
        })
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.rgba.chunks_exact(4).any(|px| px[3] < 255)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }

    fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&f(x, y));
            }
        }
        Self {
            width,
            height,
            rgba,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];

    #[test]
    fn new_checks_length() {
        assert!(TextureData::new(2, 2, vec![0; 16]).is_ok());
        assert!(TextureData::new(2, 2, vec![0; 15]).is_err());
        assert!(TextureData::new(0, 2, vec![]).is_err());
    }

    #[test]
    fn checker_alternates() {
        let t = TextureData::checker(4, 2, RED, BLUE);
        assert_eq!(t.pixel(0, 0), Some(RED));
        assert_eq!(t.pixel(2, 0), Some(BLUE));
        assert_eq!(t.pixel(2, 2), Some(RED));
        assert_eq!(t.pixel(4, 0), None);
        assert!(!t.has_alpha());
    }

    #[test]
    fn stripes_are_transparent() {
        let t = TextureData::stripes(4, 1, RED);
        assert!(t.has_alpha());
        assert_eq!(t.pixel(0, 1).map(|p| p[3]), Some(0));
    }

    #[test]
    fn atlas_cells_are_row_major() {
        let colors = [RED, BLUE, [0, 255, 0, 255], [9, 9, 9, 255]];
        let t = TextureData::atlas(8, 2, &colors);
        assert_eq!((t.width, t.height), (16, 16));
        assert_eq!(t.pixel(0, 0), Some(colors[0]));
        assert_eq!(t.pixel(8, 0), Some(colors[1]));
        assert_eq!(t.pixel(0, 8), Some(colors[2]));
        assert_eq!(t.pixel(15, 15), Some(colors[3]));
    }

    #[test]
    fn decode_png_round_trip_through_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("px.png");
        let img = image::RgbaImage::from_raw(1, 1, vec![1, 2, 3, 255]).unwrap();
        img.save(&path).unwrap();
        let t = TextureData::open(&path).unwrap();
        assert_eq!(t.pixel(0, 0), Some([1, 2, 3, 255]));
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(matches!(
            TextureData::decode(b"not an image"),
            Err(AssetError::Image(_))
        ));
    }
}
