//! Object-index encoding for the pick pass and decoding of pick texels.
//!
//! Encoding: before each model group the pick program is loaded with
//! object index `0`; before each instance it gets the next value of a
//! 1-based running counter. The counter advances in the same traversal
//! order as [`crate::BatchMap::instances`], so `object_id - 1` is a flat
//! index into that order.

/// Errors from the pick target.
#[derive(Debug, thiserror::Error)]
pub enum PickBufferError {
    #[error("pick target incomplete at {width}x{height}: {reason}")]
    Incomplete {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("pixel ({x}, {y}) outside {width}x{height} pick target")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("pick readback failed: {0}")]
    Readback(String),
}

/// Identity written by the pick pass at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PickedPixel {
    /// 1-based object index, `0` for background.
    pub object_id: u32,
    /// Ordinal of the model group the object was drawn in.
    pub draw_id: u32,
    pub prim_id: u32,
}

impl PickedPixel {
    pub const BACKGROUND: Self = Self {
        object_id: 0,
        draw_id: 0,
        prim_id: 0,
    };

    /// Decode a float RGB texel. Channels hold small integers exactly.
    pub fn from_texel(texel: [f32; 3]) -> Self {
        let decode = |v: f32| if v.is_finite() && v > 0.0 { v.round() as u32 } else { 0 };
        Self {
            object_id: decode(texel[0]),
            draw_id: decode(texel[1]),
            prim_id: decode(texel[2]),
        }
    }

    pub fn to_texel(self) -> [f32; 3] {
        [
            self.object_id as f32,
            self.draw_id as f32,
            self.prim_id as f32,
        ]
    }

    pub fn is_background(&self) -> bool {
        self.object_id == 0
    }

    /// Flat traversal index of the picked instance.
    pub fn object_index(&self) -> Option<usize> {
        self.object_id.checked_sub(1).map(|i| i as usize)
    }
}

/// Row order of a pick texture's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelOrigin {
    /// Row 0 is the bottom of the window.
    BottomLeft,
    /// Row 0 is the top of the window, same as window coordinates.
    TopLeft,
}

impl TexelOrigin {
    /// Convert a window row (top-left origin) into a storage row.
    pub fn to_texel_y(self, y: u32, height: u32) -> u32 {
        let y = y.min(height.saturating_sub(1));
        match self {
            TexelOrigin::BottomLeft => height.saturating_sub(1) - y,
            TexelOrigin::TopLeft => y,
        }
    }
}

/// Anything that can answer "what was drawn at this window pixel".
///
/// Reads are synchronous and may stall on a GPU; call on demand only.
pub trait PickTarget {
    fn size(&self) -> (u32, u32);
    fn read_pixel_at(&mut self, x: u32, y: u32) -> Result<PickedPixel, PickBufferError>;
}

/// Running object counter for the pick pass.
#[derive(Debug, Clone, Copy)]
pub struct PickEncoder {
    next: u32,
    group: u32,
}

impl Default for PickEncoder {
    fn default() -> Self {
        Self { next: 1, group: 0 }
    }
}

impl PickEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a model group; returns the background marker to load and the
    /// group's draw id.
    pub fn begin_group(&mut self) -> (u32, u32) {
        let draw_id = self.group;
        self.group += 1;
        (0, draw_id)
    }

    /// Object index for the next instance.
    pub fn next_instance(&mut self) -> u32 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn instances_encoded(&self) -> u32 {
        self.next - 1
    }
}

/// CPU-side pick texture, bottom-left origin like a GL framebuffer.
/// Lets the decoding and lookup paths run without a GPU.
#[derive(Debug, Clone)]
pub struct PickImage {
    width: u32,
    height: u32,
    texels: Vec<[f32; 3]>,
}

impl PickImage {
    pub fn new(width: u32, height: u32) -> Result<Self, PickBufferError> {
        if width == 0 || height == 0 {
            return Err(PickBufferError::Incomplete {
                width,
                height,
                reason: "zero-sized attachment".into(),
            });
        }
        Ok(Self {
            width,
            height,
            texels: vec![[0.0; 3]; width as usize * height as usize],
        })
    }

    pub fn clear(&mut self) {
        self.texels.fill([0.0; 3]);
    }

    /// Write a pixel addressed in window coordinates.
    pub fn write(&mut self, x: u32, y: u32, pixel: PickedPixel) {
        if x >= self.width || y >= self.height {
            return;
        }
        let row = TexelOrigin::BottomLeft.to_texel_y(y, self.height);
        self.texels[texel_index(self.width, x, row)] = pixel.to_texel();
    }

    /// Fill a window-space rectangle, clipped to the image.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, pixel: PickedPixel) {
        for py in y..y.saturating_add(height).min(self.height) {
            for px in x..x.saturating_add(width).min(self.width) {
                self.write(px, py, pixel);
            }
        }
    }

    /// Raw texel at a storage row, for inspecting the layout.
    pub fn texel(&self, x: u32, row: u32) -> Option<[f32; 3]> {
        if x >= self.width || row >= self.height {
            return None;
        }
        Some(self.texels[texel_index(self.width, x, row)])
    }
}

/// Row-major storage index, widened before multiplying.
fn texel_index(width: u32, x: u32, row: u32) -> usize {
    row as usize * width as usize + x as usize
}

impl PickTarget for PickImage {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_pixel_at(&mut self, x: u32, y: u32) -> Result<PickedPixel, PickBufferError> {
        if x >= self.width || y >= self.height {
            return Err(PickBufferError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let row = TexelOrigin::BottomLeft.to_texel_y(y, self.height);
        Ok(PickedPixel::from_texel(
            self.texels[texel_index(self.width, x, row)],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn texel_index_does_not_wrap_in_u32() {
        assert_eq!(texel_index(70_000, 5, 70_000), 70_000usize * 70_000 + 5);
        assert_eq!(texel_index(4, 3, 2), 11);
    }

    #[test]
    fn decode_rounds_and_rejects_negatives() {
        let p = PickedPixel::from_texel([3.0, 1.0, 0.0]);
        assert_eq!(
            p,
            PickedPixel {
                object_id: 3,
                draw_id: 1,
                prim_id: 0
            }
        );
        assert_eq!(PickedPixel::from_texel([6.999_9, -1.0, f32::NAN]).object_id, 7);
        assert_eq!(PickedPixel::from_texel([-1.0, 0.0, 0.0]), PickedPixel::BACKGROUND);
    }

    #[test]
    fn object_index_is_zero_based() {
        assert_eq!(PickedPixel::BACKGROUND.object_index(), None);
        assert!(PickedPixel::BACKGROUND.is_background());
        let p = PickedPixel::from_texel([5.0, 0.0, 0.0]);
        assert_eq!(p.object_index(), Some(4));
    }

    #[test]
    fn y_flip_for_bottom_left_storage() {
        assert_eq!(TexelOrigin::BottomLeft.to_texel_y(0, 100), 99);
        assert_eq!(TexelOrigin::BottomLeft.to_texel_y(99, 100), 0);
        assert_eq!(TexelOrigin::BottomLeft.to_texel_y(150, 100), 0);
        assert_eq!(TexelOrigin::TopLeft.to_texel_y(10, 100), 10);
    }

    #[test]
    fn encoder_sequence() {
        let mut enc = PickEncoder::new();
        let mut loads = Vec::new();
        for group_size in [2, 1, 3] {
            loads.push(enc.begin_group().0);
            for _ in 0..group_size {
                loads.push(enc.next_instance());
            }
        }
        assert_eq!(loads, vec![0, 1, 2, 0, 3, 0, 4, 5, 6]);
        assert_eq!(enc.instances_encoded(), 6);
        assert_eq!(enc.begin_group().1, 3);
    }

    #[test]
    fn synthetic_image_reads_back_written_index() {
        let mut img = PickImage::new(64, 32).unwrap();
        let k = PickedPixel {
            object_id: 42,
            draw_id: 2,
            prim_id: 0,
        };
        img.fill_rect(10, 5, 4, 4, k);
        assert_eq!(img.read_pixel_at(11, 6).unwrap(), k);
        // stored flipped
        assert_eq!(img.texel(11, 31 - 6), Some(k.to_texel()));
        assert!(img.read_pixel_at(0, 0).unwrap().is_background());
        img.clear();
        assert!(img.read_pixel_at(11, 6).unwrap().is_background());
    }

    #[test]
    fn read_out_of_bounds_is_an_error() {
        let mut img = PickImage::new(4, 4).unwrap();
        assert!(matches!(
            img.read_pixel_at(4, 0),
            Err(PickBufferError::OutOfBounds { .. })
        ));
        assert!(PickImage::new(0, 4).is_err());
    }
}
