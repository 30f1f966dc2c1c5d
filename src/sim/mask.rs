//! Pixel masks and exact-shape collision
//!
//! A mask is the set of solid pixels of a sprite. Cars and track features are
//! tested pixel-against-pixel rather than by bounding box, so the car has to
//! carry a mask of its *rotated* sprite.

use glam::{IVec2, Vec2};

use crate::consts::MASK_ALPHA_THRESHOLD;

/// Packed bitmap of solid pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    /// Words per row (rows are padded to whole words)
    stride: usize,
    bits: Vec<u64>,
}

impl Mask {
    /// Empty mask
    pub fn new(width: u32, height: u32) -> Self {
        let stride = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height as usize],
        }
    }

    /// Mask with every pixel solid
    pub fn filled(width: u32, height: u32) -> Self {
        let mut mask = Self::new(width, height);
        mask.fill_rect(0, 0, width, height);
        mask
    }

    /// Union of rectangles `(x, y, w, h)`, clipped to the mask bounds
    pub fn from_rects(width: u32, height: u32, rects: &[[u32; 4]]) -> Self {
        let mut mask = Self::new(width, height);
        for &[x, y, w, h] in rects {
            mask.fill_rect(x, y, w, h);
        }
        mask
    }

    /// Build from ASCII rows, `#` or `X` marking solid pixels
    ///
    /// Width is the longest row; shorter rows are padded with empty pixels.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut mask = Self::new(width, rows.len() as u32);
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' || c == 'X' {
                    mask.set(x as u32, y as u32, true);
                }
            }
        }
        mask
    }

    /// Build from an RGBA8 buffer, treating alpha above the threshold as solid
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_alpha(width: u32, height: u32, rgba: &[u8]) -> Option<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return None;
        }
        let mut mask = Self::new(width, height);
        for (i, px) in rgba.chunks_exact(4).enumerate() {
            if px[3] > MASK_ALPHA_THRESHOLD {
                let x = i as u32 % width;
                let y = i as u32 / width;
                mask.set(x, y, true);
            }
        }
        Some(mask)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width as i32, self.height as i32)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> (usize, u64) {
        let word = y as usize * self.stride + (x as usize >> 6);
        (word, 1u64 << (x & 63))
    }

    /// Whether the pixel is solid (out of bounds reads as empty)
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return false;
        }
        let (word, bit) = self.index(x as u32, y as u32);
        self.bits[word] & bit != 0
    }

    /// Set or clear a pixel; out of bounds writes are ignored
    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let (word, bit) = self.index(x, y);
        if solid {
            self.bits[word] |= bit;
        } else {
            self.bits[word] &= !bit;
        }
    }

    /// Fill a rectangle, clipped to bounds
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for py in y..y_end {
            for px in x..x_end {
                self.set(px, py, true);
            }
        }
    }

    /// Number of solid pixels
    pub fn count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// First solid pixel shared with `other` placed at `offset` in this mask's frame
    ///
    /// Only the intersection of the two boxes is scanned, row by row from the
    /// top, left to right. The returned point is in this mask's frame.
    pub fn overlap(&self, other: &Mask, offset: IVec2) -> Option<IVec2> {
        let x_start = offset.x.max(0);
        let y_start = offset.y.max(0);
        let x_end = (offset.x + other.width as i32).min(self.width as i32);
        let y_end = (offset.y + other.height as i32).min(self.height as i32);

        for y in y_start..y_end {
            for x in x_start..x_end {
                if self.get(x, y) && other.get(x - offset.x, y - offset.y) {
                    return Some(IVec2::new(x, y));
                }
            }
        }
        None
    }

    /// Copy of this mask rotated by `angle` degrees about its centre
    ///
    /// Positive angles turn counter-clockwise on screen (y down), matching car
    /// headings. The result is sized to the rotated bounding box and shares
    /// its centre with the source.
    pub fn rotated(&self, angle: f32) -> Mask {
        let angle = crate::normalize_degrees(angle);
        if angle == 0.0 {
            return self.clone();
        }

        let (sin, cos) = angle.to_radians().sin_cos();
        let w = self.width as f32;
        let h = self.height as f32;
        // Shave float noise so 90 degrees does not grow the box by a pixel
        let out_w = ((w * cos.abs() + h * sin.abs()) - 1e-3).ceil().max(0.0) as u32;
        let out_h = ((w * sin.abs() + h * cos.abs()) - 1e-3).ceil().max(0.0) as u32;

        let mut out = Mask::new(out_w, out_h);
        let half_out = Vec2::new(out_w as f32, out_h as f32) / 2.0;
        let half_src = Vec2::new(w, h) / 2.0;

        for y in 0..out_h {
            for x in 0..out_w {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - half_out;
                // Inverse of the screen-space counter-clockwise rotation
                let s = Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + half_src;
                if self.get(s.x.floor() as i32, s.y.floor() as i32) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }
}

/// Pixel offset of `pos_a` relative to `pos_b`
///
/// Rounds the difference rather than each position so that swapping the
/// arguments exactly negates the offset.
#[inline]
pub fn pixel_offset(pos_a: Vec2, pos_b: Vec2) -> IVec2 {
    (pos_a - pos_b).round().as_ivec2()
}

/// Test mask A at `pos_a` against mask B at `pos_b`
///
/// Returns the first shared solid pixel in **B's local frame**, or `None`.
/// Swapping A and B never changes whether a point is returned; it only
/// changes the frame the point is expressed in (and, for multi-pixel
/// overlaps, which shared pixel the scan reaches first).
pub fn collide(mask_a: &Mask, pos_a: Vec2, mask_b: &Mask, pos_b: Vec2) -> Option<IVec2> {
    mask_b.overlap(mask_a, pixel_offset(pos_a, pos_b))
}
