//! A decoded RGBA8 image, shared by the BMP decoder and the texture
//! loader's mask-composition step.

/// Width/height plus tightly packed, top-down, left-to-right RGBA8 data.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelBuffer {
    #[must_use]
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), width as usize * height as usize * 4);
        Self { width, height, rgba }
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[idx],
            self.rgba[idx + 1],
            self.rgba[idx + 2],
            self.rgba[idx + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u8; 4]) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[idx..idx + 4].copy_from_slice(&value);
    }

    /// Rotates the buffer 90 degrees clockwise (spec §4.2, mask variants).
    #[must_use]
    pub fn rotate90_cw(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = vec![0u8; self.rgba.len()];
        let mut rotated = PixelBuffer {
            width: h,
            height: w,
            rgba: std::mem::take(&mut out),
        };
        for y in 0..h {
            for x in 0..w {
                let src = self.pixel(x, y);
                // (x, y) in the source lands at (h-1-y, x) in the rotated buffer.
                rotated.set_pixel(h - 1 - y, x, src);
            }
        }
        rotated
    }

    /// Mirrors the buffer left-to-right.
    #[must_use]
    pub fn flip_horizontal(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = self.clone();
        for y in 0..h {
            for x in 0..w {
                out.set_pixel(w - 1 - x, y, self.pixel(x, y));
            }
        }
        out
    }

    /// Mirrors the buffer top-to-bottom.
    #[must_use]
    pub fn flip_vertical(&self) -> Self {
        let (w, h) = (self.width, self.height);
        let mut out = self.clone();
        for y in 0..h {
            for x in 0..w {
                out.set_pixel(x, h - 1 - y, self.pixel(x, y));
            }
        }
        out
    }

    /// Bilinear resize to `(new_width, new_height)`.
    #[must_use]
    pub fn resize_bilinear(&self, new_width: u32, new_height: u32) -> Self {
        if new_width == self.width && new_height == self.height {
            return self.clone();
        }
        let mut out = PixelBuffer {
            width: new_width,
            height: new_height,
            rgba: vec![0u8; new_width as usize * new_height as usize * 4],
        };
        let x_ratio = self.width as f32 / new_width.max(1) as f32;
        let y_ratio = self.height as f32 / new_height.max(1) as f32;
        for ny in 0..new_height {
            for nx in 0..new_width {
                let src_x = (nx as f32 + 0.5) * x_ratio - 0.5;
                let src_y = (ny as f32 + 0.5) * y_ratio - 0.5;
                let x0 = src_x.floor().clamp(0.0, (self.width - 1) as f32) as u32;
                let y0 = src_y.floor().clamp(0.0, (self.height - 1) as f32) as u32;
                let x1 = (x0 + 1).min(self.width - 1);
                let y1 = (y0 + 1).min(self.height - 1);
                let fx = (src_x - x0 as f32).clamp(0.0, 1.0);
                let fy = (src_y - y0 as f32).clamp(0.0, 1.0);

                let p00 = self.pixel(x0, y0);
                let p10 = self.pixel(x1, y0);
                let p01 = self.pixel(x0, y1);
                let p11 = self.pixel(x1, y1);

                let mut blended = [0u8; 4];
                for c in 0..4 {
                    let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
                    let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
                    blended[c] = (top * (1.0 - fy) + bottom * fy).round() as u8;
                }
                out.set_pixel(nx, ny, blended);
            }
        }
        out
    }
}
