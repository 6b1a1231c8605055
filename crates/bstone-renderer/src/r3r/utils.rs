// utils.rs -- texture math shared by the backends

use super::error::{R3rError, R3rResult};
use super::limits::R3rLimits;
use super::types::Rgba8;

pub struct R3rUtils;

impl R3rUtils {
    pub fn is_pot_value(value: i32) -> bool {
        value > 0 && (value & (value - 1)) == 0
    }

    /// Smallest power of two that is >= `value` (1 for non-positive values).
    pub fn find_nearest_pot_value(value: i32) -> R3rResult<i32> {
        if value > R3rLimits::MAX_POT_DIMENSION {
            return Err(R3rError::contract(format!("No power of two >= {} fits a dimension.", value)));
        }

        Ok((value.max(1) as u32).next_power_of_two() as i32)
    }

    /// Number of levels down to 1x1 for a texture of the given size.
    pub fn calculate_mipmap_count(width: i32, height: i32) -> i32 {
        let mut levels = 1i32;
        let mut w = width.max(1);
        let mut h = height.max(1);

        while w > 1 || h > 1 {
            w = (w / 2).max(1);
            h = (h / 2).max(1);
            levels += 1;
        }

        levels.min(R3rLimits::MAX_MIPMAP_COUNT)
    }

    /// Dimension of a mipmap level.
    pub fn mipmap_dimension(base: i32, level: i32) -> i32 {
        (base >> level).max(1)
    }

    /// Downsample a level with a 2x2 box filter into `dst`.
    ///
    /// `dst` must hold `max(w/2,1) * max(h/2,1)` texels. A dimension of 1 is
    /// averaged along the other axis only.
    pub fn build_mipmap(
        src_width: i32,
        src_height: i32,
        src: &[Rgba8],
        dst: &mut [Rgba8],
    ) -> R3rResult<()> {
        if src_width <= 0 || src_height <= 0 {
            return Err(R3rError::contract("Mipmap source dimensions out of range."));
        }

        let sw = src_width as usize;
        let sh = src_height as usize;
        let dw = (sw / 2).max(1);
        let dh = (sh / 2).max(1);

        if src.len() < sw * sh {
            return Err(R3rError::contract("Mipmap source too small."));
        }

        if dst.len() < dw * dh {
            return Err(R3rError::contract("Mipmap target too small."));
        }

        if sw == 1 && sh == 1 {
            dst[0] = src[0];
            return Ok(());
        }

        // Sample offsets collapse to the same texel along a 1-pixel axis.
        let dx = if sw > 1 { 1 } else { 0 };
        let dy = if sh > 1 { 1 } else { 0 };

        for y in 0..dh {
            let y0 = y * (1 + dy);
            let y1 = y0 + dy;

            for x in 0..dw {
                let x0 = x * (1 + dx);
                let x1 = x0 + dx;

                let a = src[y0 * sw + x0];
                let b = src[y0 * sw + x1];
                let c = src[y1 * sw + x0];
                let d = src[y1 * sw + x1];

                let avg = |p: u8, q: u8, r: u8, s: u8| -> u8 {
                    ((p as u32 + q as u32 + r as u32 + s as u32) >> 2) as u8
                };

                dst[y * dw + x] = Rgba8::new(
                    avg(a.r, b.r, c.r, d.r),
                    avg(a.g, b.g, c.g, d.g),
                    avg(a.b, b.b, c.b, d.b),
                    avg(a.a, b.a, c.a, d.a),
                );
            }
        }

        Ok(())
    }

    /// Reverse the row order of a tightly packed image in place.
    pub fn flip_rows(pixels: &mut [u8], row_size: usize) {
        if row_size == 0 {
            return;
        }

        let rows = pixels.len() / row_size;

        for y in 0..rows / 2 {
            let (top, bottom) = pixels.split_at_mut((rows - 1 - y) * row_size);
            top[y * row_size..(y + 1) * row_size].swap_with_slice(&mut bottom[..row_size]);
        }
    }
}
