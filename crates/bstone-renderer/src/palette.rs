// palette.rs -- VGA palette expansion and indexed-to-RGBA conversion
//
// The game draws into 8-bit indexed buffers that address a 256-entry VGA
// palette with 6-bit components. Everything here is plain CPU work on byte
// slices; the caller uploads the result on the GL thread.

use crate::r3r::{R3rError, R3rResult, Rgba8};
use bstone_common::common::{PALETTE_SIZE, VGA_MAX_COMPONENT};
use rayon::prelude::*;

/// A VGA palette: 256 RGB triplets, 0..=63 per component.
pub type VgaPalette = [[u8; 3]; PALETTE_SIZE];

/// Images with at least this many texels are converted in parallel.
pub const PARALLEL_MIN_TEXELS: usize = 64 * 64;

/// Scale a 6-bit VGA component to 8 bits. Values above 63 saturate.
pub fn vga_to_pc(value: u8) -> u8 {
    let value = value.min(VGA_MAX_COMPONENT) as u32;
    ((255 * value) / VGA_MAX_COMPONENT as u32) as u8
}

// ============================================================
// RgbaPalette
// ============================================================

/// Palette expanded to RGBA8, plus the indices drawn fully transparent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaPalette {
    entries: [Rgba8; PALETTE_SIZE],
    transparent: [bool; PALETTE_SIZE],
}

impl Default for RgbaPalette {
    fn default() -> Self {
        Self {
            entries: [Rgba8::new(0, 0, 0, 255); PALETTE_SIZE],
            transparent: [false; PALETTE_SIZE],
        }
    }
}

impl RgbaPalette {
    pub fn from_vga(vga: &VgaPalette) -> Self {
        let mut palette = Self::default();
        // A full-range update cannot fail.
        let _ = palette.update_from_vga(vga, 0, PALETTE_SIZE);
        palette
    }

    /// Re-expand entries `offset..offset + count` from `vga`; the rest of the
    /// table is left as is.
    pub fn update_from_vga(&mut self, vga: &VgaPalette, offset: usize, count: usize) -> R3rResult<()> {
        let end = offset
            .checked_add(count)
            .filter(|end| *end <= PALETTE_SIZE)
            .ok_or_else(|| R3rError::contract(format!("Palette range {}+{} out of range.", offset, count)))?;

        for index in offset..end {
            let [r, g, b] = vga[index];
            let a = if self.transparent[index] { 0 } else { 255 };
            self.entries[index] = Rgba8::new(vga_to_pc(r), vga_to_pc(g), vga_to_pc(b), a);
        }

        Ok(())
    }

    /// Mark which indices are transparent. Alpha changes, RGB does not.
    pub fn set_alpha_mask(&mut self, mask: &[bool; PALETTE_SIZE]) {
        self.transparent = *mask;

        for (entry, is_transparent) in self.entries.iter_mut().zip(mask.iter()) {
            entry.a = if *is_transparent { 0 } else { 255 };
        }
    }

    pub fn get(&self, index: u8) -> Rgba8 {
        self.entries[index as usize]
    }

    pub fn entries(&self) -> &[Rgba8; PALETTE_SIZE] {
        &self.entries
    }
}

// ============================================================
// Conversion
// ============================================================

/// How the indexed source is stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexedLayout {
    /// Rows left to right, top row first (the screen buffer).
    #[default]
    RowMajor,
    /// Columns top to bottom, left column first (walls and sprites).
    ColumnMajor,
}

/// Source description for one conversion.
#[derive(Clone, Copy, Debug)]
pub struct IndexedImage<'a> {
    pub width: usize,
    pub height: usize,
    pub layout: IndexedLayout,
    pub indices: &'a [u8],
    /// Per-texel opacity; 0 means transparent.
    pub opacity: Option<&'a [u8]>,
}

impl IndexedImage<'_> {
    fn validate(&self, dst_len: usize, dst_width: usize) -> R3rResult<()> {
        let texels = self.width * self.height;

        if self.width == 0 || self.height == 0 {
            return Err(R3rError::contract("Indexed image has no texels."));
        }

        if self.indices.len() < texels {
            return Err(R3rError::contract(format!(
                "Indexed image {}x{} needs {} bytes, got {}.",
                self.width,
                self.height,
                texels,
                self.indices.len()
            )));
        }

        if let Some(opacity) = self.opacity {
            if opacity.len() < texels {
                return Err(R3rError::contract("Opacity mask smaller than the image."));
            }
        }

        if dst_width < self.width || dst_len < dst_width * self.height {
            return Err(R3rError::contract(format!(
                "RGBA target too small for a {}x{} image.",
                self.width, self.height
            )));
        }

        Ok(())
    }

    fn source_index(&self, x: usize, y: usize) -> usize {
        match self.layout {
            IndexedLayout::RowMajor => y * self.width + x,
            IndexedLayout::ColumnMajor => x * self.height + y,
        }
    }

    fn convert_row(&self, palette: &RgbaPalette, y: usize, row: &mut [Rgba8]) {
        for (x, texel) in row.iter_mut().take(self.width).enumerate() {
            let src = self.source_index(x, y);
            let mut color = palette.get(self.indices[src]);

            if let Some(opacity) = self.opacity {
                if opacity[src] == 0 {
                    color.a = 0;
                }
            }

            *texel = color;
        }
    }
}

/// Convert `image` into `dst`, a buffer `dst_width` texels wide.
///
/// Only the `image.width x image.height` corner is written. Texels right of
/// and below it keep whatever the buffer held before.
pub fn convert_indexed(image: &IndexedImage<'_>, palette: &RgbaPalette, dst: &mut [Rgba8], dst_width: usize) -> R3rResult<()> {
    image.validate(dst.len(), dst_width)?;

    if image.width * image.height >= PARALLEL_MIN_TEXELS {
        dst.par_chunks_mut(dst_width)
            .take(image.height)
            .enumerate()
            .for_each(|(y, row)| image.convert_row(palette, y, row));
    } else {
        dst.chunks_mut(dst_width)
            .take(image.height)
            .enumerate()
            .for_each(|(y, row)| image.convert_row(palette, y, row));
    }

    Ok(())
}

/// Row-major conversion of a fully opaque image.
pub fn convert_indexed_to_rgba(
    indices: &[u8],
    width: usize,
    height: usize,
    palette: &RgbaPalette,
    dst: &mut [Rgba8],
    dst_width: usize,
) -> R3rResult<()> {
    let image = IndexedImage {
        width,
        height,
        layout: IndexedLayout::RowMajor,
        indices,
        opacity: None,
    };
    convert_indexed(&image, palette, dst, dst_width)
}

/// Column-major conversion (wall and sprite sources).
pub fn convert_indexed_column_major(
    indices: &[u8],
    width: usize,
    height: usize,
    palette: &RgbaPalette,
    dst: &mut [Rgba8],
    dst_width: usize,
) -> R3rResult<()> {
    let image = IndexedImage {
        width,
        height,
        layout: IndexedLayout::ColumnMajor,
        indices,
        opacity: None,
    };
    convert_indexed(&image, palette, dst, dst_width)
}
