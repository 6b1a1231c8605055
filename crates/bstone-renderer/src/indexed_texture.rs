// indexed_texture.rs -- palette-indexed image kept as an RGBA texture
//
// The indexed source and the RGBA staging buffer live on the CPU. Every
// upload converts the whole image and re-sends the full padded level.

use crate::ogl::OglRenderer;
use crate::palette::{self, IndexedImage, IndexedLayout, RgbaPalette};
use crate::r3r::*;
use log::debug;

pub struct IndexedTexture {
    width: i32,
    height: i32,
    actual_width: i32,
    actual_height: i32,
    layout: IndexedLayout,
    mipmap_count: i32,

    indexed: Vec<u8>,
    opacity: Option<Vec<u8>>,
    rgba: Vec<Rgba8>,

    texture_id: Option<R3rTexture2dId>,
}

/// Texel count of a `width` x `height` image, checked against the address space.
fn texel_count(width: i32, height: i32) -> R3rResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|&count| count.checked_mul(std::mem::size_of::<Rgba8>()).is_some())
        .ok_or_else(|| R3rError::contract(format!("Indexed texture size {}x{} too large.", width, height)))
}

impl IndexedTexture {
    /// Size the texture. Without NPOT support both dimensions are rounded up
    /// to a power of two; the extra texels are padding.
    pub fn new(width: i32, height: i32, is_npot_available: bool, has_mipmaps: bool) -> R3rResult<Self> {
        let is_in_range = |value: i32| (R3rLimits::MIN_TEXTURE_DIMENSION..=R3rLimits::MAX_POT_DIMENSION).contains(&value);

        if !is_in_range(width) || !is_in_range(height) {
            return Err(R3rError::contract(format!("Indexed texture size {}x{} out of range.", width, height)));
        }

        let (actual_width, actual_height) = if is_npot_available {
            (width, height)
        } else {
            (R3rUtils::find_nearest_pot_value(width)?, R3rUtils::find_nearest_pot_value(height)?)
        };

        let indexed_size = texel_count(width, height)?;
        let rgba_size = texel_count(actual_width, actual_height)?;

        let mipmap_count = if has_mipmaps {
            R3rUtils::calculate_mipmap_count(actual_width, actual_height)
        } else {
            1
        };

        Ok(Self {
            width,
            height,
            actual_width,
            actual_height,
            layout: IndexedLayout::RowMajor,
            mipmap_count,
            indexed: vec![0; indexed_size],
            opacity: None,
            rgba: vec![Rgba8::default(); rgba_size],
            texture_id: None,
        })
    }

    pub fn set_layout(&mut self, layout: IndexedLayout) {
        self.layout = layout;
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn actual_width(&self) -> i32 {
        self.actual_width
    }

    pub fn actual_height(&self) -> i32 {
        self.actual_height
    }

    pub fn mipmap_count(&self) -> i32 {
        self.mipmap_count
    }

    pub fn texture_id(&self) -> Option<R3rTexture2dId> {
        self.texture_id
    }

    pub fn indexed_mut(&mut self) -> &mut [u8] {
        &mut self.indexed
    }

    pub fn rgba(&self) -> &[Rgba8] {
        &self.rgba
    }

    pub fn set_indexed(&mut self, data: &[u8]) -> R3rResult<()> {
        if data.len() != self.indexed.len() {
            return Err(R3rError::contract(format!(
                "Indexed data size mismatch: expected {}, got {}.",
                self.indexed.len(),
                data.len()
            )));
        }

        self.indexed.copy_from_slice(data);
        Ok(())
    }

    /// Per-texel opacity (0 = transparent), or `None` for an opaque image.
    pub fn set_opacity_mask(&mut self, mask: Option<&[u8]>) -> R3rResult<()> {
        if let Some(mask) = mask {
            if mask.len() != self.indexed.len() {
                return Err(R3rError::contract("Opacity mask size mismatch."));
            }
        }

        self.opacity = mask.map(<[u8]>::to_vec);
        Ok(())
    }

    /// Refresh the staging buffer from the indexed data.
    pub fn convert(&mut self, palette: &RgbaPalette) -> R3rResult<()> {
        let image = IndexedImage {
            width: self.width as usize,
            height: self.height as usize,
            layout: self.layout,
            indices: &self.indexed,
            opacity: self.opacity.as_deref(),
        };

        palette::convert_indexed(&image, palette, &mut self.rgba, self.actual_width as usize)
    }

    /// Create the GPU texture. Its contents are undefined until `upload`.
    pub fn create(&mut self, renderer: &mut OglRenderer) -> R3rResult<R3rTexture2dId> {
        self.destroy(renderer);

        if self.mipmap_count > 1 && !renderer.get_device_features().is_mipmap_available {
            debug!("[R3R] Software mipmaps for a {}x{} texture.", self.actual_width, self.actual_height);
        }

        let id = renderer.texture_2d_create(&R3rTexture2dInitParam {
            pixel_format: R3rPixelFormat::Rgba8,
            width: self.actual_width,
            height: self.actual_height,
            mipmap_count: self.mipmap_count,
        })?;

        self.texture_id = Some(id);
        Ok(id)
    }

    /// Convert and send every level to the GPU.
    pub fn upload(&mut self, renderer: &mut OglRenderer, palette: &RgbaPalette) -> R3rResult<()> {
        let id = self
            .texture_id
            .ok_or_else(|| R3rError::contract("Indexed texture has no GPU texture."))?;

        self.convert(palette)?;

        renderer.texture_2d_update(
            id,
            &R3rTexture2dUpdateParam {
                mipmap_level: 0,
                image: &self.rgba,
            },
        )?;

        if self.mipmap_count == 1 {
            return Ok(());
        }

        if renderer.get_device_features().is_mipmap_available {
            return renderer.texture_2d_generate_mipmaps(id);
        }

        self.upload_software_mipmaps(renderer, id)
    }

    fn upload_software_mipmaps(&self, renderer: &mut OglRenderer, id: R3rTexture2dId) -> R3rResult<()> {
        let mut src = self.rgba.clone();
        let mut width = self.actual_width;
        let mut height = self.actual_height;

        for level in 1..self.mipmap_count {
            let next_width = R3rUtils::mipmap_dimension(self.actual_width, level);
            let next_height = R3rUtils::mipmap_dimension(self.actual_height, level);
            let mut dst = vec![Rgba8::default(); (next_width * next_height) as usize];

            R3rUtils::build_mipmap(width, height, &src, &mut dst)?;
            renderer.texture_2d_update(
                id,
                &R3rTexture2dUpdateParam {
                    mipmap_level: level,
                    image: &dst,
                },
            )?;

            src = dst;
            width = next_width;
            height = next_height;
        }

        Ok(())
    }

    pub fn destroy(&mut self, renderer: &mut OglRenderer) {
        if let Some(id) = self.texture_id.take() {
            renderer.texture_2d_destroy(id);
        }
    }
}
