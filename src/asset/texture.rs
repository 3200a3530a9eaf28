//! `Texture2D`/`Texture3D` records and `decode_mip` (§3, §4.8).
//!
//! Pixel-format numbering follows XNA's `SurfaceFormat` enum ordering
//! (`Color = 0`, `Dxt1 = 4`, `Dxt5 = 6`) — the only three values this crate's
//! scope requires are named in §3/§4.8 ("color", "bc1", "bc3"); the rest of
//! the enum's numeric space is reserved and rejected at decode time.

use crate::error::TextureError;
use crate::primitives::Reader;
use crate::texture::bc::{decode_bc1_block, decode_bc3_block};
use crate::texture::block::for_each_block;

const FORMAT_COLOR: u32 = 0;
const FORMAT_BC1: u32 = 4;
const FORMAT_BC3: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Color,
    Bc1,
    Bc3,
    Other(u32),
}

impl PixelFormat {
    fn from_u32(v: u32) -> Self {
        match v {
            FORMAT_COLOR => PixelFormat::Color,
            FORMAT_BC1 => PixelFormat::Bc1,
            FORMAT_BC3 => PixelFormat::Bc3,
            other => PixelFormat::Other(other),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mip {
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct Texture2D {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub mips: Vec<Mip>,
}

#[derive(Clone, Debug)]
pub struct Texture3D {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mips: Vec<Mip>,
}

pub fn read_texture_2d(r: &mut Reader<'_>) -> Result<Texture2D, crate::error::AssetError> {
    let format = PixelFormat::from_u32(r.u32_le()?);
    let width = r.u32_le()?;
    let height = r.u32_le()?;
    let mip_count = r.u32_le()?;
    let mut mips = Vec::with_capacity(mip_count as usize);
    for _ in 0..mip_count {
        let size = r.u32_le()? as usize;
        mips.push(Mip {
            bytes: r.bytes(size)?.to_vec(),
        });
    }
    Ok(Texture2D {
        format,
        width,
        height,
        mips,
    })
}

pub fn read_texture_3d(r: &mut Reader<'_>) -> Result<Texture3D, crate::error::AssetError> {
    let format = PixelFormat::from_u32(r.u32_le()?);
    let width = r.u32_le()?;
    let height = r.u32_le()?;
    let depth = r.u32_le()?;
    let mip_count = r.u32_le()?;
    let mut mips = Vec::with_capacity(mip_count as usize);
    for _ in 0..mip_count {
        let size = r.u32_le()? as usize;
        mips.push(Mip {
            bytes: r.bytes(size)?.to_vec(),
        });
    }
    Ok(Texture3D {
        format,
        width,
        height,
        depth,
        mips,
    })
}

/// Decodes one mip level of a `Texture2D` to a tightly-packed RGBA8 buffer
/// (§4.8). Fails with `UnsupportedTextureFormat` only here, not at parse
/// time, matching §3's invariant that unsupported formats parse fine but
/// fail on decode.
pub fn decode_mip(texture: &Texture2D, mip_index: usize) -> Result<Vec<u8>, TextureError> {
    let mip = texture
        .mips
        .get(mip_index)
        .ok_or(TextureError::MipIndexOutOfRange {
            index: mip_index,
            count: texture.mips.len(),
        })?;
    let (w, h) = mip_dimensions(texture.width, texture.height, mip_index);
    decode_pixels(texture.format, &mip.bytes, w, h)
}

/// Decodes one depth-layer slice of a `Texture3D` (§4.8: "decoding is
/// per-slice").
pub fn decode_slice(texture: &Texture3D, mip_index: usize, width: u32, height: u32) -> Result<Vec<u8>, TextureError> {
    let mip = texture
        .mips
        .get(mip_index)
        .ok_or(TextureError::MipIndexOutOfRange {
            index: mip_index,
            count: texture.mips.len(),
        })?;
    decode_pixels(texture.format, &mip.bytes, width, height)
}

fn mip_dimensions(width: u32, height: u32, mip_index: usize) -> (u32, u32) {
    let w = (width >> mip_index).max(1);
    let h = (height >> mip_index).max(1);
    (w, h)
}

fn decode_pixels(format: PixelFormat, bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TextureError> {
    match format {
        PixelFormat::Color => decode_color(bytes, width, height),
        PixelFormat::Bc1 => decode_block_compressed(bytes, width, height, 8, decode_bc1_block),
        PixelFormat::Bc3 => decode_block_compressed(bytes, width, height, 16, decode_bc3_block),
        PixelFormat::Other(v) => Err(TextureError::UnsupportedTextureFormat(v)),
    }
}

/// `color` format: stored as BGRA8 per pixel, reordered to RGBA8 (§4.8).
fn decode_color(bytes: &[u8], width: u32, height: u32) -> Result<Vec<u8>, TextureError> {
    let pixel_count = (width as usize) * (height as usize);
    let needed = pixel_count * 4;
    if bytes.len() < needed {
        return Err(TextureError::InputDataTooSmall {
            needed,
            got: bytes.len(),
        });
    }
    let mut out = vec![0u8; needed];
    for i in 0..pixel_count {
        let src = &bytes[i * 4..i * 4 + 4];
        out[i * 4] = src[2];
        out[i * 4 + 1] = src[1];
        out[i * 4 + 2] = src[0];
        out[i * 4 + 3] = src[3];
    }
    Ok(out)
}

fn decode_block_compressed(
    bytes: &[u8],
    width: u32,
    height: u32,
    block_bytes: usize,
    decode_block: fn(&[u8]) -> [[u8; 4]; 16],
) -> Result<Vec<u8>, TextureError> {
    let pixel_count = (width as usize) * (height as usize);
    let mut out = vec![0u8; pixel_count * 4];
    for_each_block(width, height, bytes, block_bytes, |block_bytes, bx, by, clip_w, clip_h| {
        let pixels = decode_block(block_bytes);
        for row in 0..clip_h {
            for col in 0..clip_w {
                let px = bx + col;
                let py = by + row;
                let dst = ((py as usize) * (width as usize) + px as usize) * 4;
                let src = (row * 4 + col) as usize;
                out[dst..dst + 4].copy_from_slice(&pixels[src]);
            }
        }
        Ok(())
    })?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_format_reorders_bgra_to_rgba() {
        let bytes = vec![10u8, 20, 30, 40];
        let out = decode_color(&bytes, 1, 1).unwrap();
        assert_eq!(out, vec![30, 20, 10, 40]);
    }

    #[test]
    fn unsupported_format_fails_on_decode_only() {
        let texture = Texture2D {
            format: PixelFormat::Other(99),
            width: 4,
            height: 4,
            mips: vec![Mip { bytes: vec![0; 16] }],
        };
        assert!(matches!(
            decode_mip(&texture, 0),
            Err(TextureError::UnsupportedTextureFormat(99))
        ));
    }

    #[test]
    fn mip_index_out_of_range() {
        let texture = Texture2D {
            format: PixelFormat::Color,
            width: 1,
            height: 1,
            mips: vec![],
        };
        assert!(matches!(
            decode_mip(&texture, 0),
            Err(TextureError::MipIndexOutOfRange { index: 0, count: 0 })
        ));
    }
}
