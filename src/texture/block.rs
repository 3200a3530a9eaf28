//! Block-codec iteration core (§4.4): divides an image into 4×4 blocks,
//! decodes each via a supplied codec, and blits into the output with
//! per-edge clipping for images whose width/height are not multiples of 4.
//!
//! Grounded on `examples/other_examples/933c22b4_monokrome-bl4_.../texture.rs`'s
//! `blocks_x`/`blocks_y` clipped-blit shape.

use crate::error::TextureError;

/// Walks every 4×4 block of a `width` × `height` image stored as
/// `block_bytes`-byte blocks in row-major block order, invoking `f` with
/// the block's raw bytes, its pixel-space origin, and the clipped
/// width/height of this block (< 4 only on the final row/column).
pub fn for_each_block<F>(
    width: u32,
    height: u32,
    bytes: &[u8],
    block_bytes: usize,
    mut f: F,
) -> Result<(), TextureError>
where
    F: FnMut(&[u8], u32, u32, u32, u32) -> Result<(), TextureError>,
{
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let needed = (blocks_x as usize) * (blocks_y as usize) * block_bytes;
    if bytes.len() < needed {
        return Err(TextureError::InputDataTooSmall {
            needed,
            got: bytes.len(),
        });
    }

    let mut offset = 0usize;
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = &bytes[offset..offset + block_bytes];
            offset += block_bytes;
            let px = bx * 4;
            let py = by * 4;
            let clip_w = (width - px).min(4);
            let clip_h = (height - py).min(4);
            f(block, px, py, clip_w, clip_h)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clips_final_row_and_column() {
        let width = 5u32;
        let height = 5u32;
        let blocks_x = 2usize;
        let blocks_y = 2usize;
        let bytes = vec![0u8; blocks_x * blocks_y * 8];
        let mut seen = Vec::new();
        for_each_block(width, height, &bytes, 8, |_block, px, py, cw, ch| {
            seen.push((px, py, cw, ch));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![(0, 0, 4, 4), (4, 0, 1, 4), (0, 4, 4, 1), (4, 4, 1, 1)]
        );
    }

    #[test]
    fn rejects_short_input() {
        let bytes = vec![0u8; 4];
        let result = for_each_block(4, 4, &bytes, 8, |_, _, _, _, _| Ok(()));
        assert!(matches!(
            result,
            Err(TextureError::InputDataTooSmall { needed: 8, got: 4 })
        ));
    }
}
