//! LZX windowed decompressor (§4.3).
//!
//! Shape (bit buffer / block-kind dispatch / LRU offsets / window) is
//! grounded on `examples/Lonami-lzxd/src/{lzxd.rs,window.rs,block.rs,
//! block_type.rs}`; the exact control flow and offset-decoding arithmetic are
//! taken verbatim from `spec.md` §4.3 since the teacher's own draft
//! (`tree.rs`) never reached a working decode path.

mod tables;
mod tree;

use crate::bitstream::BitBuffer;
use crate::error::LzxError;
use tables::{EXTRA_BITS, MIN_MATCH, POSITION_BASE};
use tree::HuffmanTable;

pub const WINDOW_BITS: u32 = 16;
pub const WINDOW_SIZE: usize = 1 << WINDOW_BITS;

const NUM_LENGTH_SYMS: usize = 249;
const NUM_ALIGNED_SYMS: usize = 8;
const MAINTREE_TABLE_BITS: u32 = 9;
const LENGTH_TABLE_BITS: u32 = 6;
const ALIGNED_TABLE_BITS: u32 = 7;

fn posn_slots(window_bits: u32) -> usize {
    match window_bits {
        20 => 42,
        21 => 50,
        _ => (window_bits * 2) as usize,
    }
}

fn num_main_elements(window_bits: u32) -> usize {
    256 + posn_slots(window_bits) * 8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Verbatim,
    Aligned,
    Uncompressed,
}

/// Persistent LZX decoder state, carried across the frames of one container.
pub struct LzxDecoder {
    window: Vec<u8>,
    window_posn: usize,
    r0: u32,
    r1: u32,
    r2: u32,

    header_read: bool,
    intel_started: bool,
    intel_filesize: u32,

    block_kind: Option<BlockKind>,
    block_remaining: u32,
    uncompressed_block_odd: bool,

    main_lengths: Vec<u8>,
    length_lengths: Vec<u8>,
    aligned_lengths: Vec<u8>,

    maintree: Option<HuffmanTable>,
    length_tree: Option<HuffmanTable>,
    aligned_tree: Option<HuffmanTable>,

    num_main_elements: usize,
}

impl LzxDecoder {
    pub fn new() -> Self {
        Self::with_window_bits(WINDOW_BITS)
    }

    fn with_window_bits(window_bits: u32) -> Self {
        let num_main = num_main_elements(window_bits);
        Self {
            window: vec![0u8; 1 << window_bits],
            window_posn: 0,
            r0: 1,
            r1: 1,
            r2: 1,
            header_read: false,
            intel_started: false,
            intel_filesize: 0,
            block_kind: None,
            block_remaining: 0,
            uncompressed_block_odd: false,
            main_lengths: vec![0u8; num_main],
            length_lengths: vec![0u8; NUM_LENGTH_SYMS],
            aligned_lengths: vec![0u8; NUM_ALIGNED_SYMS],
            maintree: None,
            length_tree: None,
            aligned_tree: None,
            num_main_elements: num_main,
        }
    }

    /// Whether the stream requested Intel-E8 postprocessing. Tracked so a
    /// caller can detect it even though this decoder does not apply it
    /// (§9, Open Question 1).
    pub fn intel_e8_requested(&self) -> bool {
        self.intel_started || self.intel_filesize != 0
    }

    /// Decodes one frame: `block_size` source bytes cover this frame,
    /// `frame_size` output bytes are emitted into `sink`. Source-seek after
    /// the call equals `pre-call seek + block_size` regardless of how many
    /// bytes were actually consumed by Huffman/match decoding.
    pub fn decompress(
        &mut self,
        source: &[u8],
        source_pos: usize,
        block_size: usize,
        sink: &mut Vec<u8>,
        frame_size: usize,
    ) -> Result<usize, LzxError> {
        let mut bb = BitBuffer::new(source, source_pos);

        if !self.header_read {
            self.header_read = true;
            let intel_flag = bb.read_bits(1)?;
            if intel_flag != 0 {
                let hi = bb.read_bits(16)?;
                let lo = bb.read_bits(16)?;
                self.intel_filesize = (hi << 16) | lo;
            }
        }

        let mut togo = frame_size;
        while togo > 0 {
            if self.block_remaining == 0 {
                self.start_block(&mut bb)?;
            }

            let run = (self.block_remaining as usize).min(togo);
            match self.block_kind.expect("block_kind set by start_block") {
                BlockKind::Uncompressed => {
                    self.copy_uncompressed(&mut bb, run)?;
                }
                BlockKind::Verbatim | BlockKind::Aligned => {
                    self.run_compressed_block(&mut bb, run)?;
                }
            }
            togo -= run;
            self.block_remaining -= run as u32;
        }

        let end = source_pos + block_size;
        self.emit_frame(sink, frame_size);
        Ok(end)
    }

    fn start_block(&mut self, bb: &mut BitBuffer<'_>) -> Result<(), LzxError> {
        let kind = bb.read_bits(3)?;
        let hi = bb.read_bits(16)?;
        let lo = bb.read_bits(8)?;
        let block_length = (hi << 8) | lo;
        self.block_remaining = block_length;

        match kind {
            1 => {
                self.read_verbatim_trees(bb)?;
                self.block_kind = Some(BlockKind::Verbatim);
            }
            2 => {
                for l in self.aligned_lengths.iter_mut() {
                    *l = bb.read_bits(3)? as u8;
                }
                self.aligned_tree = Some(HuffmanTable::build(&self.aligned_lengths, ALIGNED_TABLE_BITS)?);
                self.read_verbatim_trees(bb)?;
                self.block_kind = Some(BlockKind::Aligned);
            }
            3 => {
                self.uncompressed_block_odd = block_length % 2 == 1;
                self.intel_started = true;
                bb.ensure(16)?;
                if bb.bits_left() > 16 {
                    bb.rewind_bytes(2);
                }
                bb.clear();
                let w0 = self.read_u32_le_direct(bb)?;
                let w1 = self.read_u32_le_direct(bb)?;
                let w2 = self.read_u32_le_direct(bb)?;
                self.r0 = w0;
                self.r1 = w1;
                self.r2 = w2;
                self.block_kind = Some(BlockKind::Uncompressed);
            }
            other => return Err(LzxError::InvalidBlock(other as u8)),
        }
        Ok(())
    }

    fn read_u32_le_direct(&self, bb: &mut BitBuffer<'_>) -> Result<u32, LzxError> {
        let b0 = bb.read_u8_direct()?;
        let b1 = bb.read_u8_direct()?;
        let b2 = bb.read_u8_direct()?;
        let b3 = bb.read_u8_direct()?;
        Ok(u32::from_le_bytes([b0, b1, b2, b3]))
    }

    fn read_verbatim_trees(&mut self, bb: &mut BitBuffer<'_>) -> Result<(), LzxError> {
        tree::decode_pretree_and_lengths(bb, &mut self.main_lengths, 0, 256)?;
        tree::decode_pretree_and_lengths(bb, &mut self.main_lengths, 256, self.num_main_elements)?;
        if self.main_lengths[0xE8] != 0 {
            self.intel_started = true;
        }
        tree::decode_pretree_and_lengths(bb, &mut self.length_lengths, 0, NUM_LENGTH_SYMS)?;
        self.maintree = Some(HuffmanTable::build(&self.main_lengths, MAINTREE_TABLE_BITS)?);
        self.length_tree = Some(HuffmanTable::build(&self.length_lengths, LENGTH_TABLE_BITS)?);
        Ok(())
    }

    fn copy_uncompressed(&mut self, bb: &mut BitBuffer<'_>, run: usize) -> Result<(), LzxError> {
        for _ in 0..run {
            let byte = bb.read_u8_direct()?;
            let posn = self.window_posn & (WINDOW_SIZE - 1);
            self.window[posn] = byte;
            self.window_posn = (self.window_posn + 1) & (WINDOW_SIZE - 1);
        }
        if self.block_remaining as usize == run && self.uncompressed_block_odd {
            let _ = bb.read_u8_direct();
            bb.clear();
        }
        Ok(())
    }

    fn run_compressed_block(&mut self, bb: &mut BitBuffer<'_>, run: usize) -> Result<(), LzxError> {
        let mut remaining = run;
        while remaining > 0 {
            let maintree = self.maintree.as_ref().ok_or(LzxError::SomethingBad("maintree missing"))?;
            let sym = maintree.decode(bb)?;
            if sym < 256 {
                let posn = self.window_posn & (WINDOW_SIZE - 1);
                self.window[posn] = sym as u8;
                self.window_posn = (self.window_posn + 1) & (WINDOW_SIZE - 1);
                remaining -= 1;
                continue;
            }

            let m = sym - 256;
            let length_header = (m & 0x7) as u32;
            let position_slot = (m >> 3) as usize;

            let length = if length_header == 7 {
                let length_tree = self.length_tree.as_ref().ok_or(LzxError::SomethingBad("length tree missing"))?;
                let extra = length_tree.decode(bb)? as u32;
                length_header + extra + MIN_MATCH
            } else {
                length_header + MIN_MATCH
            };

            let offset = self.decode_offset(bb, position_slot)?;

            if remaining < length as usize {
                return Err(LzxError::BufferOverrun);
            }
            self.copy_match(offset as usize, length as usize)?;
            remaining -= length as usize;
        }
        Ok(())
    }

    fn decode_offset(&mut self, bb: &mut BitBuffer<'_>, slot: usize) -> Result<u32, LzxError> {
        let offset = match slot {
            0 => self.r0,
            1 => {
                let o = self.r1;
                self.r1 = self.r0;
                self.r0 = o;
                o
            }
            2 => {
                let o = self.r2;
                self.r2 = self.r0;
                self.r0 = o;
                o
            }
            _ => {
                let extra = *EXTRA_BITS.get(slot).ok_or(LzxError::SomethingBad("position slot out of range"))?;
                let base = *POSITION_BASE.get(slot).ok_or(LzxError::SomethingBad("position slot out of range"))?;
                let o = match self.block_kind {
                    Some(BlockKind::Aligned) => {
                        if extra > 3 {
                            let verbatim = bb.read_bits(extra - 3)?;
                            let aligned_tree = self
                                .aligned_tree
                                .as_ref()
                                .ok_or(LzxError::SomethingBad("aligned tree missing"))?;
                            let aligned_sym = aligned_tree.decode(bb)? as u32;
                            base - 2 + (verbatim << 3) + aligned_sym
                        } else if extra == 3 {
                            let aligned_tree = self
                                .aligned_tree
                                .as_ref()
                                .ok_or(LzxError::SomethingBad("aligned tree missing"))?;
                            let aligned_sym = aligned_tree.decode(bb)? as u32;
                            base - 2 + aligned_sym
                        } else if extra > 0 {
                            let verbatim = bb.read_bits(extra)?;
                            base - 2 + verbatim
                        } else {
                            1
                        }
                    }
                    _ => {
                        let verbatim = bb.read_bits(extra)?;
                        base - 2 + verbatim
                    }
                };
                self.r2 = self.r1;
                self.r1 = self.r0;
                self.r0 = o;
                o
            }
        };
        Ok(offset)
    }

    fn copy_match(&mut self, offset: usize, length: usize) -> Result<(), LzxError> {
        let mask = WINDOW_SIZE - 1;
        let posn = self.window_posn & mask;
        if posn + length > WINDOW_SIZE {
            // A single run may not straddle the window end (§4.3); the
            // *source* side of a match is explicitly allowed to wrap, but
            // the destination write sequence within one run is not.
            return Err(LzxError::BufferOverrun);
        }
        for i in 0..length {
            let dst = posn + i;
            let src = if posn + i >= offset {
                posn + i - offset
            } else {
                posn + i + WINDOW_SIZE - offset
            };
            let byte = self.window[src & mask];
            self.window[dst] = byte;
        }
        self.window_posn = (posn + length) & mask;
        Ok(())
    }

    fn emit_frame(&self, sink: &mut Vec<u8>, frame_size: usize) {
        let mask = WINDOW_SIZE - 1;
        let end = if self.window_posn == 0 {
            WINDOW_SIZE
        } else {
            self.window_posn
        };
        let start = (end + WINDOW_SIZE - frame_size) & mask;
        if start + frame_size <= WINDOW_SIZE {
            sink.extend_from_slice(&self.window[start..start + frame_size]);
        } else {
            let first = WINDOW_SIZE - start;
            sink.extend_from_slice(&self.window[start..]);
            sink.extend_from_slice(&self.window[..frame_size - first]);
        }
    }
}

impl Default for LzxDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_decoder_has_unit_lru() {
        let d = LzxDecoder::new();
        assert_eq!(d.r0, 1);
        assert_eq!(d.r1, 1);
        assert_eq!(d.r2, 1);
        assert!(!d.intel_e8_requested());
    }

    #[test]
    fn posn_slots_formula() {
        assert_eq!(posn_slots(16), 32);
        assert_eq!(posn_slots(20), 42);
        assert_eq!(posn_slots(21), 50);
    }

    #[test]
    fn copy_match_wraps_window_source() {
        // §8: "window wraparound during a long match: output matches a
        // reference constructed by simple byte-by-byte copy with modular
        // indexing." `window_posn` sits near the start of the window, and
        // the match's source offset reaches back past index 0, so the
        // source side must wrap to the end of the window.
        let mut d = LzxDecoder::new();
        d.window[WINDOW_SIZE - 3] = 10;
        d.window[WINDOW_SIZE - 2] = 20;
        d.window[WINDOW_SIZE - 1] = 30;
        d.window_posn = 2;
        d.copy_match(5, 3).unwrap();
        assert_eq!(&d.window[2..5], &[10, 20, 30]);
    }

    #[test]
    fn copy_match_handles_rle_overlap() {
        // §8 / §4.3: "offset < length" requires byte-by-byte forward
        // repetition, since the source catches up with bytes the same copy
        // already wrote.
        let mut d = LzxDecoder::new();
        d.window[0] = 7;
        d.window_posn = 1;
        d.copy_match(1, 5).unwrap();
        assert_eq!(&d.window[0..6], &[7, 7, 7, 7, 7, 7]);
    }

    #[test]
    fn uncompressed_block_roundtrips_bytes() {
        // block_kind=3 (uncompressed), block_length=4, r0/r1/r2=1,1,1 (LE),
        // then 4 payload bytes. No intel flag bit.
        //
        // Consumed bit order: intel(1)=0, kind(3)=011, length_hi(16)=0,
        // length_lo(8)=00000100, padded to a 32-bit (two-group) boundary.
        // Each 16-bit group's first 8 consumed bits come from the *second*
        // file byte (the group's high byte) and the next 8 from the *first*
        // file byte (the group's low byte) — see `BitBuffer::ensure`.
        // This works out to file bytes [0x00, 0x30, 0x40, 0x00].
        let mut source = vec![0x00u8, 0x30u8, 0x40u8, 0x00u8];
        source.extend_from_slice(&1u32.to_le_bytes());
        source.extend_from_slice(&1u32.to_le_bytes());
        source.extend_from_slice(&1u32.to_le_bytes());
        source.extend_from_slice(&[10, 20, 30, 40]);

        let mut decoder = LzxDecoder::new();
        let mut sink = Vec::new();
        let block_size = source.len();
        decoder
            .decompress(&source, 0, block_size, &mut sink, 4)
            .unwrap();
        assert_eq!(sink, vec![10, 20, 30, 40]);
    }
}
