//! Frame assembly for the nibble-wide loading channel.
//!
//! A W-bit pattern crosses a 4-bit channel in `ceil(W/4)` beats. A 2-bit
//! cycle selector says which nibble a beat carries, and the final beat also
//! carries the bank select and slot address used by writes. This module only
//! reassembles frames; the engine never sees partial patterns.

use crate::domain::{CamError, Pattern, MAX_PATTERN_WIDTH};

/// One transfer on the narrow channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat {
    pub cycle: u8,
    pub nibble: u8,
    /// Read only on the final cycle
    pub bank: usize,
    /// Read only on the final cycle
    pub address: usize,
}

impl Beat {
    pub fn data(cycle: u8, nibble: u8) -> Self {
        Self {
            cycle,
            nibble,
            bank: 0,
            address: 0,
        }
    }
}

/// A fully assembled pattern with its target slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub pattern: Pattern,
    pub bank: usize,
    pub address: usize,
}

#[derive(Debug, Clone)]
pub struct FrameAssembler {
    width: u8,
    partial: u16,
}

impl FrameAssembler {
    pub fn new(width: u8) -> Self {
        Self {
            width: width.clamp(1, MAX_PATTERN_WIDTH),
            partial: 0,
        }
    }

    /// Beats per frame
    pub fn cycles(&self) -> u8 {
        self.width.div_ceil(4)
    }

    /// Place `nibble` at `cycle` and return the pattern assembled so far
    pub fn assemble(&mut self, nibble: u8, cycle: u8) -> Result<Pattern, CamError> {
        if nibble > 0x0F {
            return Err(CamError::NibbleOutOfRange { nibble });
        }
        if cycle >= self.cycles() {
            return Err(CamError::FrameCycleOutOfRange {
                cycle,
                width: self.width,
            });
        }
        let shift = u32::from(cycle) * 4;
        self.partial = (self.partial & !(0x000F << shift)) | (u16::from(nibble) << shift);
        Ok(Pattern(self.partial).truncate(self.width))
    }

    /// True when `cycle` is the last beat of a frame
    pub fn is_frame_complete(&self, cycle: u8) -> bool {
        cycle.checked_add(1) == Some(self.cycles())
    }

    /// Feed one beat; yields the frame on its final cycle and resets
    pub fn load(&mut self, beat: Beat) -> Result<Option<Frame>, CamError> {
        let pattern = self.assemble(beat.nibble, beat.cycle)?;
        if !self.is_frame_complete(beat.cycle) {
            return Ok(None);
        }
        self.partial = 0;
        Ok(Some(Frame {
            pattern,
            bank: beat.bank,
            address: beat.address,
        }))
    }

    /// Split a pattern into the beats that would carry it
    pub fn beats_for(&self, pattern: Pattern, bank: usize, address: usize) -> Vec<Beat> {
        (0..self.cycles())
            .map(|cycle| Beat {
                cycle,
                nibble: ((pattern.bits() >> (u32::from(cycle) * 4)) & 0x0F) as u8,
                bank,
                address,
            })
            .collect()
    }

    pub fn reset(&mut self) {
        self.partial = 0;
    }
}
