//! Frame check sequence of S101
//!
//! Every frame body is followed by two bytes: the complemented CRC-CCITT of
//! the unescaped body, least significant byte first. Running the same CRC
//! over body and trailer together always leaves [`RESIDUE`].

use once_cell::sync::Lazy;

use crate::error::{EmberError, EmberResult};

const SEED: u16 = 0xFFFF;
/// Reflected form of the CCITT polynomial 0x1021
const POLYNOMIAL: u16 = 0x8408;

/// Register value after a body and its own trailer
pub const RESIDUE: u16 = 0xF0B8;

static TABLE: Lazy<[u16; 256]> = Lazy::new(|| {
    let mut table = [0u16; 256];
    for (index, entry) in table.iter_mut().enumerate() {
        *entry = (0..8).fold(index as u16, |acc, _| {
            if acc & 1 != 0 {
                (acc >> 1) ^ POLYNOMIAL
            } else {
                acc >> 1
            }
        });
    }
    table
});

/// CRC register fed byte by byte while a frame is unescaped
#[derive(Debug, Clone, Copy)]
pub struct FrameCrc {
    register: u16,
}

impl FrameCrc {
    pub fn new() -> Self {
        Self { register: SEED }
    }

    /// Trailer bytes to append after `body`
    pub fn trailer(body: &[u8]) -> [u8; 2] {
        let mut crc = Self::new();
        crc.push_all(body);
        (!crc.register).to_le_bytes()
    }

    /// Start over for the next frame
    pub fn reset(&mut self) {
        self.register = SEED;
    }

    pub fn push(&mut self, byte: u8) {
        let index = (self.register ^ u16::from(byte)) & 0xFF;
        self.register = (self.register >> 8) ^ TABLE[usize::from(index)];
    }

    pub fn push_all(&mut self, bytes: &[u8]) {
        bytes.iter().for_each(|&byte| self.push(byte));
    }

    /// Check a register that has seen a whole frame, trailer included
    ///
    /// # Errors
    /// `FrameInvalid` when the register does not hold [`RESIDUE`].
    pub fn validate(&self) -> EmberResult<()> {
        if self.register == RESIDUE {
            return Ok(());
        }
        Err(EmberError::FrameInvalid(format!(
            "Frame check failed: register 0x{:04X}, expected 0x{:04X}",
            self.register, RESIDUE
        )))
    }

    pub fn value(&self) -> u16 {
        self.register
    }
}

impl Default for FrameCrc {
    fn default() -> Self {
        Self::new()
    }
}
