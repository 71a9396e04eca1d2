//! S101 frame layout and encoding

use crate::crc::FrameCrc;
use crate::error::{EmberError, EmberResult};
use bytes::{BufMut, Bytes, BytesMut};

/// Begin of frame
pub const BOF: u8 = 0xFE;
/// End of frame
pub const EOF: u8 = 0xFF;
/// Escape marker
pub const CE: u8 = 0xFD;
/// Value XORed into an escaped byte
pub const XOR: u8 = 0x20;
/// Bytes at or above this value are escaped
pub const ESCAPE_THRESHOLD: u8 = 0xF8;

/// Message type of every Ember+ frame
pub const MESSAGE_TYPE_EMBER: u8 = 0x0E;
/// S101 protocol version
pub const VERSION: u8 = 0x01;
/// Glow DTD identifier
pub const DTD_GLOW: u8 = 0x01;
/// Application bytes sent with Glow packages (DTD version 2.50)
pub const GLOW_APP_BYTES: [u8; 2] = [0x32, 0x02];
/// Default maximum payload carried by one package
pub const MAX_PACKAGE_PAYLOAD: usize = 1024;

/// Size of slot, message type, command and version
const COMMON_HEADER_LEN: usize = 4;
/// Size of the EmBER package header up to the application-byte count
const PACKAGE_HEADER_LEN: usize = COMMON_HEADER_LEN + 3;

/// S101 command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCommand {
    /// EmBER package
    Ember,
    /// Keep-alive request
    KeepAliveRequest,
    /// Keep-alive response
    KeepAliveResponse,
}

impl FrameCommand {
    /// Get command from its wire value
    pub fn from_byte(byte: u8) -> EmberResult<Self> {
        match byte {
            0x00 => Ok(FrameCommand::Ember),
            0x01 => Ok(FrameCommand::KeepAliveRequest),
            0x02 => Ok(FrameCommand::KeepAliveResponse),
            other => Err(EmberError::FrameInvalid(format!(
                "Unknown S101 command 0x{:02X}",
                other
            ))),
        }
    }

    /// Get the wire value
    pub fn to_byte(self) -> u8 {
        match self {
            FrameCommand::Ember => 0x00,
            FrameCommand::KeepAliveRequest => 0x01,
            FrameCommand::KeepAliveResponse => 0x02,
        }
    }
}

/// Package flags of an EmBER frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackageFlags(u8);

impl PackageFlags {
    /// First package of a message
    pub const FIRST: PackageFlags = PackageFlags(0x80);
    /// Last package of a message
    pub const LAST: PackageFlags = PackageFlags(0x40);
    /// Package without payload
    pub const EMPTY: PackageFlags = PackageFlags(0x20);
    /// A message carried in one package
    pub const SINGLE: PackageFlags = PackageFlags(0xC0);

    /// Create flags from the wire byte
    pub const fn from_bits(bits: u8) -> Self {
        PackageFlags(bits)
    }

    /// Get the wire byte
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if all flags in `other` are set
    pub const fn contains(self, other: PackageFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check for the first-package flag
    pub fn is_first(self) -> bool {
        self.contains(Self::FIRST)
    }

    /// Check for the last-package flag
    pub fn is_last(self) -> bool {
        self.contains(Self::LAST)
    }

    /// Check for the empty-package flag
    pub fn is_empty(self) -> bool {
        self.contains(Self::EMPTY)
    }
}

impl std::ops::BitOr for PackageFlags {
    type Output = PackageFlags;

    fn bitor(self, rhs: PackageFlags) -> PackageFlags {
        PackageFlags(self.0 | rhs.0)
    }
}

/// Parsed header of an unescaped frame body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct S101Header {
    /// Slot identifier
    pub slot: u8,
    /// Frame command
    pub command: FrameCommand,
    /// Package flags (EmBER frames only)
    pub flags: PackageFlags,
    /// DTD identifier (EmBER frames only)
    pub dtd: u8,
    /// Header size; the payload follows at this offset
    pub header_len: usize,
}

impl S101Header {
    /// Parse the header at the start of `body` (checksum excluded)
    ///
    /// # Error Handling
    /// Returns `FrameInvalid` for a short body, a message type other than
    /// Ember+, or an unknown command.
    pub fn parse(body: &[u8]) -> EmberResult<Self> {
        if body.len() < COMMON_HEADER_LEN {
            return Err(EmberError::FrameInvalid(format!(
                "Frame body too short: {} bytes",
                body.len()
            )));
        }
        if body[1] != MESSAGE_TYPE_EMBER {
            return Err(EmberError::FrameInvalid(format!(
                "Unexpected message type 0x{:02X}",
                body[1]
            )));
        }
        if body[3] != VERSION {
            log::debug!("S101 frame with version 0x{:02X}", body[3]);
        }

        let command = FrameCommand::from_byte(body[2])?;
        if command != FrameCommand::Ember {
            return Ok(Self {
                slot: body[0],
                command,
                flags: PackageFlags::default(),
                dtd: 0,
                header_len: COMMON_HEADER_LEN,
            });
        }

        if body.len() < PACKAGE_HEADER_LEN {
            return Err(EmberError::FrameInvalid(
                "EmBER package header truncated".to_string(),
            ));
        }
        let header_len = PACKAGE_HEADER_LEN + body[PACKAGE_HEADER_LEN - 1] as usize;
        if body.len() < header_len {
            return Err(EmberError::FrameInvalid(
                "EmBER application bytes truncated".to_string(),
            ));
        }

        Ok(Self {
            slot: body[0],
            command,
            flags: PackageFlags::from_bits(body[4]),
            dtd: body[5],
            header_len,
        })
    }
}

fn put_escaped(out: &mut BytesMut, byte: u8) {
    if byte >= ESCAPE_THRESHOLD {
        out.put_u8(CE);
        out.put_u8(byte ^ XOR);
    } else {
        out.put_u8(byte);
    }
}

/// Wrap an unescaped body into a complete frame
pub fn encode_frame(body: &[u8]) -> Bytes {
    let crc = FrameCrc::trailer(body);
    let mut out = BytesMut::with_capacity(body.len() + body.len() / 8 + 6);

    out.put_u8(BOF);
    for &byte in body.iter().chain(crc.iter()) {
        put_escaped(&mut out, byte);
    }
    out.put_u8(EOF);

    out.freeze()
}

/// Encode one EmBER package
///
/// # Arguments
/// * `slot` - Slot identifier
/// * `flags` - Package flags
/// * `payload` - BER payload bytes carried by this package
pub fn encode_package(slot: u8, flags: PackageFlags, payload: &[u8]) -> Bytes {
    let mut body = Vec::with_capacity(PACKAGE_HEADER_LEN + GLOW_APP_BYTES.len() + payload.len());
    body.extend_from_slice(&[
        slot,
        MESSAGE_TYPE_EMBER,
        FrameCommand::Ember.to_byte(),
        VERSION,
        flags.bits(),
        DTD_GLOW,
        GLOW_APP_BYTES.len() as u8,
    ]);
    body.extend_from_slice(&GLOW_APP_BYTES);
    body.extend_from_slice(payload);
    encode_frame(&body)
}

/// Split a message into packages of at most `max_per_package` payload bytes
///
/// An empty message becomes a single package flagged empty.
pub fn encode_message(slot: u8, payload: &[u8], max_per_package: usize) -> Vec<Bytes> {
    if payload.is_empty() {
        return vec![encode_package(
            slot,
            PackageFlags::SINGLE | PackageFlags::EMPTY,
            &[],
        )];
    }

    let chunks: Vec<&[u8]> = payload.chunks(max_per_package.max(1)).collect();
    let last = chunks.len() - 1;
    chunks
        .iter()
        .enumerate()
        .map(|(index, chunk)| {
            let mut flags = PackageFlags::default();
            if index == 0 {
                flags = flags | PackageFlags::FIRST;
            }
            if index == last {
                flags = flags | PackageFlags::LAST;
            }
            encode_package(slot, flags, chunk)
        })
        .collect()
}

fn encode_command(slot: u8, command: FrameCommand) -> Bytes {
    encode_frame(&[slot, MESSAGE_TYPE_EMBER, command.to_byte(), VERSION])
}

/// Encode a keep-alive request frame
pub fn encode_keep_alive_request(slot: u8) -> Bytes {
    encode_command(slot, FrameCommand::KeepAliveRequest)
}

/// Encode a keep-alive response frame
pub fn encode_keep_alive_response(slot: u8) -> Bytes {
    encode_command(slot, FrameCommand::KeepAliveResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        let frame = encode_frame(&[0x00, 0xF8, 0xFE, 0x10]);
        assert_eq!(frame[0], BOF);
        assert_eq!(&frame[1..6], &[0x00, CE, 0xD8, CE, 0xDE]);
        assert_eq!(*frame.last().unwrap(), EOF);
        assert!(frame[1..frame.len() - 1].iter().all(|&b| b != BOF && b != EOF));
    }

    #[test]
    fn test_keep_alive_layout() {
        let frame = encode_keep_alive_request(0);
        assert_eq!(&frame[..5], &[BOF, 0x00, 0x0E, 0x01, 0x01]);
    }

    #[test]
    fn test_header_parse() {
        let body = [0x00, 0x0E, 0x00, 0x01, 0xC0, 0x01, 0x02, 0x32, 0x02, 0x60];
        let header = S101Header::parse(&body).unwrap();
        assert_eq!(header.command, FrameCommand::Ember);
        assert_eq!(header.flags, PackageFlags::SINGLE);
        assert_eq!(header.dtd, DTD_GLOW);
        assert_eq!(header.header_len, 9);

        let header = S101Header::parse(&[0x00, 0x0E, 0x02, 0x01]).unwrap();
        assert_eq!(header.command, FrameCommand::KeepAliveResponse);
    }

    #[test]
    fn test_header_parse_errors() {
        assert!(S101Header::parse(&[0x00, 0x0E]).is_err());
        assert!(S101Header::parse(&[0x00, 0x0F, 0x00, 0x01]).is_err());
        assert!(S101Header::parse(&[0x00, 0x0E, 0x07, 0x01]).is_err());
        assert!(S101Header::parse(&[0x00, 0x0E, 0x00, 0x01, 0xC0, 0x01, 0x04, 0x32]).is_err());
    }

    #[test]
    fn test_message_split() {
        let payload = [0x11u8; 10];
        let packages = encode_message(0, &payload, 4);
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0][5], 0x80);
        assert_eq!(packages[1][5], 0x00);
        assert_eq!(packages[2][5], 0x40);

        let single = encode_message(0, &payload, 64);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0][5], 0xC0);

        let empty = encode_message(0, &[], 64);
        assert_eq!(empty[0][5], 0xE0);
    }

    #[test]
    fn test_flags() {
        let flags = PackageFlags::from_bits(0xA0);
        assert!(flags.is_first());
        assert!(!flags.is_last());
        assert!(flags.is_empty());
    }
}
