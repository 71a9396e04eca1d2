//! S101 deframing and message reassembly
//!
//! The reader unescapes frames into a caller-supplied buffer, checks their
//! checksum and concatenates the payload of first/middle/last packages into
//! one message. Framing errors are reported as events; they discard the
//! message in flight but never stop the reader.

use crate::crc::FrameCrc;
use crate::error::EmberError;
use crate::frame::{BOF, CE, EOF, ESCAPE_THRESHOLD, FrameCommand, PackageFlags, S101Header, XOR};
use crate::statistics::FramingStatistics;

/// Number of leading frame bytes kept aside for header parsing
const HEAD_CAPACITY: usize = 16;
/// Smallest valid frame: common header plus checksum
const MIN_FRAME_LEN: usize = 4 + 2;

/// Output of the framing reader
#[derive(Debug, Clone, PartialEq)]
pub enum FramingEvent<'a> {
    /// A complete, checksum-valid message payload
    Package(&'a [u8]),
    /// Keep-alive request from the given slot
    KeepAliveRequest { slot: u8 },
    /// Keep-alive response from the given slot
    KeepAliveResponse { slot: u8 },
    /// A framing error; the message in flight was discarded
    Error(EmberError),
}

/// Deframing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Waiting for a begin-of-frame marker
    Idle,
    /// Inside a frame
    Frame,
    /// After an escape marker
    Escape,
}

/// Incremental S101 reader over a reassembly buffer
///
/// Frames are unescaped directly behind the part of the message already
/// reassembled, so the buffer must hold a complete message plus the
/// header and checksum of one package. Writes never go past the buffer; a
/// message that does not fit is reported as
/// [`EmberError::BufferOverflow`] and dropped.
///
/// # Usage Example
///
/// ```rust
/// use ember_framing::{encode_message, FramingEvent, FramingReader};
///
/// let mut reader = FramingReader::new(vec![0u8; 256]);
/// let mut received = Vec::new();
/// for frame in encode_message(0, &[0x60, 0x00], 64) {
///     reader.read_bytes(&frame, |event| {
///         if let FramingEvent::Package(payload) = event {
///             received.extend_from_slice(payload);
///         }
///     });
/// }
/// assert_eq!(received, vec![0x60, 0x00]);
/// ```
#[derive(Debug)]
pub struct FramingReader<B> {
    buffer: B,
    state: FrameState,
    crc: FrameCrc,
    head: [u8; HEAD_CAPACITY],
    frame_len: usize,
    frame_overflow: bool,
    message_len: usize,
    in_message: bool,
    statistics: FramingStatistics,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> FramingReader<B> {
    /// Create a reader that reassembles messages in `buffer`
    pub fn new(buffer: B) -> Self {
        Self {
            buffer,
            state: FrameState::Idle,
            crc: FrameCrc::new(),
            head: [0; HEAD_CAPACITY],
            frame_len: 0,
            frame_overflow: false,
            message_len: 0,
            in_message: false,
            statistics: FramingStatistics::new(),
        }
    }

    /// Size of the reassembly buffer
    pub fn capacity(&self) -> usize {
        self.buffer.as_ref().len()
    }

    /// Get framing statistics
    pub fn statistics(&self) -> &FramingStatistics {
        &self.statistics
    }

    /// Check if a multi-package message is being reassembled
    pub fn in_message(&self) -> bool {
        self.in_message
    }

    /// Drop all partial frame and message state
    ///
    /// Statistics are kept.
    pub fn reset(&mut self) {
        self.state = FrameState::Idle;
        self.crc.reset();
        self.frame_len = 0;
        self.frame_overflow = false;
        self.message_len = 0;
        self.in_message = false;
    }

    /// Give back the reassembly buffer
    pub fn into_buffer(self) -> B {
        self.buffer
    }

    /// Feed raw link bytes
    ///
    /// # Arguments
    /// * `bytes` - Bytes as received from the link, in any chunking
    /// * `on_event` - Called for every complete message, keep-alive and error
    pub fn read_bytes<F>(&mut self, bytes: &[u8], mut on_event: F)
    where
        F: FnMut(FramingEvent<'_>),
    {
        for &byte in bytes {
            match self.state {
                FrameState::Idle => {
                    if byte == BOF {
                        self.begin_frame();
                    }
                }
                FrameState::Frame => match byte {
                    BOF => {
                        self.statistics.aborted_frames += 1;
                        self.reject_frame(
                            EmberError::FrameInvalid("Frame aborted by begin-of-frame".to_string()),
                            &mut on_event,
                        );
                        self.begin_frame();
                    }
                    EOF => self.finish_frame(&mut on_event),
                    CE => self.state = FrameState::Escape,
                    value if value >= ESCAPE_THRESHOLD => {
                        self.statistics.invalid_escapes += 1;
                        self.reject_frame(
                            EmberError::FrameInvalid(format!("Unescaped byte 0x{:02X} in frame", value)),
                            &mut on_event,
                        );
                    }
                    value => self.push_byte(value),
                },
                FrameState::Escape => {
                    if byte >= ESCAPE_THRESHOLD {
                        self.statistics.invalid_escapes += 1;
                        self.reject_frame(
                            EmberError::FrameInvalid(format!("Invalid escape of 0x{:02X}", byte)),
                            &mut on_event,
                        );
                        if byte == BOF {
                            self.begin_frame();
                        }
                    } else {
                        self.push_byte(byte ^ XOR);
                        self.state = FrameState::Frame;
                    }
                }
            }
        }
    }

    fn begin_frame(&mut self) {
        self.state = FrameState::Frame;
        self.crc.reset();
        self.frame_len = 0;
        self.frame_overflow = false;
    }

    /// Store one unescaped frame byte behind the reassembled message
    fn push_byte(&mut self, value: u8) {
        self.crc.push(value);
        if self.frame_len < HEAD_CAPACITY {
            self.head[self.frame_len] = value;
        }

        let offset = self.message_len + self.frame_len;
        match self.buffer.as_mut().get_mut(offset) {
            Some(slot) => *slot = value,
            None => self.frame_overflow = true,
        }
        self.frame_len += 1;

        // Flags are known: a first package starts over at the buffer start
        if self.frame_len == 5 {
            self.check_first_package();
        }
    }

    fn check_first_package(&mut self) {
        let is_package = self.head[2] == FrameCommand::Ember.to_byte();
        let flags = PackageFlags::from_bits(self.head[4]);
        if !is_package || !flags.is_first() || !self.in_message {
            return;
        }

        log::warn!(
            "Incomplete message of {} bytes replaced by a new first package",
            self.message_len
        );
        self.statistics.dropped_messages += 1;
        self.in_message = false;
        self.message_len = 0;

        let buffer = self.buffer.as_mut();
        let len = self.frame_len.min(buffer.len());
        buffer[..len].copy_from_slice(&self.head[..len]);
        self.frame_overflow = len < self.frame_len;
    }

    fn discard_message(&mut self) {
        self.message_len = 0;
        self.in_message = false;
    }

    fn reject_frame<F>(&mut self, error: EmberError, on_event: &mut F)
    where
        F: FnMut(FramingEvent<'_>),
    {
        log::warn!("Discarding S101 frame: {}", error);
        self.state = FrameState::Idle;
        self.discard_message();
        on_event(FramingEvent::Error(error));
    }

    fn finish_frame<F>(&mut self, on_event: &mut F)
    where
        F: FnMut(FramingEvent<'_>),
    {
        self.state = FrameState::Idle;

        if self.frame_len < MIN_FRAME_LEN {
            self.statistics.invalid_frames += 1;
            self.reject_frame(
                EmberError::FrameInvalid(format!("Frame too short: {} bytes", self.frame_len)),
                on_event,
            );
            return;
        }
        if let Err(e) = self.crc.validate() {
            self.statistics.crc_errors += 1;
            self.reject_frame(e, on_event);
            return;
        }
        self.statistics.frames_received += 1;

        let body_len = self.frame_len - 2;
        let parsed = if self.frame_overflow {
            S101Header::parse(&self.head[..body_len.min(HEAD_CAPACITY)])
        } else {
            S101Header::parse(&self.buffer.as_ref()[self.message_len..self.message_len + body_len])
        };
        let header = match parsed {
            Ok(header) => header,
            Err(e) => {
                self.statistics.invalid_frames += 1;
                self.reject_frame(e, on_event);
                return;
            }
        };

        match header.command {
            FrameCommand::KeepAliveRequest => {
                self.statistics.keep_alives_received += 1;
                log::trace!("Keep-alive request on slot {}", header.slot);
                on_event(FramingEvent::KeepAliveRequest { slot: header.slot });
            }
            FrameCommand::KeepAliveResponse => {
                self.statistics.keep_alives_received += 1;
                log::trace!("Keep-alive response on slot {}", header.slot);
                on_event(FramingEvent::KeepAliveResponse { slot: header.slot });
            }
            FrameCommand::Ember => self.finish_package(header, body_len, on_event),
        }
    }

    fn finish_package<F>(&mut self, header: S101Header, body_len: usize, on_event: &mut F)
    where
        F: FnMut(FramingEvent<'_>),
    {
        if self.frame_overflow {
            self.statistics.overflows += 1;
            let capacity = self.capacity();
            self.reject_frame(EmberError::BufferOverflow { capacity }, on_event);
            return;
        }

        let flags = header.flags;
        if !flags.is_first() && !self.in_message {
            self.statistics.dropped_packages += 1;
            log::debug!("Dropping continuation package outside a message");
            return;
        }

        let payload_len = if flags.is_empty() {
            0
        } else {
            body_len - header.header_len
        };
        let start = self.message_len + header.header_len;
        self.buffer
            .as_mut()
            .copy_within(start..start + payload_len, self.message_len);
        self.message_len += payload_len;
        self.in_message = true;
        self.statistics.packages_received += 1;
        log::trace!(
            "S101 package flags=0x{:02X}, {} payload bytes",
            flags.bits(),
            payload_len
        );

        if flags.is_last() {
            let len = self.message_len;
            self.discard_message();
            self.statistics.messages_received += 1;
            on_event(FramingEvent::Package(&self.buffer.as_ref()[..len]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{
        encode_frame, encode_keep_alive_request, encode_message, encode_package,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Received {
        Package(Vec<u8>),
        Request(u8),
        Response(u8),
        Error(EmberError),
    }

    fn feed<B: AsRef<[u8]> + AsMut<[u8]>>(reader: &mut FramingReader<B>, bytes: &[u8]) -> Vec<Received> {
        let mut received = Vec::new();
        reader.read_bytes(bytes, |event| {
            received.push(match event {
                FramingEvent::Package(payload) => Received::Package(payload.to_vec()),
                FramingEvent::KeepAliveRequest { slot } => Received::Request(slot),
                FramingEvent::KeepAliveResponse { slot } => Received::Response(slot),
                FramingEvent::Error(e) => Received::Error(e),
            })
        });
        received
    }

    fn concat(frames: &[bytes::Bytes]) -> Vec<u8> {
        frames.iter().flat_map(|frame| frame.iter().copied()).collect()
    }

    #[test]
    fn test_single_package() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let wire = concat(&encode_message(0, &[0x60, 0x03, 0x01, 0x02, 0x03], 64));
        assert_eq!(
            feed(&mut reader, &wire),
            vec![Received::Package(vec![0x60, 0x03, 0x01, 0x02, 0x03])]
        );
        assert_eq!(reader.statistics().messages_received, 1);
    }

    #[test]
    fn test_multi_package_byte_at_a_time() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let wire = concat(&encode_message(0, &payload, 50));

        let mut reader = FramingReader::new(vec![0u8; 512]);
        let mut received = Vec::new();
        for byte in &wire {
            received.extend(feed(&mut reader, std::slice::from_ref(byte)));
        }
        assert_eq!(received, vec![Received::Package(payload)]);
        assert_eq!(reader.statistics().packages_received, 6);
    }

    #[test]
    fn test_reserved_bytes_in_payload() {
        let payload = [0xF8, 0xFD, 0xFE, 0xFF, 0x00];
        let mut reader = FramingReader::new([0u8; 64]);
        let wire = concat(&encode_message(1, &payload, 64));
        assert_eq!(feed(&mut reader, &wire), vec![Received::Package(payload.to_vec())]);
    }

    #[test]
    fn test_corrupted_crc_then_recovery() {
        let mut reader = FramingReader::new(vec![0u8; 64]);

        let mut bad = encode_package(0, PackageFlags::SINGLE, &[0x01, 0x02]).to_vec();
        let crc_index = bad.len() - 2;
        bad[crc_index] ^= 0x01;
        let received = feed(&mut reader, &bad);
        assert!(matches!(received.as_slice(), [Received::Error(EmberError::FrameInvalid(_))]));
        assert_eq!(reader.statistics().crc_errors, 1);

        let good = encode_package(0, PackageFlags::SINGLE, &[0x03]);
        assert_eq!(feed(&mut reader, &good), vec![Received::Package(vec![0x03])]);
    }

    #[test]
    fn test_overflow_discards_message() {
        let mut reader = FramingReader::new([0u8; 16]);

        let wire = concat(&encode_message(0, &[0x42; 40], 64));
        let received = feed(&mut reader, &wire);
        assert_eq!(received, vec![Received::Error(EmberError::BufferOverflow { capacity: 16 })]);

        let wire = concat(&encode_message(0, &[0x01, 0x02, 0x03, 0x04], 64));
        assert_eq!(
            feed(&mut reader, &wire),
            vec![Received::Package(vec![0x01, 0x02, 0x03, 0x04])]
        );
        assert_eq!(reader.statistics().overflows, 1);
    }

    #[test]
    fn test_keep_alive_inside_message() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let packages = encode_message(0, &[0x10, 0x20, 0x30, 0x40], 2);

        assert!(feed(&mut reader, &packages[0]).is_empty());
        assert!(reader.in_message());
        assert_eq!(feed(&mut reader, &encode_keep_alive_request(3)), vec![Received::Request(3)]);
        assert_eq!(
            feed(&mut reader, &packages[1]),
            vec![Received::Package(vec![0x10, 0x20, 0x30, 0x40])]
        );
    }

    #[test]
    fn test_orphan_continuation_dropped() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let last = encode_package(0, PackageFlags::LAST, &[0x01]);
        assert!(feed(&mut reader, &last).is_empty());
        assert_eq!(reader.statistics().dropped_packages, 1);
    }

    #[test]
    fn test_new_first_package_replaces_incomplete_message() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let first = encode_package(0, PackageFlags::FIRST, &[0xAA, 0xBB, 0xCC]);
        assert!(feed(&mut reader, &first).is_empty());

        let single = encode_package(0, PackageFlags::SINGLE, &[0x01]);
        assert_eq!(feed(&mut reader, &single), vec![Received::Package(vec![0x01])]);
        assert_eq!(reader.statistics().dropped_messages, 1);
    }

    #[test]
    fn test_invalid_escape() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let received = feed(&mut reader, &[BOF, 0x00, CE, 0xF9, 0x00, EOF]);
        assert!(matches!(received.as_slice(), [Received::Error(EmberError::FrameInvalid(_))]));
        assert_eq!(reader.statistics().invalid_escapes, 1);
    }

    #[test]
    fn test_garbage_between_frames_ignored() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let mut wire = vec![0x00, 0x13, 0x37];
        wire.extend_from_slice(&encode_frame(&[0x00, 0x0E, 0x02, 0x01]));
        assert_eq!(feed(&mut reader, &wire), vec![Received::Response(0)]);
    }

    #[test]
    fn test_empty_message() {
        let mut reader = FramingReader::new(vec![0u8; 64]);
        let wire = concat(&encode_message(0, &[], 64));
        assert_eq!(feed(&mut reader, &wire), vec![Received::Package(vec![])]);
    }
}
