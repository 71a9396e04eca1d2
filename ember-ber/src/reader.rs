//! Incremental BER structural reader
//!
//! The reader accepts input in arbitrary pieces (down to single bytes) and
//! drives a [`BerHandler`] with three kinds of events:
//!
//! - a constructed value was entered ([`BerHandler::on_container_entered`])
//! - a primitive value is complete ([`BerHandler::on_item_ready`])
//! - a constructed value was left ([`BerHandler::on_container_left`])
//!
//! The events produced for a byte stream do not depend on how the stream is
//! split into calls. Definite-length containers are closed when their last
//! content byte has been consumed, indefinite-length containers when their
//! end-of-contents marker arrives.
//!
//! # Error Handling
//!
//! Any structural error (or error returned by the handler) moves the reader
//! into the faulted state. A faulted reader rejects further input with
//! [`EmberError::ReaderFaulted`] until [`BerReader::reset`] is called.

use crate::error::{EmberError, EmberResult};
use crate::types::{BerLength, BerTag, DecodeStatus};
use crate::value::{self, BerValue};
use ember_core::limits::{EMBER_MAX_TREE_DEPTH, MAX_ITEM_LENGTH};

/// Reader limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerReaderConfig {
    /// Maximum number of simultaneously open containers
    pub max_depth: usize,
    /// Maximum size of a single primitive value
    pub max_item_length: usize,
}

impl Default for BerReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: EMBER_MAX_TREE_DEPTH,
            max_item_length: MAX_ITEM_LENGTH,
        }
    }
}

impl BerReaderConfig {
    /// Set the maximum container depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum primitive value size
    pub fn with_max_item_length(mut self, max_item_length: usize) -> Self {
        self.max_item_length = max_item_length;
        self
    }
}

/// A complete primitive value
///
/// The content bytes are borrowed from the reader and only valid for the
/// duration of the [`BerHandler::on_item_ready`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BerItem<'a> {
    tag: BerTag,
    bytes: &'a [u8],
}

impl<'a> BerItem<'a> {
    /// Create an item from a tag and its content bytes
    pub fn new(tag: BerTag, bytes: &'a [u8]) -> Self {
        Self { tag, bytes }
    }

    /// Item tag
    pub fn tag(&self) -> BerTag {
        self.tag
    }

    /// Raw content bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Decode the content as a universal primitive value
    pub fn decode(&self) -> EmberResult<BerValue> {
        BerValue::decode(&self.tag, self.bytes)
    }

    /// Decode as INTEGER, checking the universal type
    pub fn as_integer(&self) -> EmberResult<i64> {
        self.expect_type(value::universal::INTEGER)?;
        value::decode_integer(self.bytes)
    }

    /// Decode as BOOLEAN, checking the universal type
    pub fn as_boolean(&self) -> EmberResult<bool> {
        self.expect_type(value::universal::BOOLEAN)?;
        value::decode_boolean(self.bytes)
    }

    /// Decode as UTF8String, checking the universal type
    pub fn as_string(&self) -> EmberResult<String> {
        self.expect_type(value::universal::UTF8_STRING)?;
        value::decode_utf8_string(self.bytes)
    }

    /// Decode as RELATIVE-OID, checking the universal type
    pub fn as_relative_oid(&self) -> EmberResult<Vec<u32>> {
        self.expect_type(value::universal::RELATIVE_OID)?;
        value::decode_relative_oid(self.bytes)
    }

    fn expect_type(&self, number: u32) -> EmberResult<()> {
        if self.tag.is_universal(number) && !self.tag.is_constructed() {
            Ok(())
        } else {
            Err(EmberError::InvalidData(format!(
                "Expected universal type {}, found {}",
                number, self.tag
            )))
        }
    }
}

/// Receiver of structural events
///
/// Returning an error from any callback faults the reader.
pub trait BerHandler {
    /// A constructed value was entered
    fn on_container_entered(&mut self, tag: BerTag, length: BerLength) -> EmberResult<()>;

    /// A primitive value is complete
    fn on_item_ready(&mut self, item: &BerItem<'_>) -> EmberResult<()>;

    /// The innermost constructed value was left
    fn on_container_left(&mut self, tag: BerTag) -> EmberResult<()>;
}

/// Reader state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Collecting tag bytes
    Tag,
    /// Collecting length bytes
    Length,
    /// Collecting primitive content bytes
    Value,
    /// Stopped by an error
    Faulted,
}

/// An open constructed value
#[derive(Debug, Clone, Copy)]
struct OpenContainer {
    tag: BerTag,
    /// Stream position of the first byte after the content (definite only)
    end: Option<u64>,
}

/// Incremental BER reader
///
/// # Usage Example
///
/// ```rust
/// use ember_ber::{BerHandler, BerItem, BerLength, BerReader, BerTag, EmberResult};
///
/// #[derive(Default)]
/// struct Count(usize);
///
/// impl BerHandler for Count {
///     fn on_container_entered(&mut self, _: BerTag, _: BerLength) -> EmberResult<()> { Ok(()) }
///     fn on_item_ready(&mut self, _: &BerItem<'_>) -> EmberResult<()> { self.0 += 1; Ok(()) }
///     fn on_container_left(&mut self, _: BerTag) -> EmberResult<()> { Ok(()) }
/// }
///
/// let mut reader = BerReader::new();
/// let mut count = Count::default();
/// reader.read_bytes(&[0x30, 0x03, 0x02], &mut count).unwrap();
/// reader.read_bytes(&[0x01, 0x05], &mut count).unwrap();
/// assert_eq!(count.0, 1);
/// assert!(reader.is_idle());
/// ```
#[derive(Debug)]
pub struct BerReader {
    config: BerReaderConfig,
    state: ReadState,
    header: [u8; BerTag::MAX_ENCODED_LEN],
    header_len: usize,
    tag: BerTag,
    value_len: usize,
    value: Vec<u8>,
    stack: Vec<OpenContainer>,
    position: u64,
}

impl Default for BerReader {
    fn default() -> Self {
        Self::new()
    }
}

impl BerReader {
    /// Create a reader with the default limits
    pub fn new() -> Self {
        Self::with_config(BerReaderConfig::default())
    }

    /// Create a reader with custom limits
    pub fn with_config(config: BerReaderConfig) -> Self {
        Self {
            config,
            state: ReadState::Tag,
            header: [0; BerTag::MAX_ENCODED_LEN],
            header_len: 0,
            tag: BerTag::END_OF_CONTENTS,
            value_len: 0,
            value: Vec::new(),
            stack: Vec::with_capacity(config.max_depth),
            position: 0,
        }
    }

    /// Reader limits
    pub fn config(&self) -> &BerReaderConfig {
        &self.config
    }

    /// Number of currently open containers
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of bytes consumed since the last reset
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Check if the reader sits between two top-level values
    pub fn is_idle(&self) -> bool {
        self.state == ReadState::Tag && self.header_len == 0 && self.stack.is_empty()
    }

    /// Check if the reader stopped on an error
    pub fn is_faulted(&self) -> bool {
        self.state == ReadState::Faulted
    }

    /// Discard all partial state and start over
    pub fn reset(&mut self) {
        self.state = ReadState::Tag;
        self.header_len = 0;
        self.tag = BerTag::END_OF_CONTENTS;
        self.value_len = 0;
        self.value.clear();
        self.stack.clear();
        self.position = 0;
    }

    /// Feed a single byte
    pub fn read_byte<H: BerHandler + ?Sized>(&mut self, byte: u8, handler: &mut H) -> EmberResult<()> {
        self.read_bytes(&[byte], handler)
    }

    /// Feed a chunk of input
    ///
    /// # Error Handling
    /// The first error faults the reader; bytes after the offending one are
    /// not consumed.
    pub fn read_bytes<H: BerHandler + ?Sized>(&mut self, bytes: &[u8], handler: &mut H) -> EmberResult<()> {
        if self.state == ReadState::Faulted {
            return Err(EmberError::ReaderFaulted);
        }

        let mut offset = 0;
        while offset < bytes.len() {
            match self.step(&bytes[offset..], handler) {
                Ok(consumed) => offset += consumed,
                Err(e) => {
                    log::warn!("BER reader faulted at position {}: {}", self.position, e);
                    self.state = ReadState::Faulted;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Consume at least one byte of `input`, returning the number consumed
    fn step<H: BerHandler + ?Sized>(&mut self, input: &[u8], handler: &mut H) -> EmberResult<usize> {
        match self.state {
            ReadState::Tag => {
                self.push_header(input[0])?;
                if let DecodeStatus::Ready { value, .. } = BerTag::decode(&self.header[..self.header_len])? {
                    self.tag = value;
                    self.header_len = 0;
                    self.state = ReadState::Length;
                }
                Ok(1)
            }
            ReadState::Length => {
                self.push_header(input[0])?;
                if let DecodeStatus::Ready { value, .. } = BerLength::decode(&self.header[..self.header_len])? {
                    self.header_len = 0;
                    self.on_header(value, handler)?;
                }
                Ok(1)
            }
            ReadState::Value => {
                let take = (self.value_len - self.value.len()).min(input.len());
                self.value.extend_from_slice(&input[..take]);
                self.position += take as u64;
                if self.value.len() == self.value_len {
                    self.finish_item(handler)?;
                }
                Ok(take)
            }
            ReadState::Faulted => Err(EmberError::ReaderFaulted),
        }
    }

    /// Append a tag or length byte
    ///
    /// Every header byte must lie inside the innermost definite container,
    /// including the end-of-contents of an indefinite child.
    fn push_header(&mut self, byte: u8) -> EmberResult<()> {
        if let Some(end) = self.parent_end() {
            if self.position >= end {
                return Err(EmberError::BerDecoding(format!(
                    "Content overruns its enclosing container ending at {}",
                    end
                )));
            }
        }
        let Some(slot) = self.header.get_mut(self.header_len) else {
            return Err(EmberError::BerDecoding(format!(
                "Header longer than {} bytes",
                BerTag::MAX_ENCODED_LEN
            )));
        };
        *slot = byte;
        self.header_len += 1;
        self.position += 1;
        Ok(())
    }

    /// Tag and length are complete
    fn on_header<H: BerHandler + ?Sized>(&mut self, length: BerLength, handler: &mut H) -> EmberResult<()> {
        let tag = self.tag;

        if tag.is_end_of_contents() {
            if length != BerLength::Definite(0) {
                return Err(EmberError::BerDecoding(
                    "End-of-contents with non-zero length".to_string(),
                ));
            }
            return match self.stack.last() {
                Some(container) if container.end.is_none() => {
                    let tag = container.tag;
                    self.stack.pop();
                    log::trace!("Leaving {} at {}", tag, self.position);
                    handler.on_container_left(tag)?;
                    self.state = ReadState::Tag;
                    self.close_completed(handler)
                }
                _ => Err(EmberError::BerDecoding(format!(
                    "Unexpected end-of-contents at position {}",
                    self.position
                ))),
            };
        }

        let end = length.definite().map(|len| self.position + len as u64);
        if let (Some(end), Some(parent_end)) = (end, self.parent_end()) {
            if end > parent_end {
                return Err(EmberError::BerDecoding(format!(
                    "{} overruns its enclosing container",
                    tag
                )));
            }
        }

        if tag.is_constructed() {
            if self.stack.len() >= self.config.max_depth {
                return Err(EmberError::DepthExceeded {
                    max: self.config.max_depth,
                });
            }
            self.stack.push(OpenContainer { tag, end });
            log::trace!("Entering {} ({}) at {}", tag, length, self.position);
            handler.on_container_entered(tag, length)?;
            self.state = ReadState::Tag;
            // A zero-length container closes right away
            return self.close_completed(handler);
        }

        let len = length.definite().ok_or_else(|| {
            EmberError::BerDecoding(format!("Indefinite length on primitive {}", tag))
        })?;
        if len > self.config.max_item_length {
            return Err(EmberError::BerDecoding(format!(
                "Item of {} bytes exceeds the limit of {}",
                len, self.config.max_item_length
            )));
        }

        self.value.clear();
        self.value_len = len;
        if len == 0 {
            self.finish_item(handler)
        } else {
            self.state = ReadState::Value;
            Ok(())
        }
    }

    fn finish_item<H: BerHandler + ?Sized>(&mut self, handler: &mut H) -> EmberResult<()> {
        let item = BerItem::new(self.tag, &self.value);
        handler.on_item_ready(&item)?;
        self.state = ReadState::Tag;
        self.close_completed(handler)
    }

    /// Close every definite container whose content ends at the current position
    fn close_completed<H: BerHandler + ?Sized>(&mut self, handler: &mut H) -> EmberResult<()> {
        while let Some(container) = self.stack.last() {
            if container.end != Some(self.position) {
                break;
            }
            let tag = container.tag;
            self.stack.pop();
            log::trace!("Leaving {} at {}", tag, self.position);
            handler.on_container_left(tag)?;
        }
        Ok(())
    }

    /// End position of the innermost definite container
    fn parent_end(&self) -> Option<u64> {
        self.stack.iter().rev().find_map(|container| container.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::BerEncoder;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Enter(BerTag, BerLength),
        Item(BerTag, Vec<u8>),
        Leave(BerTag),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
    }

    impl BerHandler for Recorder {
        fn on_container_entered(&mut self, tag: BerTag, length: BerLength) -> EmberResult<()> {
            self.events.push(Event::Enter(tag, length));
            Ok(())
        }

        fn on_item_ready(&mut self, item: &BerItem<'_>) -> EmberResult<()> {
            self.events.push(Event::Item(item.tag(), item.bytes().to_vec()));
            Ok(())
        }

        fn on_container_left(&mut self, tag: BerTag) -> EmberResult<()> {
            self.events.push(Event::Leave(tag));
            Ok(())
        }
    }

    fn sample() -> Vec<u8> {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::application(true, 0), true);
        encoder.begin_container(BerTag::context_specific(true, 0), false);
        encoder.begin_container(BerTag::application(true, 3), true);
        encoder.encode_field(0, &BerValue::Integer(1));
        encoder.begin_container(BerTag::context_specific(true, 1), false);
        encoder.encode_utf8_string("Gain");
        encoder.encode_octet_string(&[]);
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.begin_container(BerTag::context_specific(true, 2), false);
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.into_bytes()
    }

    fn read_all(chunks: &[&[u8]]) -> EmberResult<Vec<Event>> {
        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();
        for chunk in chunks {
            reader.read_bytes(chunk, &mut recorder)?;
        }
        assert!(reader.is_idle());
        Ok(recorder.events)
    }

    #[test]
    fn test_read_nested_structure() {
        let data = sample();
        let events = read_all(&[&data]).unwrap();

        assert_eq!(events[0], Event::Enter(BerTag::application(true, 0), BerLength::Indefinite));
        assert!(matches!(events[1], Event::Enter(tag, BerLength::Definite(_)) if tag.is_context(0)));
        assert_eq!(events[3], Event::Enter(BerTag::context_specific(true, 0), BerLength::Definite(3)));
        assert_eq!(events[4], Event::Item(BerTag::universal(false, 2), vec![0x01]));
        assert_eq!(events[5], Event::Leave(BerTag::context_specific(true, 0)));
        assert_eq!(events[7], Event::Item(BerTag::universal(false, 12), b"Gain".to_vec()));
        assert_eq!(events[8], Event::Item(BerTag::universal(false, 4), vec![]));
        assert_eq!(
            events.last(),
            Some(&Event::Leave(BerTag::application(true, 0)))
        );

        let enters = events.iter().filter(|e| matches!(e, Event::Enter(..))).count();
        let leaves = events.iter().filter(|e| matches!(e, Event::Leave(..))).count();
        assert_eq!(enters, leaves);
    }

    #[test]
    fn test_chunking_does_not_change_events() {
        let data = sample();
        let expected = read_all(&[&data]).unwrap();

        for split in 1..data.len() {
            let (head, tail) = data.split_at(split);
            assert_eq!(read_all(&[head, tail]).unwrap(), expected, "split at {}", split);
        }

        let bytes: Vec<&[u8]> = data.chunks(1).collect();
        assert_eq!(read_all(&bytes).unwrap(), expected);
    }

    #[test]
    fn test_empty_definite_container() {
        let events = read_all(&[&[0x30, 0x00]]).unwrap();
        assert_eq!(
            events,
            vec![
                Event::Enter(BerTag::universal(true, 16), BerLength::Definite(0)),
                Event::Leave(BerTag::universal(true, 16)),
            ]
        );
    }

    #[test]
    fn test_long_form_length() {
        let mut encoder = BerEncoder::new();
        encoder.encode_octet_string(&[0x55; 300]);
        let data = encoder.into_bytes();
        assert_eq!(&data[..4], &[0x04, 0x82, 0x01, 0x2C]);

        let events = read_all(&[&data[..10], &data[10..]]).unwrap();
        assert_eq!(events, vec![Event::Item(BerTag::universal(false, 4), vec![0x55; 300])]);
    }

    #[test]
    fn test_depth_exceeded() {
        let mut reader = BerReader::with_config(BerReaderConfig::default().with_max_depth(2));
        let mut recorder = Recorder::default();
        let result = reader.read_bytes(&[0x30, 0x80, 0x30, 0x80, 0x30, 0x80], &mut recorder);
        assert_eq!(result, Err(EmberError::DepthExceeded { max: 2 }));
        assert_eq!(recorder.events.len(), 2);
        assert!(reader.is_faulted());
    }

    #[test]
    fn test_faulted_until_reset() {
        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();

        // Indefinite length on a primitive
        assert!(reader.read_bytes(&[0x02, 0x80], &mut recorder).is_err());
        assert_eq!(
            reader.read_bytes(&[0x02, 0x01, 0x05], &mut recorder),
            Err(EmberError::ReaderFaulted)
        );

        reader.reset();
        reader.read_bytes(&[0x02, 0x01, 0x05], &mut recorder).unwrap();
        assert_eq!(recorder.events, vec![Event::Item(BerTag::universal(false, 2), vec![0x05])]);
    }

    #[test]
    fn test_unexpected_end_of_contents() {
        let mut recorder = Recorder::default();

        let mut reader = BerReader::new();
        assert!(reader.read_bytes(&[0x00, 0x00], &mut recorder).is_err());

        let mut reader = BerReader::new();
        let result = reader.read_bytes(&[0x30, 0x04, 0x00, 0x00], &mut recorder);
        assert!(matches!(result, Err(EmberError::BerDecoding(_))));
    }

    #[test]
    fn test_child_overruns_parent() {
        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();
        let result = reader.read_bytes(&[0x30, 0x03, 0x04, 0x05], &mut recorder);
        assert!(matches!(result, Err(EmberError::BerDecoding(_))));
    }

    #[test]
    fn test_indefinite_child_overruns_parent() {
        // The end-of-contents of the inner sequence lies past its parent
        let data = [0x30, 0x02, 0x30, 0x80, 0x00, 0x00];

        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();
        let result = reader.read_bytes(&data, &mut recorder);
        assert!(matches!(result, Err(EmberError::BerDecoding(_))));
        assert!(reader.is_faulted());

        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();
        let mut result = Ok(());
        for byte in data {
            result = reader.read_bytes(&[byte], &mut recorder);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(EmberError::BerDecoding(_))));
        assert!(reader.is_faulted());
    }

    #[test]
    fn test_indefinite_child_inside_definite_parent() {
        let events = read_all(&[&[0x30, 0x04, 0x30, 0x80, 0x00, 0x00]]).unwrap();
        assert_eq!(
            events.last(),
            Some(&Event::Leave(BerTag::universal(true, 16)))
        );
        assert_eq!(events.len(), 4);
    }

    #[test]
    fn test_oversized_tag_faults_reader() {
        let data = [0x1F, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x01, 0x01, 0x00];

        let mut reader = BerReader::new();
        let mut recorder = Recorder::default();
        let result = reader.read_bytes(&data, &mut recorder);
        assert!(matches!(result, Err(EmberError::BerDecoding(_))));
        assert_eq!(
            reader.read_bytes(&[0x05, 0x00], &mut recorder),
            Err(EmberError::ReaderFaulted)
        );

        let mut reader = BerReader::new();
        let mut errors = 0;
        for byte in data {
            if reader.read_bytes(&[byte], &mut recorder).is_err() {
                errors += 1;
            }
        }
        assert_eq!(errors, 5);
        assert!(reader.is_faulted());
        assert!(recorder.events.is_empty());
    }

    #[test]
    fn test_item_length_limit() {
        let mut reader = BerReader::with_config(BerReaderConfig::default().with_max_item_length(4));
        let mut recorder = Recorder::default();
        assert!(reader.read_bytes(&[0x04, 0x05], &mut recorder).is_err());
    }

    #[test]
    fn test_handler_error_faults_reader() {
        struct Refuse;

        impl BerHandler for Refuse {
            fn on_container_entered(&mut self, _: BerTag, _: BerLength) -> EmberResult<()> {
                Ok(())
            }
            fn on_item_ready(&mut self, _: &BerItem<'_>) -> EmberResult<()> {
                Err(EmberError::BerDecoding("refused".to_string()))
            }
            fn on_container_left(&mut self, _: BerTag) -> EmberResult<()> {
                Ok(())
            }
        }

        let mut reader = BerReader::new();
        assert!(reader.read_bytes(&[0x05, 0x00], &mut Refuse).is_err());
        assert!(reader.is_faulted());
    }

    #[test]
    fn test_item_typed_accessors() {
        let item = BerItem::new(BerTag::universal(false, 2), &[0x01, 0x00]);
        assert_eq!(item.as_integer().unwrap(), 256);
        assert!(item.as_string().is_err());

        let item = BerItem::new(BerTag::universal(false, 13), &[0x01, 0x81, 0x00]);
        assert_eq!(item.as_relative_oid().unwrap(), vec![1, 128]);
    }
}
