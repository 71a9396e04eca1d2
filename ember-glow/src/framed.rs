//! Glow reader over S101 framed input

use ember_framing::{FramingEvent, FramingReader, FramingStatistics};

use crate::config::GlowReaderConfig;
use crate::handler::GlowHandler;
use crate::reader::NonFramingGlowReader;

/// Glow reader for a raw S101 byte stream
///
/// Frames are unescaped and checked, packages are reassembled in the
/// caller-supplied buffer, and every complete message is decoded from a
/// fresh Glow state. A message that fails to decode is reported through
/// [`GlowHandler::on_error`] and never affects the next one.
///
/// # Usage Example
///
/// ```rust
/// use ember_framing::encode_message;
/// use ember_glow::{GlowEvent, GlowEventCollector, GlowReader};
///
/// let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 1024]);
/// let payload = [
///     0x60, 0x0B, 0x6B, 0x09, 0xA0, 0x07, 0x63, 0x05, 0xA0, 0x03, 0x02, 0x01, 0x01,
/// ];
/// for frame in encode_message(0, &payload, 64) {
///     reader.read_bytes(&frame);
/// }
/// let events = reader.handler().events();
/// assert!(matches!(events[0], GlowEvent::PackageReceived(_)));
/// assert_eq!(events[1].path(), Some(&[1u32][..]));
/// ```
#[derive(Debug)]
pub struct GlowReader<H, B> {
    framing: FramingReader<B>,
    glow: NonFramingGlowReader<H>,
}

impl<H, B> GlowReader<H, B>
where
    H: GlowHandler,
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Create a reader with the default configuration
    ///
    /// # Arguments
    /// * `handler` - Application callbacks
    /// * `buffer` - Reassembly buffer; its length bounds the message size
    pub fn new(handler: H, buffer: B) -> Self {
        Self::with_config(handler, buffer, GlowReaderConfig::default())
    }

    /// Create a reader with a custom configuration
    pub fn with_config(handler: H, buffer: B, config: GlowReaderConfig) -> Self {
        Self {
            framing: FramingReader::new(buffer),
            glow: NonFramingGlowReader::with_config(handler, config),
        }
    }

    /// Feed raw link bytes in any chunking
    ///
    /// Errors never stop the reader; they are reported to the handler.
    pub fn read_bytes(&mut self, bytes: &[u8]) {
        let glow = &mut self.glow;
        self.framing.read_bytes(bytes, |event| match event {
            FramingEvent::Package(payload) => {
                glow.handler_mut().on_package_received(payload);
                glow.read_message(payload)
            }
            FramingEvent::KeepAliveRequest { slot } => glow.handler_mut().on_keep_alive_request(slot),
            FramingEvent::KeepAliveResponse { slot } => glow.handler_mut().on_keep_alive_response(slot),
            FramingEvent::Error(e) => glow.handler_mut().on_error(&e),
        });
    }

    /// Drop all partial frame, message and decoding state
    pub fn reset(&mut self) {
        self.framing.reset();
        self.glow.reset();
    }

    /// Get framing statistics
    pub fn statistics(&self) -> &FramingStatistics {
        self.framing.statistics()
    }

    /// Reader configuration
    pub fn config(&self) -> &GlowReaderConfig {
        self.glow.config()
    }

    /// Get the handler
    pub fn handler(&self) -> &H {
        self.glow.handler()
    }

    /// Get the handler mutably
    pub fn handler_mut(&mut self) -> &mut H {
        self.glow.handler_mut()
    }

    /// Give back the handler and the reassembly buffer
    pub fn into_parts(self) -> (H, B) {
        (self.glow.into_handler(), self.framing.into_buffer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmberError;
    use crate::fields::GlowFieldFlags;
    use crate::handler::{GlowEvent, GlowEventCollector, MockGlowHandler};
    use crate::tags::app;
    use crate::testing::{GlowWriter, string};
    use ember_framing::{encode_keep_alive_request, encode_message};

    fn parameter(number: u32, identifier: &str) -> Vec<u8> {
        GlowWriter::new()
            .root()
            .element(app::PARAMETER, number)
            .contents()
            .field(0, string(identifier))
            .end_contents()
            .end_element()
            .end_root()
            .finish()
    }

    fn wire(payload: &[u8], max_per_package: usize) -> Vec<u8> {
        encode_message(0, payload, max_per_package).concat()
    }

    #[test]
    fn test_multi_package_message() {
        let payload = parameter(5, "level");
        let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 1024]);
        for byte in wire(&payload, 8) {
            reader.read_bytes(&[byte]);
        }

        let events = reader.handler().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], GlowEvent::PackageReceived(payload));
        assert_eq!(events[1].path(), Some(&[5u32][..]));
        assert_eq!(events[1].fields(), Some(GlowFieldFlags::IDENTIFIER));
        assert_eq!(reader.statistics().messages_received, 1);
    }

    #[test]
    fn test_corrupted_frame_does_not_affect_next_message() {
        let mut corrupted = wire(&parameter(1, "a"), 64);
        corrupted[10] ^= 0x01;

        let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 256]);
        reader.read_bytes(&corrupted);
        reader.read_bytes(&wire(&parameter(2, "b"), 64));

        let events = reader.handler().events();
        assert!(matches!(events[0], GlowEvent::Error(ref e) if e.is_framing()));
        let entities: Vec<_> = reader.handler().entities().collect();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].path(), Some(&[2u32][..]));
        assert_eq!(reader.statistics().crc_errors, 1);
    }

    #[test]
    fn test_package_reported_before_decoding() {
        let payload = parameter(4, "mute");
        let mut handler = MockGlowHandler::new();
        let mut sequence = mockall::Sequence::new();
        handler
            .expect_on_package_received()
            .withf(|payload| payload.len() > 2 && payload[0] == 0x60)
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());
        handler
            .expect_on_parameter()
            .times(1)
            .in_sequence(&mut sequence)
            .return_const(());

        let mut reader = GlowReader::new(handler, vec![0u8; 256]);
        reader.read_bytes(&wire(&payload, 64));
    }

    #[test]
    fn test_undecodable_message_does_not_affect_next_message() {
        let mut truncated = parameter(1, "a");
        truncated.truncate(truncated.len() - 2);

        let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 256]);
        reader.read_bytes(&wire(&truncated, 64));
        reader.read_bytes(&wire(&parameter(3, "c"), 64));

        let events = reader.handler_mut().take();
        assert!(events
            .iter()
            .any(|event| matches!(event, GlowEvent::Error(EmberError::BerDecoding(_)))));
        assert_eq!(events.last().and_then(GlowEvent::path), Some(&[3u32][..]));
    }

    #[test]
    fn test_overflow_reported() {
        let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 32]);
        reader.read_bytes(&wire(&parameter(1, "a long parameter identifier"), 64));
        reader.read_bytes(&wire(&[0x60, 0x80, 0x00, 0x00], 64));

        let events = reader.handler().events();
        assert!(matches!(events[0], GlowEvent::Error(EmberError::BufferOverflow { capacity: 32 })));
        assert_eq!(events[1], GlowEvent::PackageReceived(vec![0x60, 0x80, 0x00, 0x00]));
        assert_eq!(reader.statistics().overflows, 1);
    }

    #[test]
    fn test_keep_alive_forwarded() {
        let mut handler = MockGlowHandler::new();
        handler
            .expect_on_keep_alive_request()
            .withf(|slot| *slot == 3)
            .times(1)
            .return_const(());

        let mut reader = GlowReader::new(handler, [0u8; 64]);
        reader.read_bytes(&encode_keep_alive_request(3));
    }

    #[test]
    fn test_into_parts() {
        let reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 48]);
        let (collector, buffer) = reader.into_parts();
        assert!(collector.events().is_empty());
        assert_eq!(buffer.len(), 48);
    }
}
