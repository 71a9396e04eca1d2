//! ember - Rust implementation of an incremental Ember+ decoder
//!
//! Ember+ is a control protocol for broadcast equipment. A provider exposes
//! a tree of nodes, parameters, matrices and functions, encoded as BER
//! (the Glow DTD) and carried in S101 frames.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `ember-core`: error type and protocol limits
//! - `ember-ber`: BER tag/length/value codec and the incremental reader
//! - `ember-framing`: S101 frame decoding, CRC and package reassembly
//! - `ember-glow`: Glow semantic mapper and application callbacks
//!
//! # Implementation Status
//!
//! ## ✅ 已完成
//! - BER 编码/解码（标签、长度、通用类型）
//! - 增量式 BER 读取器（任意分块输入）
//! - S101 帧层（转义、CRC、多包重组、keep-alive）
//! - Glow 语义映射（Node、Parameter、Matrix、Function、Command、StreamEntry、InvocationResult）
//!
//! ## 📋 待实现
//! - Template / QualifiedTemplate 解码（目前作为不支持的元素报告）
//!
//! # Usage
//!
//! ```rust
//! use ember::glow::{GlowEventCollector, GlowReader};
//!
//! let mut reader = GlowReader::new(GlowEventCollector::new(), vec![0u8; 4096]);
//! reader.read_bytes(&[0xFE, 0x00, 0x0E, 0x01, 0x01]);
//! assert!(reader.handler().events().is_empty());
//! ```

// Re-export core types
pub use ember_core::{EMBER_MAX_TREE_DEPTH, EmberError, EmberResult, GLOW_MAX_TREE_DEPTH, MAX_ITEM_LENGTH};

// Re-export BER codec
pub mod ber {
    pub use ember_ber::*;
}

// Re-export S101 framing
pub mod framing {
    pub use ember_framing::*;
}

// Re-export Glow readers
pub mod glow {
    pub use ember_glow::*;
}

pub use ember_glow::{GlowHandler, GlowReader, GlowReaderBuilder, NonFramingGlowReader};

#[cfg(test)]
mod tests {
    use crate::ber::{BerEncoder, BerTag, BerValue};
    use crate::framing::{encode_keep_alive_response, encode_message};
    use crate::glow::{
        tags::app, GlowEvent, GlowEventCollector, GlowFieldFlags, GlowValue, PathConvention,
    };
    use crate::{EmberError, GlowReaderBuilder};

    /// Root { RootElementCollection { Node 1 { identifier, children { Parameter 2 } } } }
    fn device_tree(value: i64) -> Vec<u8> {
        let mut encoder = BerEncoder::new();
        encoder.begin_container(BerTag::application(true, app::ROOT), true);
        encoder.begin_container(BerTag::application(true, app::ROOT_ELEMENT_COLLECTION), true);
        encoder.begin_container(BerTag::context_specific(true, 0), true);
        encoder.begin_container(BerTag::application(true, app::NODE), true);
        encoder.encode_field(0, &BerValue::Integer(1));
        encoder.begin_container(BerTag::context_specific(true, 1), false);
        encoder.begin_container(BerTag::universal(true, 17), false);
        encoder.encode_field(0, &BerValue::Utf8String("device".to_string()));
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.begin_container(BerTag::context_specific(true, 2), true);
        encoder.begin_container(BerTag::application(true, app::ELEMENT_COLLECTION), true);
        encoder.begin_container(BerTag::context_specific(true, 0), false);
        encoder.begin_container(BerTag::application(true, app::PARAMETER), false);
        encoder.encode_field(0, &BerValue::Integer(2));
        encoder.begin_container(BerTag::context_specific(true, 1), false);
        encoder.begin_container(BerTag::universal(true, 17), false);
        encoder.encode_field(2, &BerValue::Integer(value));
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.end_container().unwrap();
        encoder.into_bytes()
    }

    fn frames(payload: &[u8], max_per_package: usize) -> Vec<u8> {
        encode_message(0, payload, max_per_package).concat()
    }

    #[test]
    fn test_framed_round_trip() {
        let mut reader = GlowReaderBuilder::new()
            .build_framed(GlowEventCollector::new(), vec![0u8; 512])
            .unwrap();
        let wire = frames(&device_tree(-6), 7);

        for chunk in wire.chunks(5) {
            reader.read_bytes(chunk);
        }

        let entities: Vec<_> = reader.handler().entities().cloned().collect();
        assert_eq!(entities.len(), 2);
        match &entities[0] {
            GlowEvent::Node { node, fields, path } => {
                assert_eq!(node.identifier, "device");
                assert_eq!(*fields, GlowFieldFlags::IDENTIFIER);
                assert_eq!(path, &vec![1]);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match &entities[1] {
            GlowEvent::Parameter { parameter, path, .. } => {
                assert_eq!(parameter.value, GlowValue::Integer(-6));
                assert_eq!(path, &vec![1, 2]);
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(reader.statistics().packages_received > 1);
    }

    #[test]
    fn test_unframed_matches_framed() {
        let payload = device_tree(10);

        let mut unframed = GlowReaderBuilder::new()
            .build(GlowEventCollector::new())
            .unwrap();
        unframed.read_bytes(&payload).unwrap();

        let mut framed = GlowReaderBuilder::new()
            .build_framed(GlowEventCollector::new(), vec![0u8; 512])
            .unwrap();
        framed.read_bytes(&frames(&payload, 16));

        let expected: Vec<_> = unframed.handler().entities().collect();
        let actual: Vec<_> = framed.handler().entities().collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_exclusive_paths() {
        let mut reader = GlowReaderBuilder::new()
            .path_convention(PathConvention::Exclusive)
            .build(GlowEventCollector::new())
            .unwrap();
        reader.read_bytes(&device_tree(0)).unwrap();

        let paths: Vec<_> = reader.handler().entities().filter_map(GlowEvent::path).collect();
        assert_eq!(paths, vec![&[][..], &[1u32][..]]);
    }

    #[test]
    fn test_errors_and_keep_alive_between_messages() {
        let mut reader = GlowReaderBuilder::new()
            .build_framed(GlowEventCollector::new(), vec![0u8; 256])
            .unwrap();

        let mut corrupted = frames(&device_tree(1), 256);
        let last = corrupted.len() - 2;
        corrupted[last] ^= 0x01;
        reader.read_bytes(&corrupted);
        reader.read_bytes(&frames(&device_tree(2), 256));
        reader.read_bytes(&encode_keep_alive_response(0));
        reader.read_bytes(&frames(&device_tree(3), 32));

        let events = reader.handler_mut().take();
        let errors: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                GlowEvent::Error(e) => Some(e.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], EmberError::FrameInvalid(_)));
        assert!(events.contains(&GlowEvent::KeepAliveResponse { slot: 0 }));

        let values: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                GlowEvent::Parameter { parameter, .. } => Some(parameter.value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![GlowValue::Integer(2), GlowValue::Integer(3)]);
    }
}
