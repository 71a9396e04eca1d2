//! S101 framing for the Ember+ protocol
//!
//! Ember+ payloads travel over the wire in S101 frames:
//!
//! ```text
//! BOF | escaped(body | crc) | EOF
//! 0xFE                        0xFF
//! ```
//!
//! Every body or checksum byte `>= 0xF8` is sent as `0xFD, byte ^ 0x20`.
//! A logical message may span several frames ("packages"), flagged as
//! first/last.
//!
//! # TODO
//!
//! ## S101 帧层
//! - [x] CRC-CCITT 计算和验证
//! - [x] 转义/反转义
//! - [x] EmBER 包编码/解码
//! - [x] 多包消息重组
//! - [x] Keep-alive 请求/响应
//! - [x] 帧统计信息收集
//! - [ ] 非转义（长度前缀）帧格式

pub mod crc;
pub mod error;
pub mod frame;
pub mod reader;
pub mod statistics;

pub use crc::FrameCrc;
pub use error::{EmberError, EmberResult};
pub use frame::{
    encode_keep_alive_request, encode_keep_alive_response, encode_message, encode_package,
    FrameCommand, PackageFlags, S101Header,
};
pub use reader::{FramingEvent, FramingReader};
pub use statistics::FramingStatistics;
