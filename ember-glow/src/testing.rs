//! Glow tree writer for tests

use ember_ber::{BerEncoder, BerTag, BerValue, universal};

use crate::tags::app;

pub(crate) fn app_tag(number: u32) -> BerTag {
    BerTag::application(true, number)
}

pub(crate) fn ctx_tag(number: u32) -> BerTag {
    BerTag::context_specific(true, number)
}

pub(crate) fn string(value: &str) -> BerValue {
    BerValue::Utf8String(value.to_string())
}

pub(crate) fn int(value: i64) -> BerValue {
    BerValue::Integer(value)
}

/// Minimal Glow encoder; outer containers use the indefinite form, fields
/// and contents the definite form, so both are exercised.
#[derive(Debug, Default)]
pub(crate) struct GlowWriter {
    encoder: BerEncoder,
}

impl GlowWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, tag: BerTag) -> &mut Self {
        self.encoder.begin_container(tag, true);
        self
    }

    pub fn open_definite(&mut self, tag: BerTag) -> &mut Self {
        self.encoder.begin_container(tag, false);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        self.encoder.end_container().unwrap();
        self
    }

    pub fn root(&mut self) -> &mut Self {
        self.open(app_tag(app::ROOT)).open(app_tag(app::ROOT_ELEMENT_COLLECTION))
    }

    pub fn stream_root(&mut self) -> &mut Self {
        self.open(app_tag(app::ROOT)).open(app_tag(app::STREAM_COLLECTION))
    }

    pub fn end_root(&mut self) -> &mut Self {
        self.close().close()
    }

    /// `[0]` collection item wrapping `tag`
    pub fn item(&mut self, tag_number: u32) -> &mut Self {
        self.open(ctx_tag(0)).open(app_tag(tag_number))
    }

    pub fn end_item(&mut self) -> &mut Self {
        self.close().close()
    }

    pub fn element(&mut self, tag_number: u32, number: u32) -> &mut Self {
        self.item(tag_number).field(0, int(number as i64))
    }

    pub fn qualified(&mut self, tag_number: u32, path: &[u32]) -> &mut Self {
        self.item(tag_number)
            .field(0, BerValue::RelativeOid(path.to_vec()))
    }

    pub fn end_element(&mut self) -> &mut Self {
        self.end_item()
    }

    pub fn contents(&mut self) -> &mut Self {
        self.open_definite(ctx_tag(1))
            .open_definite(BerTag::universal(true, universal::SET))
    }

    pub fn end_contents(&mut self) -> &mut Self {
        self.close().close()
    }

    pub fn children(&mut self) -> &mut Self {
        self.open(ctx_tag(2)).open(app_tag(app::ELEMENT_COLLECTION))
    }

    pub fn end_children(&mut self) -> &mut Self {
        self.close().close()
    }

    /// `[n]` wrapping a SEQUENCE
    pub fn sequence(&mut self, number: u32) -> &mut Self {
        self.open_definite(ctx_tag(number))
            .open_definite(BerTag::universal(true, universal::SEQUENCE))
    }

    pub fn end_sequence(&mut self) -> &mut Self {
        self.close().close()
    }

    pub fn field(&mut self, number: u32, value: BerValue) -> &mut Self {
        self.encoder.encode_field(number, &value);
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.encoder).into_bytes()
    }
}
