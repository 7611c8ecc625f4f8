use std::{collections::HashMap, sync::OnceLock};

use log::{trace, warn};

use super::{module_target, source_file, unknown, Attribute, RawAttribute};
use crate::{ClassFileError, ConstantPool, Result, Utf8Entry};

/// How many attributes of one kind may be attached to a single class, field or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeCardinality {
    /// At most one; a later occurrence replaces an earlier one.
    Singleton,
    Repeatable,
}

pub(super) type DecodeFn = for<'a> fn(Utf8Entry, RawAttribute<'a>, &'a ConstantPool) -> Attribute<'a>;
pub(super) type WritePayloadFn = fn(&Attribute<'_>, &mut ConstantPool, &mut Vec<u8>) -> Result<()>;

/// Decode and encode strategy for one attribute kind.
pub struct AttributeMapper {
    pub(super) name: &'static str,
    pub(super) cardinality: AttributeCardinality,
    pub(super) payload_length: Option<u32>,
    pub(super) decode: DecodeFn,
    pub(super) write_payload: WritePayloadFn,
}
impl AttributeMapper {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cardinality(&self) -> AttributeCardinality {
        self.cardinality
    }

    /// The only valid `attribute_length` for fixed-size kinds.
    pub fn payload_length(&self) -> Option<u32> {
        self.payload_length
    }

    pub(crate) fn decode<'a>(
        &self,
        name: Utf8Entry,
        raw: RawAttribute<'a>,
        pool: &'a ConstantPool,
    ) -> Attribute<'a> {
        (self.decode)(name, raw, pool)
    }

    pub(crate) fn write_payload(
        &self,
        attribute: &Attribute<'_>,
        pool: &mut ConstantPool,
        out: &mut Vec<u8>,
    ) -> Result<()> {
        (self.write_payload)(attribute, pool, out)
    }

    pub(super) fn mismatch(&self, attribute: &Attribute<'_>) -> ClassFileError {
        ClassFileError::InvalidArgument(format!(
            "{} mapper cannot write a {} attribute",
            self.name,
            attribute.name()
        ))
    }
}
impl std::fmt::Debug for AttributeMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeMapper")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .field("payload_length", &self.payload_length)
            .finish()
    }
}

/// Maps attribute names to their mappers. Names without a mapper decode as unknown attributes.
#[derive(Debug, Default)]
pub struct AttributeRegistry {
    mappers: HashMap<&'static str, &'static AttributeMapper>,
}
impl AttributeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every kind this crate understands. Built on first use and never modified afterwards.
    pub fn standard() -> &'static AttributeRegistry {
        static STANDARD: OnceLock<AttributeRegistry> = OnceLock::new();

        STANDARD.get_or_init(|| {
            let mut registry = AttributeRegistry::empty();
            registry
                .register(&module_target::MAPPER)
                .register(&source_file::MAPPER);
            registry
        })
    }

    pub fn register(&mut self, mapper: &'static AttributeMapper) -> &mut Self {
        self.mappers.insert(mapper.name, mapper);
        self
    }

    pub fn mapper(&self, name: &str) -> Option<&'static AttributeMapper> {
        self.mappers.get(name).copied()
    }

    pub fn decode<'a>(
        &self,
        buf: &'a [u8],
        offset: usize,
        pool: &'a ConstantPool,
    ) -> Result<Attribute<'a>> {
        self.decode_raw(RawAttribute::read(buf, offset)?, pool)
    }

    pub fn decode_raw<'a>(
        &self,
        raw: RawAttribute<'a>,
        pool: &'a ConstantPool,
    ) -> Result<Attribute<'a>> {
        self.dispatch(raw, pool, false)
    }

    /// Like [`decode_raw`](Self::decode_raw), but a recognized attribute with the wrong declared
    /// length is kept as an unknown attribute instead of failing.
    pub fn decode_raw_lenient<'a>(
        &self,
        raw: RawAttribute<'a>,
        pool: &'a ConstantPool,
    ) -> Result<Attribute<'a>> {
        self.dispatch(raw, pool, true)
    }

    fn dispatch<'a>(
        &self,
        raw: RawAttribute<'a>,
        pool: &'a ConstantPool,
        lenient: bool,
    ) -> Result<Attribute<'a>> {
        let name = pool
            .utf8_entry_at(raw.name_index())
            .map_err(|e| ClassFileError::malformed("attribute", format!("bad name: {}", e)))?;

        let Some(mapper) = self.mapper(name.as_str()) else {
            trace!("No mapper for {} attribute, keeping it as unknown", name);
            return Ok(unknown::MAPPER.decode(name, raw, pool));
        };

        match mapper.payload_length {
            Some(expected) if expected != raw.length() && lenient => {
                warn!(
                    "{} attribute at offset {} declares {} bytes instead of {}, keeping it as unknown",
                    name,
                    raw.offset(),
                    raw.length(),
                    expected
                );
                Ok(unknown::MAPPER.decode(name, raw, pool))
            }
            Some(expected) if expected != raw.length() => Err(ClassFileError::malformed(
                mapper.name,
                format!("attribute_length is {}, expected {}", raw.length(), expected),
            )),
            _ => {
                trace!("Decoding {} attribute at offset {}", name, raw.offset());
                Ok(mapper.decode(name, raw, pool))
            }
        }
    }
}
