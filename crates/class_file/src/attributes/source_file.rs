use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};

use super::{
    registry::{AttributeCardinality, AttributeMapper},
    Attribute, RawAttribute,
};
use crate::{ConstantPool, Result, Utf8Entry};

pub(super) const NAME: &str = "SourceFile";
const PAYLOAD_LENGTH: u32 = 2;

pub(super) static MAPPER: AttributeMapper = AttributeMapper {
    name: NAME,
    cardinality: AttributeCardinality::Singleton,
    payload_length: Some(PAYLOAD_LENGTH),
    decode,
    write_payload,
};

fn decode<'a>(_name: Utf8Entry, raw: RawAttribute<'a>, pool: &'a ConstantPool) -> Attribute<'a> {
    Attribute::SourceFile(SourceFileAttribute::Bound(BoundSourceFile { raw, pool }))
}

fn write_payload(
    attribute: &Attribute<'_>,
    pool: &mut ConstantPool,
    out: &mut Vec<u8>,
) -> Result<()> {
    let Attribute::SourceFile(source_file) = attribute else {
        return Err(MAPPER.mismatch(attribute));
    };

    let source_file = pool.intern(&source_file.source_file()?)?;
    out.write_u16::<BigEndian>(source_file.index())?;

    Ok(())
}

/// `SourceFile`: the name of the source file a class was compiled from.
#[derive(Debug, Clone)]
pub enum SourceFileAttribute<'a> {
    Bound(BoundSourceFile<'a>),
    Unbound(UnboundSourceFile),
}
impl<'a> SourceFileAttribute<'a> {
    pub fn of(source_file: Utf8Entry) -> Self {
        SourceFileAttribute::Unbound(UnboundSourceFile { source_file })
    }

    pub fn of_str(source_file: &str) -> Result<Self> {
        let mut pool = ConstantPool::new();
        Ok(Self::of(pool.utf8_entry(source_file)?))
    }

    pub fn source_file(&self) -> Result<Utf8Entry> {
        match self {
            SourceFileAttribute::Bound(bound) => bound.source_file(),
            SourceFileAttribute::Unbound(unbound) => Ok(unbound.source_file.clone()),
        }
    }

    pub fn to_unbound(&self) -> Result<SourceFileAttribute<'static>> {
        Ok(SourceFileAttribute::of(self.source_file()?))
    }
}

#[derive(Clone)]
pub struct BoundSourceFile<'a> {
    raw: RawAttribute<'a>,
    pool: &'a ConstantPool,
}
impl<'a> BoundSourceFile<'a> {
    pub fn raw(&self) -> RawAttribute<'a> {
        self.raw
    }

    pub fn source_file(&self) -> Result<Utf8Entry> {
        self.raw.utf8_at(self.pool, NAME, 0, PAYLOAD_LENGTH)
    }

    pub(super) fn source(&self) -> (RawAttribute<'a>, &'a ConstantPool) {
        (self.raw, self.pool)
    }
}
impl fmt::Debug for BoundSourceFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSourceFile")
            .field("raw", &self.raw)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundSourceFile {
    source_file: Utf8Entry,
}

#[cfg(test)]
mod source_file_tests {
    use super::*;
    use crate::attributes::decode;

    #[test]
    fn it_should_decode_a_bound_source_file() {
        let mut pool = ConstantPool::new();
        pool.utf8_entry("SourceFile").unwrap();
        pool.utf8_entry("Main.java").unwrap();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02];

        let attribute = decode(&buf, 0, &pool).unwrap();

        assert!(attribute.is_bound());
        assert_eq!(
            "Main.java",
            attribute.source_file().unwrap().source_file().unwrap()
        );
    }

    #[test]
    fn it_should_not_be_a_module_target() {
        let attribute = Attribute::SourceFile(SourceFileAttribute::of_str("Main.java").unwrap());

        assert!(!attribute.is_bound());
        assert!(attribute.module_target().is_none());
        assert_eq!("SourceFile", attribute.name());
    }
}
