use std::fmt;

use super::{
    registry::{AttributeCardinality, AttributeMapper},
    Attribute, RawAttribute,
};
use crate::{ClassFileError, ConstantPool, Result, Utf8Entry};

// Never registered: the registry falls back to it for names it has no mapper for. Its name is
// unused, an unknown attribute always carries its own.
pub(super) static MAPPER: AttributeMapper = AttributeMapper {
    name: "",
    cardinality: AttributeCardinality::Repeatable,
    payload_length: None,
    decode,
    write_payload,
};

fn decode<'a>(name: Utf8Entry, raw: RawAttribute<'a>, pool: &'a ConstantPool) -> Attribute<'a> {
    Attribute::Unknown(UnknownAttribute { name, raw, pool })
}

fn write_payload(
    attribute: &Attribute<'_>,
    _pool: &mut ConstantPool,
    _out: &mut Vec<u8>,
) -> Result<()> {
    // Only reached when a direct copy is impossible. The payload may hold indices into the
    // source pool that cannot be remapped.
    Err(ClassFileError::InvalidArgument(format!(
        "{} attribute is opaque and can only be written into the constant pool it was read \
         against or one derived from it",
        attribute.name()
    )))
}

/// An attribute with no registered mapper, kept byte for byte.
#[derive(Clone)]
pub struct UnknownAttribute<'a> {
    name: Utf8Entry,
    raw: RawAttribute<'a>,
    pool: &'a ConstantPool,
}
impl<'a> UnknownAttribute<'a> {
    pub fn name(&self) -> &Utf8Entry {
        &self.name
    }

    pub fn contents(&self) -> &'a [u8] {
        self.raw.payload()
    }

    pub fn raw(&self) -> RawAttribute<'a> {
        self.raw
    }

    pub(super) fn source(&self) -> (RawAttribute<'a>, &'a ConstantPool) {
        (self.raw, self.pool)
    }
}
impl fmt::Debug for UnknownAttribute<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnknownAttribute")
            .field("name", &self.name.as_str())
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod unknown_tests {
    use super::*;
    use crate::attributes::decode;

    fn vendor_pool() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.utf8_entry("Vendor").unwrap();
        pool.utf8_entry("referenced-by-payload").unwrap();
        pool
    }

    #[test]
    fn it_should_refuse_to_write_into_an_unrelated_pool() {
        let pool = vendor_pool();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02];
        let attribute = decode(&buf, 0, &pool).unwrap();

        let mut target = ConstantPool::new();
        target.utf8_entry("unrelated-1").unwrap();
        target.utf8_entry("unrelated-2").unwrap();
        let mut out = Vec::new();

        assert!(matches!(
            attribute.write_to(&mut out, &mut target),
            Err(ClassFileError::InvalidArgument(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn it_should_copy_contents_verbatim_into_a_derived_pool() {
        let pool = vendor_pool();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02];
        let attribute = decode(&buf, 0, &pool).unwrap();

        let mut out = Vec::new();
        attribute.write_to(&mut out, &mut pool.derive()).unwrap();

        assert_eq!(buf.to_vec(), out);
    }
}
