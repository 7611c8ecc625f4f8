//! `ModuleTarget`, the JDK-specific attribute recording the platform a module descriptor was
//! built for.
//!
//! ```text
//! ModuleTarget_attribute {
//!     u2 attribute_name_index;
//!     u4 attribute_length;          // always 2
//!     u2 target_platform_index;     // CONSTANT_Utf8_info
//! }
//! ```
//!
//! Only one may appear on a class; a later occurrence replaces an earlier one.

use std::fmt;

use byteorder::{BigEndian, WriteBytesExt};

use super::{
    registry::{AttributeCardinality, AttributeMapper},
    Attribute, RawAttribute,
};
use crate::{ConstantPool, Result, Utf8Entry};

pub(super) const NAME: &str = "ModuleTarget";
const PAYLOAD_LENGTH: u32 = 2;

pub(super) static MAPPER: AttributeMapper = AttributeMapper {
    name: NAME,
    cardinality: AttributeCardinality::Singleton,
    payload_length: Some(PAYLOAD_LENGTH),
    decode,
    write_payload,
};

fn decode<'a>(_name: Utf8Entry, raw: RawAttribute<'a>, pool: &'a ConstantPool) -> Attribute<'a> {
    Attribute::ModuleTarget(ModuleTargetAttribute::Bound(BoundModuleTarget { raw, pool }))
}

fn write_payload(
    attribute: &Attribute<'_>,
    pool: &mut ConstantPool,
    out: &mut Vec<u8>,
) -> Result<()> {
    let Attribute::ModuleTarget(module_target) = attribute else {
        return Err(MAPPER.mismatch(attribute));
    };

    let target_platform = pool.intern(&module_target.target_platform()?)?;
    out.write_u16::<BigEndian>(target_platform.index())?;

    Ok(())
}

#[derive(Debug, Clone)]
pub enum ModuleTargetAttribute<'a> {
    /// Read from a class file; fields are decoded on access.
    Bound(BoundModuleTarget<'a>),
    /// Built in memory.
    Unbound(UnboundModuleTarget),
}
impl<'a> ModuleTargetAttribute<'a> {
    pub fn of(target_platform: Utf8Entry) -> Self {
        ModuleTargetAttribute::Unbound(UnboundModuleTarget { target_platform })
    }

    /// Interns `target_platform` into a pool private to this call.
    pub fn of_str(target_platform: &str) -> Result<Self> {
        let mut pool = ConstantPool::new();
        Ok(Self::of(pool.utf8_entry(target_platform)?))
    }

    pub fn target_platform(&self) -> Result<Utf8Entry> {
        match self {
            ModuleTargetAttribute::Bound(bound) => bound.target_platform(),
            ModuleTargetAttribute::Unbound(unbound) => Ok(unbound.target_platform.clone()),
        }
    }

    /// Decodes every field once and drops the reference to the class file buffer.
    pub fn to_unbound(&self) -> Result<ModuleTargetAttribute<'static>> {
        Ok(ModuleTargetAttribute::of(self.target_platform()?))
    }
}

#[derive(Clone)]
pub struct BoundModuleTarget<'a> {
    raw: RawAttribute<'a>,
    pool: &'a ConstantPool,
}
impl<'a> BoundModuleTarget<'a> {
    pub fn raw(&self) -> RawAttribute<'a> {
        self.raw
    }

    pub fn target_platform(&self) -> Result<Utf8Entry> {
        self.raw.utf8_at(self.pool, NAME, 0, PAYLOAD_LENGTH)
    }

    pub(super) fn source(&self) -> (RawAttribute<'a>, &'a ConstantPool) {
        (self.raw, self.pool)
    }
}
impl fmt::Debug for BoundModuleTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundModuleTarget")
            .field("raw", &self.raw)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnboundModuleTarget {
    target_platform: Utf8Entry,
}

#[cfg(test)]
mod module_target_tests {
    use super::*;
    use crate::{attributes::decode, ClassFileError};

    fn pool() -> ConstantPool {
        let mut pool = ConstantPool::new();
        pool.utf8_entry("ModuleTarget").unwrap();
        pool.utf8_entry("linux-amd64").unwrap();
        pool
    }

    #[test]
    fn it_should_decode_the_target_platform_lazily() {
        let pool = pool();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02];

        let Attribute::ModuleTarget(module_target) = decode(&buf, 0, &pool).unwrap() else {
            panic!("expected a ModuleTarget attribute");
        };

        assert!(matches!(module_target, ModuleTargetAttribute::Bound(_)));
        assert_eq!(
            pool.utf8_entry_at(2).unwrap(),
            module_target.target_platform().unwrap()
        );
    }

    #[test]
    fn it_should_fail_on_first_access_if_the_index_is_bad() {
        let pool = pool();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x07];

        // Decoding only records the cursor.
        let attribute = decode(&buf, 0, &pool).unwrap();
        let module_target = attribute.module_target().unwrap();

        assert!(matches!(
            module_target.target_platform(),
            Err(ClassFileError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn it_should_agree_between_bound_and_unbound() {
        let pool = pool();
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x02];
        let attribute = decode(&buf, 0, &pool).unwrap();
        let bound = attribute.module_target().unwrap();

        let unbound = ModuleTargetAttribute::of(pool.utf8_entry_at(2).unwrap());

        assert_eq!(
            bound.target_platform().unwrap(),
            unbound.target_platform().unwrap()
        );
        assert_eq!(
            unbound.target_platform().unwrap(),
            bound.to_unbound().unwrap().target_platform().unwrap()
        );
    }

    #[test]
    fn it_should_return_the_same_entry_every_time() {
        let mut pool = ConstantPool::new();
        let entry = pool.utf8_entry("windows-amd64").unwrap();
        let module_target = ModuleTargetAttribute::of(entry.clone());

        assert_eq!(entry, module_target.target_platform().unwrap());
        assert_eq!(entry, module_target.target_platform().unwrap());
    }

    #[test]
    fn it_should_build_from_a_plain_string() {
        let module_target = ModuleTargetAttribute::of_str("linux-aarch64").unwrap();

        assert_eq!("linux-aarch64", module_target.target_platform().unwrap());
    }

    #[test]
    fn it_should_encode_the_unbound_form() {
        let mut pool = ConstantPool::new();
        let entry = pool.utf8_entry("linux-amd64").unwrap();
        let attribute = Attribute::ModuleTarget(ModuleTargetAttribute::of(entry));

        let mut out = Vec::new();
        attribute.write_to(&mut out, &mut pool).unwrap();

        assert_eq!(vec![0x00, 0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01], out);
    }

    #[test]
    fn it_should_refuse_to_write_another_kind() {
        let attribute = Attribute::SourceFile(
            crate::attributes::SourceFileAttribute::of_str("A.java").unwrap(),
        );

        assert!(matches!(
            MAPPER.write_payload(&attribute, &mut ConstantPool::new(), &mut Vec::new()),
            Err(ClassFileError::InvalidArgument(_))
        ));
    }
}
