mod builder;
mod module_target;
mod raw;
mod registry;
mod source_file;
mod unknown;

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use log::trace;

use crate::{ClassFileError, ConstantPool, Result};

pub use self::{
    builder::{AttributesBuilder, BuilderState},
    module_target::{BoundModuleTarget, ModuleTargetAttribute, UnboundModuleTarget},
    raw::RawAttribute,
    registry::{AttributeCardinality, AttributeMapper, AttributeRegistry},
    source_file::{BoundSourceFile, SourceFileAttribute, UnboundSourceFile},
    unknown::UnknownAttribute,
};

/// Reads the attribute starting at `offset` and dispatches it through the standard registry.
pub fn decode<'a>(buf: &'a [u8], offset: usize, pool: &'a ConstantPool) -> Result<Attribute<'a>> {
    AttributeRegistry::standard().decode(buf, offset, pool)
}

/// Writes `attribute` in its `attribute_info` form, interning names and values into `pool`.
pub fn encode<W: Write>(attribute: &Attribute<'_>, out: &mut W, pool: &mut ConstantPool) -> Result<()> {
    attribute.write_to(out, pool)
}

/// Every attribute kind this crate understands, plus the opaque fallback.
#[derive(Debug, Clone)]
pub enum Attribute<'a> {
    ModuleTarget(ModuleTargetAttribute<'a>),
    SourceFile(SourceFileAttribute<'a>),
    Unknown(UnknownAttribute<'a>),
}
impl<'a> Attribute<'a> {
    pub fn name(&self) -> &str {
        match self {
            Attribute::ModuleTarget(_) => module_target::NAME,
            Attribute::SourceFile(_) => source_file::NAME,
            Attribute::Unknown(unknown) => unknown.name().as_str(),
        }
    }

    fn mapper(&self) -> &'static AttributeMapper {
        match self {
            Attribute::ModuleTarget(_) => &module_target::MAPPER,
            Attribute::SourceFile(_) => &source_file::MAPPER,
            Attribute::Unknown(_) => &unknown::MAPPER,
        }
    }

    /// The cardinality of the kind this attribute is named after. An unknown attribute carrying
    /// the name of a standard kind, such as one kept by a lenient read, counts as that kind.
    pub fn cardinality(&self) -> AttributeCardinality {
        match self {
            Attribute::Unknown(unknown) => AttributeRegistry::standard()
                .mapper(unknown.name().as_str())
                .map_or(AttributeCardinality::Repeatable, AttributeMapper::cardinality),
            _ => self.mapper().cardinality(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound_source().is_some()
    }

    pub fn module_target(&self) -> Option<&ModuleTargetAttribute<'a>> {
        match self {
            Attribute::ModuleTarget(module_target) => Some(module_target),
            _ => None,
        }
    }

    pub fn source_file(&self) -> Option<&SourceFileAttribute<'a>> {
        match self {
            Attribute::SourceFile(source_file) => Some(source_file),
            _ => None,
        }
    }

    fn bound_source(&self) -> Option<(RawAttribute<'a>, &'a ConstantPool)> {
        match self {
            Attribute::ModuleTarget(ModuleTargetAttribute::Bound(bound)) => Some(bound.source()),
            Attribute::SourceFile(SourceFileAttribute::Bound(bound)) => Some(bound.source()),
            Attribute::Unknown(unknown) => Some(unknown.source()),
            _ => None,
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W, pool: &mut ConstantPool) -> Result<()> {
        if let Some((raw, source)) = self.bound_source() {
            if pool.can_write_direct(source) {
                trace!("Copying {} attribute verbatim", self.name());
                out.write_all(raw.bytes())?;
                return Ok(());
            }
        }

        let mut payload = Vec::new();
        let name = match self {
            // The payload goes first so that a refused write leaves `pool` untouched.
            Attribute::Unknown(unknown) => {
                self.mapper().write_payload(self, pool, &mut payload)?;
                pool.intern(unknown.name())?
            }
            _ => {
                let name = pool.utf8_entry(self.name())?;
                self.mapper().write_payload(self, pool, &mut payload)?;
                name
            }
        };
        let length = u32::try_from(payload.len()).map_err(|_| {
            ClassFileError::InvalidArgument(format!(
                "{} attribute payload of {} bytes is too large",
                self.name(),
                payload.len()
            ))
        })?;

        out.write_u16::<BigEndian>(name.index())?;
        out.write_u32::<BigEndian>(length)?;
        out.write_all(&payload)?;

        Ok(())
    }
}

/// The attributes of one class, field or method, in emission order.
#[derive(Debug, Clone, Default)]
pub struct Attributes<'a>(pub Vec<Attribute<'a>>);
impl<'a> Attributes<'a> {
    /// Returns the last attribute called `name`, which is the one that counts for singletons.
    pub fn find_by_name(&self, name: &str) -> Option<&Attribute<'a>> {
        self.0.iter().rev().find(|a| a.name() == name)
    }

    pub fn module_target(&self) -> Option<&ModuleTargetAttribute<'a>> {
        self.0.iter().rev().find_map(Attribute::module_target)
    }

    pub fn source_file(&self) -> Option<&SourceFileAttribute<'a>> {
        self.0.iter().rev().find_map(Attribute::source_file)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute<'a>> {
        self.0.iter()
    }

    /// Writes `attributes_count` followed by every attribute.
    pub fn write_to<W: Write>(&self, out: &mut W, pool: &mut ConstantPool) -> Result<()> {
        let count = u16::try_from(self.0.len()).map_err(|_| {
            ClassFileError::InvalidArgument(format!("{} attributes do not fit in a u2", self.0.len()))
        })?;

        out.write_u16::<BigEndian>(count)?;
        self.0.iter().try_for_each(|a| a.write_to(out, pool))
    }
}
impl<'a> IntoIterator for Attributes<'a> {
    type Item = Attribute<'a>;
    type IntoIter = std::vec::IntoIter<Attribute<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
impl<'a, 'b> IntoIterator for &'b Attributes<'a> {
    type Item = &'b Attribute<'a>;
    type IntoIter = std::slice::Iter<'b, Attribute<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
