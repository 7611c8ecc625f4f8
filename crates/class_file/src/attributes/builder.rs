use log::debug;

use super::{Attribute, AttributeCardinality, Attributes};
use crate::{ClassFileError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Accumulating,
    Finalizing,
    Emitted,
}

/// Collects the attributes of one class, field or method.
///
/// A singleton attribute replaces any earlier attribute of the same kind, so the survivor takes
/// the position of the latest occurrence. Repeatable attributes are kept in the order they were
/// added. Once [`build`](Self::build) has run the builder is frozen.
#[derive(Debug)]
pub struct AttributesBuilder<'a> {
    attributes: Vec<Attribute<'a>>,
    state: BuilderState,
}
impl<'a> AttributesBuilder<'a> {
    pub fn new() -> Self {
        Self {
            attributes: Vec::new(),
            state: BuilderState::Accumulating,
        }
    }

    /// Runs `f` over every attribute of `source`, then builds.
    ///
    /// `f` decides what ends up in the result: it may pass the attribute on, replace it, add
    /// others or drop it by not adding anything.
    pub fn transform<I, F>(source: I, mut f: F) -> Result<Attributes<'a>>
    where
        I: IntoIterator<Item = Attribute<'a>>,
        F: FnMut(&mut Self, Attribute<'a>) -> Result<()>,
    {
        let mut builder = Self::new();
        for attribute in source {
            f(&mut builder, attribute)?;
        }

        builder.build()
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn add(&mut self, attribute: Attribute<'a>) -> Result<&mut Self> {
        if self.state != BuilderState::Accumulating {
            return Err(ClassFileError::IllegalState(
                "cannot add attributes to an element that has been built",
            ));
        }

        if attribute.cardinality() == AttributeCardinality::Singleton {
            let before = self.attributes.len();
            self.attributes.retain(|a| a.name() != attribute.name());

            if self.attributes.len() != before {
                debug!("Replacing earlier {} attribute", attribute.name());
            }
        }

        self.attributes.push(attribute);
        Ok(self)
    }

    pub fn build(&mut self) -> Result<Attributes<'a>> {
        if self.state != BuilderState::Accumulating {
            return Err(ClassFileError::IllegalState("attributes have already been built"));
        }

        self.state = BuilderState::Finalizing;
        let attributes = std::mem::take(&mut self.attributes);
        debug!("Finalized {} attributes", attributes.len());
        self.state = BuilderState::Emitted;

        Ok(Attributes(attributes))
    }
}
impl Default for AttributesBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::{
        attributes::{
            decode, AttributeRegistry, ModuleTargetAttribute, RawAttribute, SourceFileAttribute,
        },
        ConstantPool,
    };

    fn module_target(platform: &str) -> Attribute<'static> {
        Attribute::ModuleTarget(ModuleTargetAttribute::of_str(platform).unwrap())
    }

    fn source_file(name: &str) -> Attribute<'static> {
        Attribute::SourceFile(SourceFileAttribute::of_str(name).unwrap())
    }

    fn platforms(attributes: &Attributes<'_>) -> Vec<String> {
        attributes
            .iter()
            .map(|a| match a {
                Attribute::ModuleTarget(m) => m.target_platform().unwrap().to_string(),
                Attribute::SourceFile(s) => s.source_file().unwrap().to_string(),
                Attribute::Unknown(u) => u.name().to_string(),
            })
            .collect()
    }

    #[test]
    fn it_should_keep_only_the_last_singleton() {
        let mut builder = AttributesBuilder::new();
        builder
            .add(module_target("linux-amd64"))
            .unwrap()
            .add(module_target("linux-aarch64"))
            .unwrap();

        let attributes = builder.build().unwrap();

        assert_eq!(vec!["linux-aarch64"], platforms(&attributes));
    }

    #[test]
    fn it_should_place_the_survivor_at_its_latest_position() {
        let mut builder = AttributesBuilder::new();
        builder.add(module_target("linux-amd64")).unwrap();
        builder.add(source_file("module-info.java")).unwrap();
        builder.add(module_target("linux-aarch64")).unwrap();

        let attributes = builder.build().unwrap();

        assert_eq!(
            vec!["module-info.java", "linux-aarch64"],
            platforms(&attributes)
        );
    }

    #[test]
    fn it_should_keep_every_repeatable_attribute() {
        let mut pool = ConstantPool::new();
        pool.utf8_entry("Vendor").unwrap();
        let first = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x01];
        let second = [0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x02];

        let mut builder = AttributesBuilder::new();
        builder.add(decode(&first, 0, &pool).unwrap()).unwrap();
        builder.add(decode(&second, 0, &pool).unwrap()).unwrap();
        let attributes = builder.build().unwrap();

        let contents = attributes
            .iter()
            .filter_map(|a| match a {
                Attribute::Unknown(u) => Some(u.contents()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(vec![&[0x01u8][..], &[0x02u8][..]], contents);
    }

    #[test]
    fn it_should_replace_a_downgraded_singleton_in_either_order() {
        let mut pool = ConstantPool::new();
        pool.utf8_entry("ModuleTarget").unwrap();
        pool.utf8_entry("linux-amd64").unwrap();
        // Three bytes where two are expected, so a lenient read keeps it as unknown.
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x02, 0x00];
        let raw = RawAttribute::read(&buf, 0).unwrap();
        let downgraded = || {
            AttributeRegistry::standard()
                .decode_raw_lenient(raw, &pool)
                .unwrap()
        };

        let mut builder = AttributesBuilder::new();
        builder.add(downgraded()).unwrap();
        builder.add(module_target("linux-aarch64")).unwrap();
        assert_eq!(vec!["linux-aarch64"], platforms(&builder.build().unwrap()));

        let mut builder = AttributesBuilder::new();
        builder.add(module_target("linux-aarch64")).unwrap();
        builder.add(downgraded()).unwrap();
        let attributes = builder.build().unwrap();
        assert_eq!(1, attributes.len());
        assert!(matches!(attributes.find_by_name("ModuleTarget"), Some(Attribute::Unknown(_))));
    }

    #[test]
    fn it_should_refuse_additions_after_build() {
        let mut builder = AttributesBuilder::new();
        builder.add(module_target("linux-amd64")).unwrap();
        builder.build().unwrap();

        assert_eq!(BuilderState::Emitted, builder.state());
        assert!(matches!(
            builder.add(source_file("A.java")),
            Err(ClassFileError::IllegalState(_))
        ));
        assert!(matches!(
            builder.build(),
            Err(ClassFileError::IllegalState(_))
        ));
    }

    #[test]
    fn it_should_resolve_duplicates_while_transforming() {
        let source = vec![
            module_target("linux-amd64"),
            source_file("module-info.java"),
            module_target("windows-amd64"),
        ];

        let attributes = AttributesBuilder::transform(source, |builder, attribute| {
            if attribute.name() != "SourceFile" {
                builder.add(attribute)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(vec!["windows-amd64"], platforms(&attributes));
    }

    #[test]
    fn it_should_let_a_transform_replace_an_attribute() {
        let source = vec![module_target("linux-amd64"), source_file("A.java")];

        let attributes = AttributesBuilder::transform(source, |builder, attribute| {
            builder.add(attribute)?;
            builder.add(module_target("macos-aarch64"))?;
            Ok(())
        })
        .unwrap();

        assert_eq!(vec!["A.java", "macos-aarch64"], platforms(&attributes));
    }
}
