use crate::{
    attributes::{AttributeRegistry, Attributes, ModuleTargetAttribute, RawAttribute},
    constant_pool::ClassInfo,
    parser::Parser,
    AccessFlags, ConstantPool, Result,
};

/// A class file parsed from a buffer that must outlive it.
#[derive(Debug)]
pub struct ClassFile<'a> {
    /// `(major, minor)`
    pub version: (u16, u16),
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo<'a>>,
    pub methods: Vec<MethodInfo<'a>>,
    pub attributes: Vec<RawAttribute<'a>>,
}
impl<'a> ClassFile<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<ClassFile<'a>> {
        Parser::new(buf).parse()
    }

    pub fn is_module(&self) -> bool {
        self.access_flags.contains(AccessFlags::MODULE)
    }

    /// Decodes `raws` against this class's constant pool. Any malformed attribute is an error.
    pub fn decode_attributes(&self, raws: &[RawAttribute<'a>]) -> Result<Attributes<'_>> {
        let registry = AttributeRegistry::standard();
        raws.iter()
            .map(|raw| registry.decode_raw(*raw, &self.constant_pool))
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    /// Decodes `raws`, keeping recognized attributes with a bad length as unknown ones.
    pub fn decode_attributes_lenient(&self, raws: &[RawAttribute<'a>]) -> Result<Attributes<'_>> {
        let registry = AttributeRegistry::standard();
        raws.iter()
            .map(|raw| registry.decode_raw_lenient(*raw, &self.constant_pool))
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    pub fn class_attributes(&self) -> Result<Attributes<'_>> {
        self.decode_attributes(&self.attributes)
    }

    pub fn class_attributes_lenient(&self) -> Result<Attributes<'_>> {
        self.decode_attributes_lenient(&self.attributes)
    }

    pub fn module_target(&self) -> Result<Option<ModuleTargetAttribute<'_>>> {
        Ok(self.class_attributes()?.module_target().cloned())
    }

    pub fn super_class(&self) -> Result<Option<&str>> {
        // Zero only for java/lang/Object, the one class without a direct superclass.
        if self.super_class == 0 {
            return Ok(None);
        }

        let ClassInfo { name_index } =
            matches_cp_info!(self.constant_pool, self.super_class, Class)?;

        self.utf8(*name_index).map(Some)
    }

    pub fn class_name(&self) -> Result<&str> {
        let ClassInfo { name_index } =
            matches_cp_info!(self.constant_pool, self.this_class, Class)?;

        self.utf8(*name_index)
    }

    pub fn field_name(&self, field: &FieldInfo<'_>) -> Result<&str> {
        self.utf8(field.name_index)
    }

    pub fn field_descriptor(&self, field: &FieldInfo<'_>) -> Result<&str> {
        self.utf8(field.descriptor_index)
    }

    pub fn method_name(&self, method: &MethodInfo<'_>) -> Result<&str> {
        self.utf8(method.name_index)
    }

    pub fn method_descriptor(&self, method: &MethodInfo<'_>) -> Result<&str> {
        self.utf8(method.descriptor_index)
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        let value = matches_cp_info!(self.constant_pool, index, Utf8)?;
        Ok(&**value)
    }
}

#[derive(Debug)]
pub struct FieldInfo<'a> {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<RawAttribute<'a>>,
}

#[derive(Debug)]
pub struct MethodInfo<'a> {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<RawAttribute<'a>>,
}
