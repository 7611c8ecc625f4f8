use std::io::{self, Cursor};

use byteorder::{BigEndian, ReadBytesExt};

use crate::{
    attributes::RawAttribute,
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, CpInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, ModuleInfo,
        NameAndTypeInfo, PackageInfo, RefInfo,
    },
    AccessFlags, ClassFile, ClassFileError, ConstantPool, Result,
};

type Endian = BigEndian;

/// Reads a class file out of a borrowed buffer.
///
/// Attributes are not copied: the resulting [`ClassFile`] keeps cursors into the buffer and
/// decodes them on request.
pub struct Parser<'a> {
    r: Cursor<&'a [u8]>,
}
impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            r: Cursor::new(buf),
        }
    }

    pub fn parse(mut self) -> Result<ClassFile<'a>> {
        self.parse_magic_identifier()?;
        let version = self.parse_version()?;

        let constant_pool = self.parse_constant_pool()?;
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let this_class = self.read_u16()?;
        let super_class = self.read_u16()?;
        let interfaces_count = self.read_u16()?;

        let mut interfaces = vec![0u16; interfaces_count as usize];
        self.r.read_u16_into::<Endian>(&mut interfaces)?;

        let fields_count = self.read_u16()?;
        let fields = (0..fields_count)
            .map(|_| self.parse_field_info())
            .collect::<Result<Vec<_>>>()?;

        let methods_count = self.read_u16()?;
        let methods = (0..methods_count)
            .map(|_| self.parse_method_info())
            .collect::<Result<Vec<_>>>()?;

        let attributes = self.parse_attributes()?;

        Ok(ClassFile {
            version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_field_info(&mut self) -> Result<FieldInfo<'a>> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes = self.parse_attributes()?;

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_method_info(&mut self) -> Result<MethodInfo<'a>> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;
        let attributes = self.parse_attributes()?;

        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            0xCAFEBABE => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        Ok((major, minor))
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()?;

        let count = constant_pool_count.saturating_sub(1) as usize;
        let mut cp_infos = Vec::with_capacity(count);
        while cp_infos.len() < count {
            let (cp_info, slot_size) = self.parse_cp_info()?;
            cp_infos.push(cp_info);

            if slot_size == 2 {
                // An 8-byte constant in the last slot has nowhere to put its second half.
                if cp_infos.len() == count {
                    return Err(ClassFileError::InvalidConstantPoolIndex(constant_pool_count));
                }
                cp_infos.push(CpInfo::Unusable);
            }
        }

        ConstantPool::with_entries(cp_infos)
    }

    fn parse_cp_info(&mut self) -> Result<(CpInfo, usize)> {
        let tag = self.read_u8()?;
        let cp_info = match tag {
            1 => self.parse_utf8()?,
            3 => CpInfo::Integer(self.r.read_i32::<Endian>()?),
            4 => CpInfo::Float(f32::from_bits(self.read_u32()?)),
            5 => return Ok((CpInfo::Long(self.r.read_i64::<Endian>()?), 2)),
            6 => {
                let bits = self.r.read_u64::<Endian>()?;
                return Ok((CpInfo::Double(f64::from_bits(bits)), 2));
            }
            7 => CpInfo::Class(ClassInfo {
                name_index: self.read_u16()?,
            }),
            8 => CpInfo::String {
                string_index: self.read_u16()?,
            },
            9 => CpInfo::FieldRef(self.parse_ref_info()?),
            10 => CpInfo::MethodRef(self.parse_ref_info()?),
            11 => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            12 => CpInfo::NameAndType(NameAndTypeInfo {
                name_index: self.read_u16()?,
                descriptor_index: self.read_u16()?,
            }),
            15 => CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind: self.read_u8()?,
                reference_index: self.read_u16()?,
            }),
            16 => CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.read_u16()?,
            }),
            17 => CpInfo::Dynamic(self.parse_dynamic_info()?),
            18 => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            19 => CpInfo::Module(ModuleInfo {
                name_index: self.read_u16()?,
            }),
            20 => CpInfo::Package(PackageInfo {
                name_index: self.read_u16()?,
            }),
            _ => return Err(ClassFileError::InvalidCpInfoTag(tag)),
        };

        Ok((cp_info, 1))
    }

    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length as usize)?;

        let value = cesu8::from_java_cesu8(bytes).map_err(ClassFileError::InvalidModifiedUtf8)?;
        Ok(CpInfo::Utf8(value.into_owned().into()))
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_attribute(&mut self) -> Result<RawAttribute<'a>> {
        let raw = RawAttribute::read(*self.r.get_ref(), self.r.position() as usize)?;
        self.r.set_position(raw.end() as u64);

        Ok(raw)
    }

    fn parse_attributes(&mut self) -> Result<Vec<RawAttribute<'a>>> {
        let attributes_count = self.read_u16()?;
        (0..attributes_count)
            .map(|_| self.parse_attribute())
            .collect()
    }

    fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let buf: &'a [u8] = *self.r.get_ref();
        let start = self.r.position() as usize;
        let bytes = start
            .checked_add(length)
            .and_then(|end| buf.get(start..end))
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        self.r.set_position((start + length) as u64);

        Ok(bytes)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(self.r.read_u32::<Endian>()?)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(self.r.read_u16::<Endian>()?)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.r.read_u8()?)
    }
}

#[cfg(test)]
mod parse_magic_identifier_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_the_correct_identifier() {
        assert!(Parser::new(&[0xca, 0xfe, 0xba, 0xbe])
            .parse_magic_identifier()
            .is_ok());
    }

    #[test]
    fn it_should_fail_if_there_is_not_enough_data() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xba]).parse_magic_identifier(),
            Err(ClassFileError::IOError(_))
        ));
    }

    #[test]
    fn it_should_fail_if_the_magic_identifier_is_incorrect() {
        assert!(matches!(
            Parser::new(&[0xca, 0xfe, 0xda, 0xda]).parse_magic_identifier(),
            Err(ClassFileError::InvalidMagicIdentifier(0xCAFEDADA))
        ));
    }
}

#[cfg(test)]
mod parse_version_tests {
    use super::*;

    #[test]
    fn it_should_be_able_to_parse_a_version() {
        assert_eq!(
            Parser::new(&[0x00, 0x00, 0x00, 0x41]).parse_version().unwrap(),
            (65, 0)
        );
    }
}
