use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{ClassFileError, Result};

// constant_pool_count is a u2 holding the number of slots plus one.
const MAX_SLOTS: usize = u16::MAX as usize - 1;

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(ref n) => Ok(n),
            c => Err($crate::ClassFileError::UnexpectedConstantPoolEntry(
                stringify!($i),
                c.clone(),
            )),
        }
    };
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

fn next_pool_id() -> u64 {
    NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed)
}

/// The constant pool of a class file.
///
/// Slots are 1-based and append-only: once an entry has an index it keeps it for the lifetime of
/// the pool and of every pool [derived](ConstantPool::derive) from it. Utf8 entries are
/// deduplicated, so interning the same string twice yields the same index.
#[derive(Debug)]
pub struct ConstantPool {
    id: u64,
    parent: Option<(u64, usize)>,
    cp_infos: Vec<CpInfo>,
    utf8_indices: HashMap<Arc<str>, u16>,
}
impl ConstantPool {
    pub fn new() -> Self {
        Self {
            id: next_pool_id(),
            parent: None,
            cp_infos: Vec::new(),
            utf8_indices: HashMap::new(),
        }
    }

    pub fn with_entries(cp_infos: Vec<CpInfo>) -> Result<Self> {
        if cp_infos.len() > MAX_SLOTS {
            return Err(ClassFileError::ConstantPoolOverflow);
        }

        let mut utf8_indices = HashMap::new();
        for (slot, cp_info) in cp_infos.iter().enumerate() {
            if let CpInfo::Utf8(value) = cp_info {
                utf8_indices
                    .entry(Arc::clone(value))
                    .or_insert(slot as u16 + 1);
            }
        }

        Ok(Self {
            id: next_pool_id(),
            parent: None,
            cp_infos,
            utf8_indices,
        })
    }

    /// Creates a writable copy in which every existing index stays valid.
    ///
    /// Attributes read against `self` can be copied verbatim into the derived pool as long as
    /// `self` has not grown since.
    pub fn derive(&self) -> ConstantPool {
        ConstantPool {
            id: next_pool_id(),
            parent: Some((self.id, self.cp_infos.len())),
            cp_infos: self.cp_infos.clone(),
            utf8_indices: self.utf8_indices.clone(),
        }
    }

    pub(crate) fn can_write_direct(&self, source: &ConstantPool) -> bool {
        self.id == source.id || self.parent == Some((source.id, source.cp_infos.len()))
    }

    /// Number of slots, including the unusable halves of 8-byte constants.
    pub fn len(&self) -> usize {
        self.cp_infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cp_infos.is_empty()
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        match index
            .checked_sub(1)
            .and_then(|slot| self.cp_infos.get(slot as usize))
        {
            None | Some(CpInfo::Unusable) => Err(ClassFileError::InvalidConstantPoolIndex(index)),
            Some(cp_info) => Ok(cp_info),
        }
    }

    pub fn utf8_entry_at(&self, index: u16) -> Result<Utf8Entry> {
        let value = matches_cp_info!(self, index, Utf8)?;

        Ok(Utf8Entry {
            index,
            value: Arc::clone(value),
        })
    }

    /// Returns the entry for `value`, appending it if the pool has none yet.
    pub fn utf8_entry(&mut self, value: &str) -> Result<Utf8Entry> {
        if let Some((value, &index)) = self.utf8_indices.get_key_value(value) {
            return Ok(Utf8Entry {
                index,
                value: Arc::clone(value),
            });
        }

        if value.len() > u16::MAX as usize {
            return Err(ClassFileError::InvalidArgument(format!(
                "Utf8 entry of {} bytes does not fit in a class file",
                value.len()
            )));
        }

        let value: Arc<str> = Arc::from(value);
        let index = self.push(CpInfo::Utf8(Arc::clone(&value)))?;
        self.utf8_indices.insert(Arc::clone(&value), index);

        Ok(Utf8Entry { index, value })
    }

    /// Maps an entry that may come from another pool onto this one.
    pub fn intern(&mut self, entry: &Utf8Entry) -> Result<Utf8Entry> {
        let already_here = matches!(
            self.get(entry.index),
            Ok(CpInfo::Utf8(value)) if &**value == entry.as_str()
        );

        if already_here {
            Ok(entry.clone())
        } else {
            self.utf8_entry(entry.as_str())
        }
    }

    fn push(&mut self, cp_info: CpInfo) -> Result<u16> {
        if self.cp_infos.len() >= MAX_SLOTS {
            return Err(ClassFileError::ConstantPoolOverflow);
        }

        self.cp_infos.push(cp_info);
        Ok(self.cp_infos.len() as u16)
    }
}
impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

/// A handle on a `CONSTANT_Utf8_info` entry.
///
/// Two handles from the same pool are equal iff they name the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Utf8Entry {
    index: u16,
    value: Arc<str>,
}
impl Utf8Entry {
    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}
impl fmt::Display for Utf8Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.value)
    }
}
impl PartialEq<str> for Utf8Entry {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
impl PartialEq<&str> for Utf8Entry {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
impl PartialEq<Utf8Entry> for str {
    fn eq(&self, other: &Utf8Entry) -> bool {
        self == other.as_str()
    }
}
impl PartialEq<Utf8Entry> for &str {
    fn eq(&self, other: &Utf8Entry) -> bool {
        *self == other.as_str()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    Utf8(Arc<str>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(ClassInfo),
    String { string_index: u16 },
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    NameAndType(NameAndTypeInfo),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Module(ModuleInfo),
    Package(PackageInfo),
    Unusable,
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // Must point at a CONSTANT_Utf8_info holding a binary class name in internal form.
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModuleInfo {
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PackageInfo {
    pub name_index: u16,
}
