// https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7

#[macro_use]
pub mod constant_pool;
mod access_flags;
pub mod attributes;
mod class_file;
mod error;
mod parser;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo};
pub use access_flags::AccessFlags;
pub use attributes::{decode, encode, Attribute, Attributes, AttributesBuilder};
pub use constant_pool::{ConstantPool, Utf8Entry};
pub use error::ClassFileError;
pub use parser::Parser;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;
