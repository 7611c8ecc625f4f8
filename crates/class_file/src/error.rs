use thiserror::Error;

use crate::constant_pool;

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Malformed {attribute} attribute: {reason}")]
    MalformedAttribute { attribute: String, reason: String },
    #[error("Illegal state: {0}")]
    IllegalState(&'static str),
    #[error("Invalid constant pool index: {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("Expected {0}, found {1:?}")]
    UnexpectedConstantPoolEntry(&'static str, constant_pool::CpInfo),
    #[error("Constant pool is full")]
    ConstantPoolOverflow,
    #[error("Invalid modified UTF-8 in constant pool: {0}")]
    InvalidModifiedUtf8(cesu8::Cesu8DecodingError),
    #[error("Invalid cp info tag: {0}")]
    InvalidCpInfoTag(u8),
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
}

impl ClassFileError {
    pub(crate) fn malformed(attribute: &str, reason: impl Into<String>) -> Self {
        ClassFileError::MalformedAttribute {
            attribute: attribute.to_owned(),
            reason: reason.into(),
        }
    }
}
