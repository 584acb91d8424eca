#![doc = include_str!("../README.md")]

mod convert;
mod error;
mod tag;
mod value;

pub use convert::{ConversionRegistry, Converter};
pub use error::TypeError;
pub use tag::ValueTag;
pub use value::{FfiSignature, FfiValue, Handle};
