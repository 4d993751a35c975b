pub mod csv;
pub mod formats;
pub mod json_utils;
pub mod xml;

pub use formats::{
    convert_formats, format_content, infer_format_from_name, ConversionError, FileFormat,
};
