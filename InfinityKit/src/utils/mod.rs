//! Utility functions

pub mod byte_span;
pub mod path;

pub use byte_span::{ByteSpan, OffsetIndex, patch_i16, patch_u16, patch_u32, read_cstr, read_resref, resref_bytes};
pub use path::{find_case_insensitive, split_resource_name};
