//! Extraction to disk and into memory.

pub mod crc_map;
pub mod engine;
pub mod member;

pub use crc_map::CrcMap;
pub use engine::ExtractionEngine;
pub use member::ExtractedMember;
pub use member::read_member;
