//! TIFF constants: tag ids, field types and enumerated tag values.

pub mod tags;
