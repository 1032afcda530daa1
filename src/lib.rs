//! Dumps binary files as C `uint8_t` arrays for embedding firmware images.

pub mod dump;
pub mod util;
