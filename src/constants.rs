//! Core constants used by the limit checks.

/// Absolute maximum table size, in elements.
pub const MAX_TABLE_ELEMS: u64 = u32::MAX as u64;

/// Absolute maximum memory size, in 64KiB pages. A 32-bit memory cannot
/// address more.
pub const MAX_MEMORY_PAGES: u64 = 65536;
