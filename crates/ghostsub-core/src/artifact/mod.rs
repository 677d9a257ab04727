pub mod checksum;
pub mod format;
