// Common utilities shared by the hashing and APK parsing layers

pub mod hash;
pub mod binary;

// Re-exports for convenience
pub use hash::{FileDigests, HashAlgorithm, StreamingHasher, compute_hash, hash_file, hash_file_with_progress};
pub use binary::{read_u8_at, read_u16_at, read_u32_at, read_bytes_at, read_utf16_at};

// Shared constants
pub const BUFFER_SIZE: usize = 64 * 1024; // 64KB chunks for streaming hashes
