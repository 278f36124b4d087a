//! Async convenience functions
//!
//! Thin tokio wrappers over the synchronous core, which itself has no
//! suspension points: the blocking work runs on the blocking thread pool.
//! Available with the `async` feature.

use crate::{CodecStats, MaxBits, Options, Result};
use std::path::Path;

/// Compress a file on the blocking pool. See [`crate::pack_file`].
pub async fn pack_file_async<P, Q>(
    input: P,
    output: Q,
    opts: Options,
    max_bits: MaxBits,
) -> Result<CodecStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || crate::pack_file(input, output, opts, max_bits)).await?
}

/// Decompress a file on the blocking pool. See [`crate::unpack_file`].
pub async fn unpack_file_async<P, Q>(input: P, output: Q, opts: Options) -> Result<CodecStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let input = input.as_ref().to_path_buf();
    let output = output.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || crate::unpack_file(input, output, opts)).await?
}

/// Compress a byte buffer on the blocking pool.
pub async fn pack_bytes_async(data: Vec<u8>, max_bits: MaxBits) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || crate::pack_bytes(&data, max_bits)).await?
}

/// Decompress a byte buffer on the blocking pool.
pub async fn unpack_bytes_async(data: Vec<u8>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || crate::unpack_bytes(&data)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_async_bytes_round_trip() {
        let data = b"async round trip data, repeated a little: abcabcabc".to_vec();
        let packed = pack_bytes_async(data.clone(), MaxBits::DEFAULT).await.unwrap();
        let unpacked = unpack_bytes_async(packed).await.unwrap();
        assert_eq!(unpacked, data);
    }

    #[tokio::test]
    async fn test_async_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.bin");
        let packed = dir.path().join("input.lzw");
        let restored = dir.path().join("restored.bin");

        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&input, &data).unwrap();

        pack_file_async(&input, &packed, Options::default(), MaxBits::DEFAULT)
            .await
            .unwrap();
        unpack_file_async(&packed, &restored, Options::default())
            .await
            .unwrap();

        assert_eq!(std::fs::read(&restored).unwrap(), data);
    }
}
