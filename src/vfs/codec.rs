//! Page codec: zstd compression of fixed-size pages on a bounded worker pool.

use rayon::prelude::*;

use crate::err::{Error, Result};

/// Compress one inner page at the given zstd level.
pub fn compress_page(page: &[u8], level: i32) -> Result<Vec<u8>> {
    Ok(zstd::bulk::compress(page, level)?)
}

/// Decompress one stored block back into a page of the expected size.
pub fn decompress_page(block: &[u8], page_size: usize) -> Result<Vec<u8>> {
    let page = zstd::bulk::decompress(block, page_size)
        .map_err(|e| Error::Integrity(format!("corrupt compressed page: {}", e)))?;
    if page.len() != page_size {
        return Err(Error::Integrity(format!(
            "decompressed page is {} bytes, expected {}",
            page.len(),
            page_size
        )));
    }
    Ok(page)
}

/// Batch compressor over a bounded worker pool.
///
/// The pool is per store (hence per connection); batches are fanned across
/// it and collected in submission order, so the writer behind it can apply
/// them serially.
pub struct Compressor {
    pool: rayon::ThreadPool,
    level: i32,
}

impl Compressor {
    /// Build a compressor with the given level and worker budget.
    pub fn new(level: i32, threads: usize) -> Result<Self> {
        if !(-5..=22).contains(&level) {
            return Err(Error::Config(format!(
                "zstd_level must be in -5..=22, got {}",
                level
            )));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .map_err(|e| Error::Config(format!("compressor worker pool: {}", e)))?;
        Ok(Self { pool, level })
    }

    /// Compression level applied to newly written pages.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Compress a batch of `(pageno, page)` pairs in parallel.
    pub fn compress_batch(&self, pages: Vec<(i64, Vec<u8>)>) -> Result<Vec<(i64, Vec<u8>)>> {
        let level = self.level;
        self.pool.install(|| {
            pages
                .into_par_iter()
                .map(|(pageno, page)| Ok((pageno, compress_page(&page, level)?)))
                .collect()
        })
    }
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor")
            .field("level", &self.level)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::err::Error;

    fn sample_page(size: usize) -> Vec<u8> {
        // compressible but not constant
        (0..size).map(|i| ((i / 32) % 251) as u8).collect()
    }

    #[rstest::rstest]
    #[case(1024, -5)]
    #[case(16384, 1)]
    #[case(16384, 6)]
    #[case(65536, 19)]
    fn roundtrip(#[case] page_size: usize, #[case] level: i32) -> Result<(), anyhow::Error> {
        let page = sample_page(page_size);
        let block = super::compress_page(&page, level)?;
        assert!(block.len() < page_size);
        assert_eq!(super::decompress_page(&block, page_size)?, page);
        Ok(())
    }

    #[test]
    fn corrupt_block_detected() -> Result<(), anyhow::Error> {
        let mut block = super::compress_page(&sample_page(4096), 6)?;
        let mid = block.len() / 2;
        block.truncate(mid);
        assert!(matches!(
            super::decompress_page(&block, 4096),
            Err(Error::Integrity(_))
        ));
        Ok(())
    }

    #[test]
    fn batch_preserves_order() -> Result<(), anyhow::Error> {
        let compressor = super::Compressor::new(3, 4)?;
        let pages: Vec<(i64, Vec<u8>)> = (1..=64).map(|i| (i, sample_page(2048))).collect();
        let blocks = compressor.compress_batch(pages.clone())?;
        assert_eq!(blocks.len(), pages.len());
        for ((pageno, block), (expected_no, page)) in blocks.iter().zip(&pages) {
            assert_eq!(pageno, expected_no);
            assert_eq!(&super::decompress_page(block, 2048)?, page);
        }
        Ok(())
    }

    #[test]
    fn bad_level_rejected() {
        assert!(matches!(
            super::Compressor::new(23, 2),
            Err(Error::Config(_))
        ));
    }
}
