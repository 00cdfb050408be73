//! Connection configuration record.

use serde::{Deserialize, Serialize};

use crate::err::{Error, Result};

/// Page sizes accepted by the host engine and the compressed layer, in KiB.
const PAGE_SIZES_KIB: &[u32] = &[1, 2, 4, 8, 16, 32, 64];

/// Tuning options applied when opening a compressed database.
///
/// Unknown keys are rejected when parsing from JSON; all keys are optional
/// and default as documented per field. Page sizes are fixed at database
/// creation; the remaining options take effect per connection.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Disable synchronous writes and journaling and defer foreign keys for
    /// this connection's lifetime. Data loss risk on crash.
    pub unsafe_load: bool,
    /// Host engine page-cache size in MiB.
    #[serde(rename = "page_cache_MiB")]
    pub page_cache_mib: i64,
    /// Worker budget for the compressor and external merge sort;
    /// `-1` resolves to `min(host cpus, 8)`.
    pub threads: i64,
    /// Compression level in `[-5, 22]` for newly written outer pages.
    pub zstd_level: i32,
    /// Host engine page size in KiB; fixed at creation.
    #[serde(rename = "inner_page_KiB")]
    pub inner_page_kib: u32,
    /// Compressed outer page size in KiB; fixed at creation.
    #[serde(rename = "outer_page_KiB")]
    pub outer_page_kib: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            unsafe_load: false,
            page_cache_mib: 1024,
            threads: -1,
            zstd_level: 6,
            inner_page_kib: 16,
            outer_page_kib: 32,
        }
    }
}

impl Config {
    /// Parse a configuration from a JSON object, rejecting unknown keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value against its documented domain.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("inner_page_KiB", self.inner_page_kib),
            ("outer_page_KiB", self.outer_page_kib),
        ] {
            if !PAGE_SIZES_KIB.contains(&value) {
                return Err(Error::Config(format!(
                    "{} must be one of {:?}, got {}",
                    key, PAGE_SIZES_KIB, value
                )));
            }
        }
        if !(-5..=22).contains(&self.zstd_level) {
            return Err(Error::Config(format!(
                "zstd_level must be in -5..=22, got {}",
                self.zstd_level
            )));
        }
        if self.threads != -1 && self.threads < 1 {
            return Err(Error::Config(format!(
                "threads must be -1 or positive, got {}",
                self.threads
            )));
        }
        if self.page_cache_mib < 1 {
            return Err(Error::Config(format!(
                "page_cache_MiB must be positive, got {}",
                self.page_cache_mib
            )));
        }
        Ok(())
    }

    /// Worker-thread budget with `-1` resolved against the host CPU count.
    pub fn resolved_threads(&self) -> i64 {
        if self.threads >= 1 {
            self.threads
        } else {
            let cpus = std::thread::available_parallelism()
                .map(|n| n.get() as i64)
                .unwrap_or(1);
            cpus.min(8)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::Config;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(!config.unsafe_load);
        assert_eq!(config.page_cache_mib, 1024);
        assert_eq!(config.threads, -1);
        assert_eq!(config.zstd_level, 6);
        assert_eq!(config.inner_page_kib, 16);
        assert_eq!(config.outer_page_kib, 32);
        assert!(config.validate().is_ok());
        let resolved = config.resolved_threads();
        assert!((1..=8).contains(&resolved));
    }

    #[test]
    fn parse_json() -> Result<(), anyhow::Error> {
        let config = Config::from_json(r#"{"zstd_level": 19, "threads": 3}"#)?;
        assert_eq!(config.zstd_level, 19);
        assert_eq!(config.threads, 3);
        assert_eq!(config.resolved_threads(), 3);
        // defaults fill the rest
        assert_eq!(config.inner_page_kib, 16);

        let roundtrip = Config::from_json(&serde_json::to_string(&config)?)?;
        assert_eq!(roundtrip, config);
        Ok(())
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(Config::from_json(r#"{"zstd_leval": 3}"#).is_err());
    }

    #[rstest::rstest]
    #[case(r#"{"inner_page_KiB": 7}"#)]
    #[case(r#"{"outer_page_KiB": 128}"#)]
    #[case(r#"{"zstd_level": 23}"#)]
    #[case(r#"{"zstd_level": -6}"#)]
    #[case(r#"{"threads": 0}"#)]
    #[case(r#"{"page_cache_MiB": 0}"#)]
    fn out_of_domain_rejected(#[case] json: &str) {
        assert!(Config::from_json(json).is_err());
    }
}
