//! Shared test utilities for shbootimg tests.
#![allow(dead_code)]

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const BLOCK: usize = 512;

/// Test environment with a scratch directory for input and output images.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let dir = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Write an input image and return its path.
    pub fn image(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.dir.join(name);
        fs::write(&path, data).expect("Failed to write input image");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// Read the table slot that starts at `table_offset`.
pub fn table_slot(image: &[u8], table_offset: usize) -> &[u8] {
    &image[table_offset..table_offset + BLOCK]
}

/// Parse the `key=value;` pairs out of an offset table slot.
pub fn parse_offset_table(slot: &[u8]) -> HashMap<String, u64> {
    let text = String::from_utf8_lossy(slot);
    assert!(
        text.starts_with("\n\nBOOT_IMAGE_OFFSETS\n"),
        "Offset table header missing: {:?}",
        text
    );

    let re = Regex::new(r"([a-z_]+)=(\d+);").unwrap();
    re.captures_iter(&text)
        .map(|c| (c[1].to_string(), c[2].parse().unwrap()))
        .collect()
}

/// Assert that `data` is all zero bytes.
pub fn assert_zeros(data: &[u8], what: &str) {
    assert!(
        data.iter().all(|&b| b == 0),
        "Expected zero padding in {}",
        what
    );
}

pub fn read(path: &Path) -> Vec<u8> {
    fs::read(path).expect("Failed to read output image")
}
