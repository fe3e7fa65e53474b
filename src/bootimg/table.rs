//! The textual offset table stored in the slot after the kernel.

use std::fmt;

use super::block::ImageExtent;
use super::{Error, BLOCK_SIZE};

const HEADER: &str = "\n\nBOOT_IMAGE_OFFSETS\n";
const TRAILER: &str = "\n\n";

/// Key/value record of where each sub-image lives, in blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetTable {
    entries: Vec<(&'static str, ImageExtent)>,
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an image under `name`, emitted as `<name>_offset` and `<name>_len`.
    pub fn push(&mut self, name: &'static str, extent: ImageExtent) {
        self.entries.push((name, extent));
    }

    /// Look up a previously recorded image.
    pub fn get(&self, name: &str) -> Option<ImageExtent> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, extent)| *extent)
    }

    /// Render the table, refusing anything that would not fit in one block.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let text = self.to_string();
        if text.len() as u64 > BLOCK_SIZE {
            return Err(Error::TableOverflow {
                len: text.len(),
                max: BLOCK_SIZE as usize,
            });
        }
        Ok(text.into_bytes())
    }
}

impl fmt::Display for OffsetTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HEADER)?;
        for (name, extent) in &self.entries {
            write!(f, "{name}_offset={};{name}_len={};", extent.offset, extent.len)?;
        }
        f.write_str(TRAILER)
    }
}
