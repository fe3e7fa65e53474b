//! Boot image packing.
//!
//! Concatenates a kernel, a boot filesystem image and an optional recovery
//! image into one file:
//!
//! ```text
//! [kernel][pad][offset table slot][boot][pad][recovery][pad]
//! ```
//!
//! Every image after the kernel starts on a 512-byte block boundary. The
//! block right after the kernel holds a text table telling the bootloader
//! where the boot and recovery images start and how many blocks they span.

pub mod block;
pub mod table;

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

pub use block::{align_offset, append_image, copy_data, ImageExtent};
pub use table::OffsetTable;

/// Alignment unit for every image placed after the kernel.
pub const BLOCK_SIZE: u64 = 512;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open input {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create output {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error while {0}")]
    Io(&'static str, #[source] io::Error),
    #[error("Offset table is {len} bytes, but the reserved slot holds {max}")]
    TableOverflow { len: usize, max: usize },
    #[error("Failed to sync output to disk")]
    Sync(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Where everything ended up in a packed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLayout {
    /// Byte offset of the offset table slot.
    pub table_offset: u64,
    pub boot: ImageExtent,
    pub recovery: Option<ImageExtent>,
    /// Total output length in bytes.
    pub total_len: u64,
}

/// Pack the images into `out`.
///
/// The kernel is written at the current position (byte 0 for a fresh sink).
/// The sink is flushed but not synced; see [`pack_files`] for durability.
pub fn pack<W, K, B, R>(
    out: &mut W,
    kernel: &mut K,
    boot: &mut B,
    recovery: Option<&mut R>,
) -> Result<PackLayout>
where
    W: Write + Seek + ?Sized,
    K: Read + ?Sized,
    B: Read + ?Sized,
    R: Read + ?Sized,
{
    let kernel_len = copy_data(out, kernel).map_err(|e| Error::Io("writing kernel", e))?;
    debug!(bytes = kernel_len, "kernel written");

    let table_offset = align_offset(out).map_err(|e| Error::Io("reserving offset table", e))?;
    out.write_all(&[0u8; BLOCK_SIZE as usize])
        .map_err(|e| Error::Io("reserving offset table", e))?;

    let mut table = OffsetTable::new();

    let boot_extent = append_image(out, boot).map_err(|e| Error::Io("writing boot image", e))?;
    debug!(offset = boot_extent.offset, len = boot_extent.len, "boot image appended");
    table.push("boot", boot_extent);

    let recovery_extent = match recovery {
        Some(recovery) => {
            let extent = append_image(out, recovery)
                .map_err(|e| Error::Io("writing recovery image", e))?;
            debug!(offset = extent.offset, len = extent.len, "recovery image appended");
            table.push("recovery", extent);
            Some(extent)
        }
        None => None,
    };

    let end = recovery_extent.unwrap_or(boot_extent).end() * BLOCK_SIZE;
    let total_len = block::pad_to_len(out, end).map_err(|e| Error::Io("padding output", e))?;

    let bytes = table.to_bytes()?;
    out.seek(SeekFrom::Start(table_offset))
        .and_then(|_| out.write_all(&bytes))
        .map_err(|e| Error::Io("writing offset table", e))?;
    out.flush().map_err(|e| Error::Io("flushing output", e))?;

    Ok(PackLayout {
        table_offset,
        boot: boot_extent,
        recovery: recovery_extent,
        total_len,
    })
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Pack image files into `output`, creating or truncating it, and sync it to disk.
pub fn pack_files(
    output: &Path,
    kernel: &Path,
    boot: &Path,
    recovery: Option<&Path>,
) -> Result<PackLayout> {
    let mut out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .map_err(|source| Error::Create {
            path: output.to_path_buf(),
            source,
        })?;

    let mut kernel = open_input(kernel)?;
    let mut boot = open_input(boot)?;
    let mut recovery = recovery.map(open_input).transpose()?;

    let layout = pack(&mut out, &mut kernel, &mut boot, recovery.as_mut())?;

    out.sync_all().map_err(Error::Sync)?;
    info!(
        output = %output.display(),
        bytes = layout.total_len,
        "boot image packed"
    );

    Ok(layout)
}
