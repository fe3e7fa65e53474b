//! Edify script helpers for OTA packages.
//!
//! The generic generator (mounts, formats, asserts) lives elsewhere and is
//! seen here only through [`ScriptContext`]. [`DeviceScript`] adds the
//! device-specific emitters on top of any such context.

pub mod fstab;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

pub use fstab::{DeviceInfo, Fstab, FstabError, Partition};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EdifyError {
    #[error("No fstab entry for mount point {0:?}")]
    UnknownMountPoint(String),
}

/// What a script generator must expose for the device helpers to work.
pub trait ScriptContext {
    /// Append one entry to the script.
    fn append(&mut self, line: String);

    /// Device metadata, including the partition table if one was loaded.
    fn info(&self) -> &DeviceInfo;

    /// Record that `mount_point` has been unmounted.
    fn mark_unmounted(&mut self, mount_point: String);
}

/// Device-specific script emitters.
pub trait DeviceScript: ScriptContext {
    /// Unpack `src` from the OTA package to `dst` on the device.
    fn unpack_package_file(&mut self, src: &str, dst: &str) {
        self.append(format!("package_extract_file(\"{src}\", \"{dst}\");"));
    }

    /// Write package file `image` as a raw image to `partition`.
    ///
    /// The image is staged under /tmp and removed afterwards.
    fn emmc_write_raw_image(&mut self, partition: &str, image: &str) {
        self.append(format!(
            "assert(package_extract_file(\"{image}\", \"/tmp/{image}\"),\n       \
             write_raw_image(\"/tmp/{image}\", \"{partition}\"),\n       \
             delete(\"/tmp/{image}\"));"
        ));
    }

    /// Unmount the partition mounted at `mount_point`.
    ///
    /// Does nothing when the device has no fstab at all.
    fn unmount(&mut self, mount_point: &str) -> Result<(), EdifyError> {
        let Some(fstab) = self.info().fstab.as_ref() else {
            debug!(mount_point, "no fstab loaded, skipping unmount");
            return Ok(());
        };
        let target = fstab
            .get(mount_point)
            .map(|p| p.mount_point.clone())
            .ok_or_else(|| EdifyError::UnknownMountPoint(mount_point.to_string()))?;

        self.append(format!("unmount(\"{target}\");"));
        self.mark_unmounted(target);
        Ok(())
    }
}

impl<T: ScriptContext + ?Sized> DeviceScript for T {}

/// A plain in-memory script generator.
#[derive(Debug, Clone, Default)]
pub struct EdifyGenerator {
    pub script: Vec<String>,
    pub info: DeviceInfo,
    pub mounts: BTreeSet<String>,
}

impl EdifyGenerator {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            script: Vec::new(),
            info,
            mounts: BTreeSet::new(),
        }
    }

    /// The script as it would be written to updater-script.
    pub fn render(&self) -> String {
        let mut out = self.script.join("\n");
        out.push('\n');
        out
    }
}

impl ScriptContext for EdifyGenerator {
    fn append(&mut self, line: String) {
        self.script.push(line);
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn mark_unmounted(&mut self, mount_point: String) {
        self.mounts.insert(mount_point);
    }
}
