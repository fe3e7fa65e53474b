//! Partition table from the recovery fstab.
//!
//! Format, one partition per line:
//!
//! ```text
//! # mount_point  fs_type  device              [device2]  [options]
//! /boot          emmc     /dev/block/mmcblk0p5
//! /data          ext4     /dev/block/mmcblk0p10          length=-16384
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FstabError {
    #[error("Malformed fstab line {line}: {content:?}")]
    Malformed { line: usize, content: String },
    #[error("Invalid length option on line {line}: {value:?}")]
    InvalidLength { line: usize, value: String },
}

/// One partition entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub mount_point: String,
    pub fs_type: String,
    pub device: String,
    #[serde(default)]
    pub device2: Option<String>,
    #[serde(default)]
    pub length: i64,
}

/// Partitions keyed by mount point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fstab {
    entries: BTreeMap<String, Partition>,
}

impl Fstab {
    /// Parse recovery.fstab text.
    pub fn parse(text: &str) -> Result<Self, FstabError> {
        let mut fstab = Self::default();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 3 {
                return Err(FstabError::Malformed {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }

            let mut partition = Partition {
                mount_point: fields[0].to_string(),
                fs_type: fields[1].to_string(),
                device: fields[2].to_string(),
                device2: None,
                length: 0,
            };

            // A fourth field is either a second device or the option list.
            let mut options = fields.get(3).copied();
            if let Some(field) = options {
                if field.starts_with('/') {
                    partition.device2 = Some(field.to_string());
                    options = fields.get(4).copied();
                }
            }

            for option in options.into_iter().flat_map(|o| o.split(',')) {
                if let Some(value) = option.strip_prefix("length=") {
                    partition.length = value.parse().map_err(|_| FstabError::InvalidLength {
                        line: idx + 1,
                        value: value.to_string(),
                    })?;
                }
            }

            fstab.insert(partition);
        }

        Ok(fstab)
    }

    pub fn insert(&mut self, partition: Partition) {
        self.entries.insert(partition.mount_point.clone(), partition);
    }

    pub fn get(&self, mount_point: &str) -> Option<&Partition> {
        self.entries.get(mount_point)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.entries.values()
    }
}

/// Device metadata handed to the script generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub fstab: Option<Fstab>,
}

impl DeviceInfo {
    pub fn with_fstab(fstab: Fstab) -> Self {
        Self { fstab: Some(fstab) }
    }

    /// Load device info from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FSTAB: &str = "\
# mount point\tfstype\t\tdevice\t\t\t[device2]
/efs\t\text4\t\t/dev/block/mmcblk0p1
/boot\t\temmc\t\t/dev/block/mmcblk0p5
/sdcard\t\tvfat\t\t/dev/block/mmcblk0p11\t/dev/block/mmcblk0
/data\t\text4\t\t/dev/block/mmcblk0p10\tlength=-16384
";

    #[test]
    fn test_parse_fstab() {
        let fstab = Fstab::parse(FSTAB).unwrap();
        assert_eq!(fstab.len(), 4);

        let boot = fstab.get("/boot").unwrap();
        assert_eq!(boot.fs_type, "emmc");
        assert_eq!(boot.device, "/dev/block/mmcblk0p5");
        assert_eq!(boot.device2, None);

        let sdcard = fstab.get("/sdcard").unwrap();
        assert_eq!(sdcard.device2.as_deref(), Some("/dev/block/mmcblk0"));

        assert_eq!(fstab.get("/data").unwrap().length, -16384);
    }

    #[test]
    fn test_parse_malformed_line() {
        let err = Fstab::parse("/system ext4\n").unwrap_err();
        assert_eq!(
            err,
            FstabError::Malformed {
                line: 1,
                content: "/system ext4".to_string()
            }
        );
    }

    #[test]
    fn test_parse_bad_length() {
        let err = Fstab::parse("/data ext4 /dev/block/mmcblk0p10 length=big\n").unwrap_err();
        assert!(matches!(err, FstabError::InvalidLength { line: 1, .. }));
    }

    #[test]
    fn test_device_info_from_json() {
        let json = r#"{
            "fstab": {
                "/system": {
                    "mount_point": "/system",
                    "fs_type": "ext4",
                    "device": "/dev/block/mmcblk0p9"
                }
            }
        }"#;
        let info = DeviceInfo::from_json(json).unwrap();
        let fstab = info.fstab.unwrap();
        assert_eq!(fstab.get("/system").unwrap().length, 0);
    }

    #[test]
    fn test_device_info_without_fstab() {
        let info = DeviceInfo::from_json("{}").unwrap();
        assert!(info.fstab.is_none());
    }
}
