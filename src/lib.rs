//! shbootimg library exports.
//!
//! - `bootimg` - kernel + boot + recovery image packer
//! - `edify` - device-specific OTA script emitters
//! - `config` - environment configuration
//! - `timing` - phase timer

pub mod bootimg;
pub mod config;
pub mod edify;
pub mod timing;
