use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use tracing::debug;

pub const SECTOR_SIZE: usize = 512;
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// True when `sector` is a full boot sector ending in 0x55 0xAA.
pub fn has_boot_signature(sector: &[u8]) -> bool {
    sector.len() >= SECTOR_SIZE && sector[SECTOR_SIZE - 2..SECTOR_SIZE] == BOOT_SIGNATURE
}

#[derive(Debug)]
pub enum BootStatus {
    Bootable,
    NotBootable,
    Unreadable(io::Error),
}

#[derive(Debug)]
pub struct BootReport {
    pub device_path: PathBuf,
    pub status: BootStatus,
}

impl BootReport {
    /// Unreadable devices count as not bootable.
    pub fn is_bootable(&self) -> bool {
        matches!(self.status, BootStatus::Bootable)
    }
}

impl fmt::Display for BootReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.device_path.display();
        match &self.status {
            BootStatus::Bootable => {
                write!(f, "Disk {} is bootable (signature 0xAA55 found).", path)
            }
            BootStatus::NotBootable => {
                write!(f, "Disk {} is not bootable (signature 0xAA55 missing).", path)
            }
            BootStatus::Unreadable(e) => {
                write!(f, "Cannot read boot sector of {}: {}. Treating it as not bootable.", path, e)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct BootCheckCommand {
    dev_root: PathBuf,
}

impl Default for BootCheckCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl BootCheckCommand {
    pub fn new() -> Self {
        Self::with_dev_root("/dev")
    }

    pub fn with_dev_root(dev_root: impl Into<PathBuf>) -> Self {
        Self {
            dev_root: dev_root.into(),
        }
    }

    pub fn check(&self, device: &str) -> BootReport {
        let device_path = self.dev_root.join(device);
        let status = match read_sector(&device_path) {
            Ok(sector) if has_boot_signature(&sector) => BootStatus::Bootable,
            Ok(_) => BootStatus::NotBootable,
            Err(e) => BootStatus::Unreadable(e),
        };
        debug!(device = %device_path.display(), ?status, "boot sector checked");
        BootReport {
            device_path,
            status,
        }
    }
}

fn read_sector(path: &std::path::Path) -> io::Result<[u8; SECTOR_SIZE]> {
    let mut sector = [0u8; SECTOR_SIZE];
    File::open(path)?.read_exact(&mut sector)?;
    Ok(sector)
}
