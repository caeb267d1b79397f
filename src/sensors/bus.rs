// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Register-level bus transport shared by all chip drivers

use std::time::Duration;

use crate::error::BusError;

/// Byte/word register access to devices on a shared bus.
///
/// The bus is exclusive per address; the manager guarantees that by scanning
/// slots one after the other on a single thread.
pub trait RegisterBus {
    fn read_register(&mut self, addr: u8, reg: u8) -> Result<u8, BusError>;

    fn write_register(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError>;

    /// Little-endian word read (SMBus read word)
    fn read_word(&mut self, addr: u8, reg: u8) -> Result<u16, BusError>;

    /// Bounded wait for a chip to finish integrating.
    fn settle(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_register(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
        (**self).read_register(addr, reg)
    }

    fn write_register(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
        (**self).write_register(addr, reg, value)
    }

    fn read_word(&mut self, addr: u8, reg: u8) -> Result<u16, BusError> {
        (**self).read_word(addr, reg)
    }

    fn settle(&mut self, duration: Duration) {
        (**self).settle(duration)
    }
}

#[cfg(feature = "hardware")]
pub use linux::I2cdevBus;

#[cfg(feature = "hardware")]
mod linux {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use i2cdev::core::I2CDevice;
    use i2cdev::linux::LinuxI2CDevice;
    use tracing::debug;

    use super::RegisterBus;
    use crate::error::BusError;

    /// Linux `/dev/i2c-N` adapter, one device handle per slave address
    pub struct I2cdevBus {
        path: PathBuf,
        devices: HashMap<u8, LinuxI2CDevice>,
    }

    impl I2cdevBus {
        pub fn open(path: &Path) -> Result<Self, BusError> {
            if !path.exists() {
                return Err(BusError::Io(format!("{} does not exist", path.display())));
            }
            Ok(Self {
                path: path.to_path_buf(),
                devices: HashMap::new(),
            })
        }

        fn device(&mut self, addr: u8) -> Result<&mut LinuxI2CDevice, BusError> {
            if !self.devices.contains_key(&addr) {
                let dev = LinuxI2CDevice::new(&self.path, u16::from(addr))
                    .map_err(|e| BusError::Io(e.to_string()))?;
                debug!("Opened {} for address {:#04x}", self.path.display(), addr);
                self.devices.insert(addr, dev);
            }
            self.devices
                .get_mut(&addr)
                .ok_or_else(|| BusError::Io(format!("no handle for {:#04x}", addr)))
        }
    }

    impl RegisterBus for I2cdevBus {
        fn read_register(&mut self, addr: u8, reg: u8) -> Result<u8, BusError> {
            self.device(addr)?
                .smbus_read_byte_data(reg)
                .map_err(|e| BusError::Read { addr, reg, reason: e.to_string() })
        }

        fn write_register(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), BusError> {
            self.device(addr)?
                .smbus_write_byte_data(reg, value)
                .map_err(|e| BusError::Write { addr, reg, reason: e.to_string() })
        }

        fn read_word(&mut self, addr: u8, reg: u8) -> Result<u16, BusError> {
            self.device(addr)?
                .smbus_read_word_data(reg)
                .map_err(|e| BusError::Read { addr, reg, reason: e.to_string() })
        }
    }
}
