//! Camera module description: wiring, sensor variants and the
//! architecture seam.
//!
//! Everything here is plain data except [`Architecture`], the per-MCU-family
//! initialization layer that `Ov2640::begin` hands control to once the bus
//! is open.

pub mod probe;

use serde::{Deserialize, Serialize};

use crate::utils::controllers::sccb::{DriverError, RegisterAccess};

pub use probe::{SensorId, SensorProbe, REG_BANK_SEL};

/// Default I2C address of the OV2640 (as used on Arducam boards).
pub const OV2640_ADDR: u8 = 0x60;
/// Default I2C address of the OV7670.
pub const OV7670_ADDR: u8 = 0x21;
/// Highest OV2640 register address a register table may touch.
///
/// The bank select register (`0xFF`) sits above it and stays writable.
pub const REG_LAST: u8 = 0xF9;
/// Highest OV7670 register address.
pub const OV7670_REG_LAST: u8 = 0xC9;
/// Bus clock used by `begin()`.
///
/// The OV2640 datasheet rates SCCB at 400 kHz but modules are unreliable
/// above 100 kHz.
pub const BUS_CLOCK_HZ: u32 = 100_000;

/// Microcontroller pin identifier. Negative values mean "not connected".
pub type Pin = i8;

/// Marker for a signal that is not wired to the MCU (tied to a rail instead).
pub const NOT_CONNECTED: Pin = -1;

/// Physical connection between the MCU and the camera module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pins {
    /// Also called PWDN, or set to -1 and tie to GND.
    pub enable: Pin,
    /// Camera reset, or set to -1 and tie to 3.3V.
    pub reset: Pin,
    /// MCU clock out / camera clock in.
    pub xclk: Pin,
    /// Camera clock out / MCU clock in.
    pub pclk: Pin,
    /// Also called DEN1.
    pub vsync: Pin,
    /// Also called DEN2.
    pub hsync: Pin,
    /// Camera parallel data out, D0 first.
    pub data: [Pin; 8],
    /// I2C data.
    pub sda: Pin,
    /// I2C clock.
    pub scl: Pin,
}

impl Pins {
    /// Wiring with every signal marked [`NOT_CONNECTED`].
    pub const fn unconnected() -> Self {
        Self {
            enable: NOT_CONNECTED,
            reset: NOT_CONNECTED,
            xclk: NOT_CONNECTED,
            pclk: NOT_CONNECTED,
            vsync: NOT_CONNECTED,
            hsync: NOT_CONNECTED,
            data: [NOT_CONNECTED; 8],
            sda: NOT_CONNECTED,
            scl: NOT_CONNECTED,
        }
    }

    pub const fn is_connected(pin: Pin) -> bool {
        pin >= 0
    }
}

/// Supported sensor families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorVariant {
    Ov2640,
    #[default]
    Ov7670,
}

impl SensorVariant {
    /// I2C address the sensor answers on out of reset.
    pub const fn default_address(self) -> u8 {
        match self {
            SensorVariant::Ov2640 => OV2640_ADDR,
            SensorVariant::Ov7670 => OV7670_ADDR,
        }
    }

    /// Expected contents of the product ID register (`PID`, 0x0A).
    pub const fn product_id(self) -> u8 {
        match self {
            SensorVariant::Ov2640 => 0x26,
            SensorVariant::Ov7670 => 0x76,
        }
    }

    /// Highest regular register address of this sensor.
    pub const fn last_register(self) -> u8 {
        match self {
            SensorVariant::Ov2640 => REG_LAST,
            SensorVariant::Ov7670 => OV7670_REG_LAST,
        }
    }

    /// Whether `reg` exists on this sensor and may be written.
    pub const fn is_writable(
        self,
        reg: u8,
    ) -> bool {
        match self {
            SensorVariant::Ov2640 => reg <= REG_LAST || reg == REG_BANK_SEL,
            SensorVariant::Ov7670 => reg <= OV7670_REG_LAST,
        }
    }
}

/// A register/value pair, the unit of a sensor register table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub reg: u8,
    pub value: u8,
}

/// Result of the architecture initialization entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// A buffer allocation failed.
    ErrMalloc,
    /// Peripheral (timer, sensor, ...) not found.
    ErrPeripheral,
}

impl Status {
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Map onto the driver's error type, so `begin()` can use `?`.
    pub fn into_result<E>(self) -> Result<(), DriverError<E>> {
        match self {
            Status::Ok => Ok(()),
            Status::ErrMalloc => Err(DriverError::Allocation),
            Status::ErrPeripheral => Err(DriverError::PeripheralNotFound),
        }
    }
}

/// What the architecture layer gets to work with: the wiring and a typed
/// handle back into the driver for register access.
pub struct Host<'h, R> {
    pub pins: &'h Pins,
    pub platform: &'h mut R,
}

/// Per-MCU-family initialization, run by `Ov2640::begin` after the bus is
/// open and clocked.
pub trait Architecture {
    fn begin<R: RegisterAccess>(
        &mut self,
        host: Host<'_, R>,
    ) -> Status;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pins_are_zeroed() {
        let pins = Pins::default();
        assert_eq!(pins.enable, 0);
        assert_eq!(pins.data, [0; 8]);
        assert_eq!(pins.scl, 0);
    }

    #[test]
    fn unconnected_pins_report_not_connected() {
        let pins = Pins::unconnected();
        assert!(!Pins::is_connected(pins.reset));
        assert!(pins.data.iter().all(|&p| !Pins::is_connected(p)));
        assert!(Pins::is_connected(0));
    }

    #[test]
    fn variant_addresses_fit_seven_bits() {
        assert_eq!(SensorVariant::default().default_address(), OV7670_ADDR);
        assert_eq!(SensorVariant::Ov2640.default_address() & 0x80, 0);
        assert_eq!(SensorVariant::Ov7670.default_address() & 0x80, 0);
    }

    #[test]
    fn bank_select_is_writable_only_on_ov2640() {
        assert!(SensorVariant::Ov2640.is_writable(REG_BANK_SEL));
        assert!(SensorVariant::Ov2640.is_writable(REG_LAST));
        assert!(!SensorVariant::Ov2640.is_writable(0xFA));
        assert!(SensorVariant::Ov7670.is_writable(OV7670_REG_LAST));
        assert!(!SensorVariant::Ov7670.is_writable(0xCA));
        assert!(!SensorVariant::Ov7670.is_writable(REG_BANK_SEL));
    }

    #[test]
    fn status_maps_to_driver_error() {
        assert!(Status::Ok.into_result::<()>().is_ok());
        assert!(matches!(
            Status::ErrMalloc.into_result::<()>(),
            Err(DriverError::Allocation)
        ));
        assert!(matches!(
            Status::ErrPeripheral.into_result::<()>(),
            Err(DriverError::PeripheralNotFound)
        ));
    }
}
