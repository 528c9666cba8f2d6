//! Module Exports
//!
//! - `sccb`: register-level driver for the camera's SCCB (I2C) port.
//!
//! `CameraController` wraps the driver and serves register commands received
//! over `REGISTER_CHANNEL`, posting results on `RESPONSE_CHANNEL`.

/// Module for register access over the camera's I2C bus.
pub mod sccb;

use core::cell::RefCell;

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embedded_hal::i2c::Error as I2cError;
use serde::{Deserialize, Serialize};

use crate::utils::camera::{Pins, SensorId, SensorProbe, SensorVariant};
use sccb::{DriverError, Ov2640, Transport};

/// Channel used to receive register commands (`RegisterCommand` messages).
pub static REGISTER_CHANNEL: Channel<CriticalSectionRawMutex, RegisterCommand, 16> =
    Channel::new();

/// Channel carrying one `RegisterResponse` per executed command.
pub static RESPONSE_CHANNEL: Channel<CriticalSectionRawMutex, RegisterResponse, 16> =
    Channel::new();

/// Register command variants.
///
/// Serialized as JSON with tag `"rc"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "rc", rename_all = "snake_case")]
pub enum RegisterCommand {
    /// Read one register.
    Read { reg: u8 },
    /// Write one register.
    Write { reg: u8, value: u8 },
    /// Re-run the sensor ID probe.
    Probe,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "rr", rename_all = "snake_case")]
pub enum RegisterResponse {
    Value { reg: u8, value: u8 },
    Written { reg: u8, value: u8 },
    Probed { pid: u8, ver: u8 },
    /// Register that does not exist on the configured sensor.
    OutOfRange { reg: u8 },
    Failed,
}

pub struct CameraController<'a, T> {
    pub camera: Ov2640<'a, T>,
    probe: SensorProbe,
}

impl<'a, T, E> CameraController<'a, T>
where
    T: Transport<Error = E>,
    E: I2cError,
{
    /// Open the bus and probe the sensor.
    ///
    /// `address` defaults to the variant's address. A failed probe is logged
    /// and the bus is scanned so a mis-strapped address shows up in the log;
    /// the controller is still returned so commands can be retried.
    pub fn new(
        i2c_bus: &'a RefCell<T>,
        variant: SensorVariant,
        address: Option<u8>,
        pins: Option<&Pins>,
    ) -> Self {
        let addr = address.unwrap_or(variant.default_address());
        let mut camera = Ov2640::new(addr, pins, i2c_bus);
        let mut probe = SensorProbe::new(variant);

        match camera.begin(&mut probe) {
            Ok(()) => tracing::info!("camera ready at 0x{:02X}", camera.address()),
            Err(e) => {
                tracing::warn!("camera init failed, scanning instead: {}", e);
                scan_bus(i2c_bus);
            }
        }

        CameraController { camera, probe }
    }

    /// ID from the most recent successful probe.
    pub fn sensor_id(&self) -> Option<SensorId> {
        self.probe.id()
    }

    /// Execute one `RegisterCommand` against the camera.
    pub fn execute_command(
        &mut self,
        command: RegisterCommand,
    ) -> Result<RegisterResponse, DriverError<E>> {
        match command {
            RegisterCommand::Read { reg } => {
                let value = self.camera.read_register(reg)?;
                Ok(RegisterResponse::Value { reg, value })
            }
            RegisterCommand::Write { reg, value } if !self.probe.variant().is_writable(reg) => {
                tracing::warn!(
                    "refusing write past 0x{:02X}: 0x{:02X}={:02X}",
                    self.probe.variant().last_register(),
                    reg,
                    value
                );
                Ok(RegisterResponse::OutOfRange { reg })
            }
            RegisterCommand::Write { reg, value } => {
                self.camera.write_register(reg, value)?;
                Ok(RegisterResponse::Written { reg, value })
            }
            RegisterCommand::Probe => {
                self.camera.run_architecture(&mut self.probe)?;
                let id = self.probe.id().ok_or(DriverError::PeripheralNotFound)?;
                Ok(RegisterResponse::Probed {
                    pid: id.pid,
                    ver: id.ver,
                })
            }
        }
    }

    /// Execute a command, folding failures into `RegisterResponse::Failed`.
    pub fn handle_command(
        &mut self,
        command: RegisterCommand,
    ) -> RegisterResponse {
        match self.execute_command(command) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("register command failed: {}", e);
                RegisterResponse::Failed
            }
        }
    }

    /// Serve one command from `REGISTER_CHANNEL` and post its response.
    pub async fn serve_next(&mut self) -> RegisterResponse {
        let command = REGISTER_CHANNEL.receiver().receive().await;
        tracing::info!("Received register command: {:?}", command);
        let response = self.handle_command(command);
        RESPONSE_CHANNEL.sender().send(response).await;
        response
    }

    pub async fn register_ch(&mut self) -> ! {
        loop {
            self.serve_next().await;
        }
    }
}

/// Scan the I2C bus for devices and log any found addresses.
pub fn scan_bus<T: Transport>(i2c_bus: &RefCell<T>) {
    let mut bus = i2c_bus.borrow_mut();
    for addr in 0x03..0x78 {
        if bus.write(addr, &[]).is_ok() {
            tracing::warn!("I2C device found at 0x{:02X}", addr);
        }
    }
}
