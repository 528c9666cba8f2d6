//! SCCB register access for OmniVision sensors.
//!
//! SCCB is the I2C subset OmniVision parts speak. It has no repeated start,
//! so a register read is two stop-terminated transactions: write the
//! register address, then read one byte.

use core::cell::RefCell;
use core::fmt;

use embedded_hal::i2c::{Error as I2cError, ErrorType, I2c, Operation};

use crate::utils::camera::{Architecture, Command, Host, Pins, BUS_CLOCK_HZ};

/// Host bus controls that `embedded-hal` leaves to the HAL.
///
/// Implemented by the platform's I2C peripheral wrapper. `begin()` is called
/// once before `set_clock`, and both run before any data transfer.
pub trait Transport: I2c {
    /// Bring up the peripheral (pins, power, pullups).
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Set the SCL frequency in Hz.
    fn set_clock(
        &mut self,
        hz: u32,
    ) -> Result<(), Self::Error>;
}

/// Errors that can occur when talking to the camera module.
#[derive(Debug)]
pub enum DriverError<E> {
    /// The underlying bus reported an error (NACK, arbitration loss, no data).
    Bus(E),
    /// The architecture layer could not allocate its buffers.
    Allocation,
    /// The architecture layer could not find a required peripheral.
    PeripheralNotFound,
}

impl<E: fmt::Debug> fmt::Display for DriverError<E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            DriverError::Bus(e) => write!(f, "bus error: {:?}", e),
            DriverError::Allocation => f.write_str("allocation failed"),
            DriverError::PeripheralNotFound => f.write_str("peripheral not found"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DriverError<E> {}

/// Register-level access handed to the architecture layer.
pub trait RegisterAccess {
    type Error: fmt::Debug;

    fn read_register(
        &mut self,
        reg: u8,
    ) -> Result<u8, Self::Error>;

    fn write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), Self::Error>;

    /// Integer form of [`read_register`](Self::read_register): 0-255 on
    /// success, -1 on any failure.
    fn read_register_raw(
        &mut self,
        reg: u8,
    ) -> i16 {
        match self.read_register(reg) {
            Ok(value) => i16::from(value),
            Err(_) => -1,
        }
    }
}

/// Camera driver borrowing a shared I2C bus.
///
/// The bus is only borrowed for the duration of each transaction, so other
/// devices on the same `RefCell` stay usable between calls.
pub struct Ov2640<'a, T> {
    bus: &'a RefCell<T>,
    pins: Pins,
    address: u8,
    open: bool,
}

impl<'a, T, E> Ov2640<'a, T>
where
    T: Transport<Error = E>,
    E: I2cError,
{
    /// Create a driver for the sensor at `address` (masked to 7 bits).
    ///
    /// `pins` is copied; `None` leaves every pin at zero.
    pub fn new(
        address: u8,
        pins: Option<&Pins>,
        bus: &'a RefCell<T>,
    ) -> Self {
        Ov2640 {
            bus,
            pins: pins.copied().unwrap_or_default(),
            address: address & 0x7F,
            open: false,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn pins(&self) -> &Pins {
        &self.pins
    }

    /// Whether `begin()` has opened and clocked the bus.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the bus at 100 kHz and run the architecture initialization.
    ///
    /// The bus counts as open once it is clocked, even if the architecture
    /// layer then reports a failure.
    pub fn begin<A: Architecture>(
        &mut self,
        arch: &mut A,
    ) -> Result<(), DriverError<E>> {
        {
            let mut bus = self.bus.borrow_mut();
            bus.begin().map_err(DriverError::Bus)?;
            bus.set_clock(BUS_CLOCK_HZ).map_err(DriverError::Bus)?;
        }
        self.open = true;
        tracing::info!(
            address = self.address,
            hz = BUS_CLOCK_HZ,
            "camera bus open"
        );

        self.run_architecture(arch)
    }

    /// Run an architecture layer on the already-open bus.
    ///
    /// Issues no transport `begin`/`set_clock`; use this to re-probe or
    /// re-initialize the sensor after `begin()`.
    pub fn run_architecture<A: Architecture>(
        &mut self,
        arch: &mut A,
    ) -> Result<(), DriverError<E>> {
        let pins = self.pins;
        let status = arch.begin(Host {
            pins: &pins,
            platform: self,
        });
        if !status.is_ok() {
            tracing::warn!(?status, "camera architecture init failed");
        }
        status.into_result()
    }

    /// Read one register. Returns the byte on success.
    pub fn read_register(
        &self,
        reg: u8,
    ) -> Result<u8, DriverError<E>> {
        let mut bus = self.bus.borrow_mut();
        let mut value = 0;
        bus.write(self.address, &[reg])
            .and_then(|()| bus.read(self.address, core::slice::from_mut(&mut value)))
            .map_err(|e| {
                tracing::warn!("read of reg 0x{:02X} failed: {:?}", reg, e.kind());
                DriverError::Bus(e)
            })?;
        tracing::debug!("reg 0x{:02X} -> 0x{:02X}", reg, value);
        Ok(value)
    }

    /// Write one register.
    pub fn write_register(
        &self,
        reg: u8,
        value: u8,
    ) -> Result<(), DriverError<E>> {
        tracing::debug!("reg 0x{:02X} <- 0x{:02X}", reg, value);
        self.bus
            .borrow_mut()
            .write(self.address, &[reg, value])
            .map_err(|e| {
                tracing::warn!("write of reg 0x{:02X} failed: {:?}", reg, e.kind());
                DriverError::Bus(e)
            })
    }

    /// Apply a register table in order, stopping at the first failure.
    pub fn write_commands(
        &self,
        commands: &[Command],
    ) -> Result<(), DriverError<E>> {
        commands
            .iter()
            .try_for_each(|c| self.write_register(c.reg, c.value))
    }

    /// Give back the bus reference.
    pub fn release(self) -> &'a RefCell<T> {
        self.bus
    }
}

impl<T, E> RegisterAccess for Ov2640<'_, T>
where
    T: Transport<Error = E>,
    E: I2cError,
{
    type Error = DriverError<E>;

    fn read_register(
        &mut self,
        reg: u8,
    ) -> Result<u8, Self::Error> {
        Ov2640::read_register(self, reg)
    }

    fn write_register(
        &mut self,
        reg: u8,
        value: u8,
    ) -> Result<(), Self::Error> {
        Ov2640::write_register(self, reg, value)
    }
}

/// Adapter for HAL I2C drivers whose clock is fixed when the peripheral is
/// constructed.
///
/// `begin` and `set_clock` do not touch the hardware; the requested
/// frequency is recorded so callers can check it against the HAL config.
pub struct FixedClockBus<I2C> {
    inner: I2C,
    requested_hz: Option<u32>,
}

impl<I2C: I2c> FixedClockBus<I2C> {
    pub fn new(inner: I2C) -> Self {
        Self {
            inner,
            requested_hz: None,
        }
    }

    /// Frequency last passed to `set_clock`, if any.
    pub fn requested_hz(&self) -> Option<u32> {
        self.requested_hz
    }

    pub fn inner_mut(&mut self) -> &mut I2C {
        &mut self.inner
    }

    pub fn into_inner(self) -> I2C {
        self.inner
    }
}

impl<I2C: I2c> ErrorType for FixedClockBus<I2C> {
    type Error = I2C::Error;
}

impl<I2C: I2c> I2c for FixedClockBus<I2C> {
    fn read(
        &mut self,
        address: u8,
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.inner.read(address, read)
    }

    fn write(
        &mut self,
        address: u8,
        write: &[u8],
    ) -> Result<(), Self::Error> {
        self.inner.write(address, write)
    }

    fn write_read(
        &mut self,
        address: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.inner.write_read(address, write, read)
    }

    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.inner.transaction(address, operations)
    }
}

impl<I2C: I2c> Transport for FixedClockBus<I2C> {
    fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_clock(
        &mut self,
        hz: u32,
    ) -> Result<(), Self::Error> {
        self.requested_hz = Some(hz);
        Ok(())
    }
}
