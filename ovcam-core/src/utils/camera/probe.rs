//! Portable architecture layer that only checks the sensor is there.
//!
//! Reads the product/version registers and compares the product ID against
//! the configured [`SensorVariant`]. Clock generation and capture set-up
//! belong to MCU-specific layers and are not done here.

use super::{Architecture, Host, SensorVariant, Status};
use crate::utils::controllers::sccb::RegisterAccess;

/// OV2640 register bank select.
pub const REG_BANK_SEL: u8 = 0xFF;
/// Bank value selecting the sensor (as opposed to DSP) registers.
pub const BANK_SENSOR: u8 = 0x01;
/// Product ID, high byte.
pub const REG_PID: u8 = 0x0A;
/// Product version / ID low byte.
pub const REG_VER: u8 = 0x0B;

/// Product and version bytes read back from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorId {
    pub pid: u8,
    pub ver: u8,
}

pub struct SensorProbe {
    variant: SensorVariant,
    id: Option<SensorId>,
}

impl SensorProbe {
    pub fn new(variant: SensorVariant) -> Self {
        Self { variant, id: None }
    }

    pub fn variant(&self) -> SensorVariant {
        self.variant
    }

    /// ID from the last successful probe.
    pub fn id(&self) -> Option<SensorId> {
        self.id
    }

    fn read_id<R: RegisterAccess>(
        &self,
        platform: &mut R,
    ) -> Option<SensorId> {
        if self.variant == SensorVariant::Ov2640 {
            if let Err(e) = platform.write_register(REG_BANK_SEL, BANK_SENSOR) {
                tracing::warn!("bank select failed: {:?}", e);
                return None;
            }
        }
        let pid = platform.read_register_raw(REG_PID);
        let ver = platform.read_register_raw(REG_VER);
        if pid < 0 || ver < 0 {
            tracing::warn!("sensor did not answer ID read");
            return None;
        }
        Some(SensorId {
            pid: pid as u8,
            ver: ver as u8,
        })
    }
}

impl Architecture for SensorProbe {
    fn begin<R: RegisterAccess>(
        &mut self,
        host: Host<'_, R>,
    ) -> Status {
        let Host { pins, platform } = host;
        tracing::debug!(variant = ?self.variant, ?pins, "probing sensor");

        self.id = None;
        let Some(id) = self.read_id(platform) else {
            return Status::ErrPeripheral;
        };
        if id.pid != self.variant.product_id() {
            tracing::error!(
                "unexpected product id 0x{:02X} (want 0x{:02X})",
                id.pid,
                self.variant.product_id()
            );
            return Status::ErrPeripheral;
        }

        tracing::info!("found {:?} pid=0x{:02X} ver=0x{:02X}", self.variant, id.pid, id.ver);
        self.id = Some(id);
        Status::Ok
    }
}
