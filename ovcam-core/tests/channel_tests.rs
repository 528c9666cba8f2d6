use core::cell::RefCell;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use ovcam_core::utils::controllers::{
    RegisterCommand, RegisterResponse, REGISTER_CHANNEL, RESPONSE_CHANNEL,
};
use ovcam_core::utils::{CameraController, SensorVariant, Transport};

/// Bus with nothing attached: every address NACKs.
struct EmptyBus;

impl ErrorType for EmptyBus {
    type Error = ErrorKind;
}

impl I2c for EmptyBus {
    fn transaction(
        &mut self,
        _address: u8,
        _operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
    }
}

impl Transport for EmptyBus {
    fn begin(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_clock(
        &mut self,
        _hz: u32,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
}

// Single test: the channels are process-wide statics.
#[test]
fn serve_next_posts_failed_response() {
    let i2c_bus = RefCell::new(EmptyBus);
    let mut ctrl = CameraController::new(&i2c_bus, SensorVariant::Ov7670, None, None);

    REGISTER_CHANNEL
        .try_send(RegisterCommand::Read { reg: 0x0A })
        .unwrap();
    REGISTER_CHANNEL
        .try_send(RegisterCommand::Write { reg: 0xCA, value: 0x00 })
        .unwrap();

    let first = futures::executor::block_on(ctrl.serve_next());
    assert_eq!(first, RegisterResponse::Failed);
    let second = futures::executor::block_on(ctrl.serve_next());
    assert_eq!(second, RegisterResponse::OutOfRange { reg: 0xCA });

    assert_eq!(RESPONSE_CHANNEL.try_receive().ok(), Some(RegisterResponse::Failed));
    assert_eq!(
        RESPONSE_CHANNEL.try_receive().ok(),
        Some(RegisterResponse::OutOfRange { reg: 0xCA })
    );
    assert!(RESPONSE_CHANNEL.try_receive().is_err());
}
