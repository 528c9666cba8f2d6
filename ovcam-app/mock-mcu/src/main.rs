use clap::{Parser, ValueEnum};
use core::cell::RefCell;
use embassy_executor::{Executor, Spawner};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use ovcam_core::mk_static;
use ovcam_core::utils::camera::Pins;
use ovcam_core::utils::controllers::{RegisterCommand, REGISTER_CHANNEL, RESPONSE_CHANNEL};
use ovcam_core::utils::{CameraController, SensorVariant, Transport};
use static_cell::StaticCell;
use tracing::{error, info};

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Ov2640,
    Ov7670,
}

impl From<Variant> for SensorVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Ov2640 => SensorVariant::Ov2640,
            Variant::Ov7670 => SensorVariant::Ov7670,
        }
    }
}

#[derive(Parser)]
#[command(version = "1.0")]
struct Opts {
    /// sensor family to simulate and probe for
    #[arg(long, value_enum, default_value = "ov7670")]
    variant: Variant,
    /// driver I2C address (decimal or 0x-prefixed hex); defaults to the variant's
    #[arg(long, value_parser = parse_address)]
    address: Option<u8>,
    /// pin wiring as JSON, e.g. '{"enable":-1,"reset":-1,...}'
    #[arg(long)]
    pins: Option<String>,
    /// register command as JSON, e.g. '{"rc":"read","reg":10}'; repeatable
    #[arg(long = "cmd")]
    commands: Vec<String>,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

/// Simulated sensor: a flat register file behind an I2C address.
struct SimSensor {
    variant: SensorVariant,
    address: u8,
    regs: [u8; 256],
    pointer: u8,
}

impl SimSensor {
    fn new(variant: SensorVariant) -> Self {
        let mut regs = [0; 256];
        let ver = match variant {
            SensorVariant::Ov2640 => 0x42,
            SensorVariant::Ov7670 => 0x73,
        };
        regs[0x0A] = variant.product_id();
        regs[0x0B] = ver;
        Self {
            variant,
            address: variant.default_address(),
            regs,
            pointer: 0,
        }
    }
}

impl ErrorType for SimSensor {
    type Error = ErrorKind;
}

impl I2c for SimSensor {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, values)) = bytes.split_first() {
                        self.pointer = reg;
                        for &v in values {
                            if !self.variant.is_writable(self.pointer) {
                                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
                            }
                            self.regs[self.pointer as usize] = v;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.regs[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Transport for SimSensor {
    fn begin(&mut self) -> Result<(), Self::Error> {
        info!("sim bus up");
        Ok(())
    }

    fn set_clock(
        &mut self,
        hz: u32,
    ) -> Result<(), Self::Error> {
        info!("sim bus clock {} Hz", hz);
        Ok(())
    }
}

#[embassy_executor::task]
async fn camera_task(mut ctrl: CameraController<'static, SimSensor>) -> ! {
    ctrl.register_ch().await
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    variant: SensorVariant,
    address: Option<u8>,
    pins: Option<Pins>,
    commands: Vec<RegisterCommand>,
) {
    let i2c_bus = mk_static!(RefCell<SimSensor>, RefCell::new(SimSensor::new(variant)));

    let ctrl = CameraController::new(i2c_bus, variant, address, pins.as_ref());
    spawner.spawn(camera_task(ctrl)).unwrap();

    for command in commands {
        REGISTER_CHANNEL.sender().send(command).await;
        let response = RESPONSE_CHANNEL.receiver().receive().await;
        match serde_json::to_string(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("could not encode response: {}", e),
        }
    }

    std::process::exit(0);
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts: Opts = Opts::parse();

    let pins = match opts.pins.as_deref().map(serde_json::from_str::<Pins>) {
        Some(Ok(pins)) => Some(pins),
        Some(Err(e)) => {
            error!("invalid --pins: {}", e);
            std::process::exit(2);
        }
        None => None,
    };

    let mut commands = Vec::with_capacity(opts.commands.len());
    for raw in &opts.commands {
        match serde_json::from_str::<RegisterCommand>(raw) {
            Ok(cmd) => commands.push(cmd),
            Err(e) => {
                error!("invalid --cmd {:?}: {}", raw, e);
                std::process::exit(2);
            }
        }
    }

    let variant = SensorVariant::from(opts.variant);
    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| {
        spawner
            .spawn(main_task(spawner, variant, opts.address, pins, commands))
            .unwrap();
    });
}
