//! Utility re-exports and helper macros for the camera driver.
//!
//! - `camera`: pin wiring, sensor variants, status codes and the
//!   architecture seam invoked by `begin()`
//! - `controllers`: the SCCB register driver and the command-channel
//!   controller built on top of it
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod camera;
pub mod controllers;

pub use camera::{Architecture, Host, Pins, SensorProbe, SensorVariant, Status};
pub use controllers::sccb::{DriverError, FixedClockBus, Ov2640, RegisterAccess, Transport};
pub use controllers::CameraController;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::__private::StaticCell<$t> =
            $crate::utils::__private::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}

#[doc(hidden)]
pub mod __private {
    pub use static_cell::StaticCell;
}
