//! Register access driver for OV2640/OV7670 camera modules on no-std embedded platforms.
//!
//! For a host-side walkthrough, see the `mock-mcu` application in `ovcam-app/`.
#![no_std]

pub mod utils;
