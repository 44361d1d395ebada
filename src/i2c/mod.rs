// Licensed under the Apache-2.0 license

//! R-Car I2C master driver module.
//!
//! The driver core is OS independent: the host hands it register access and
//! a delay through [`traits::HardwareInterface`] and drives transfers either
//! directly through the strategy traits or through the `embedded-hal`
//! implementation of [`i2c_controller::I2cController`].

pub mod common;
pub mod i2c_controller;
pub mod rcar_gen3;
pub mod registers;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use common::{Capabilities, Error, I2cConfig, I2cConfigBuilder, I2cSpeed, Version, XferBuf};
pub use i2c_controller::I2cController;
pub use rcar_gen3::RcarGen3I2c;
