// Licensed under the Apache-2.0 license

//! Renesas R-Car Gen3 I2C master driver.
//!
//! The driver owns the host's [`HardwareInterface`] and a logger, keeps the
//! clock divider chosen by `setup_speed`, and parks the context of an
//! interrupt or DMA driven message until the host takes the buffer back.
//!
//! Each transfer strategy lives in its own module and is compiled in by the
//! cargo feature of the same name (`atomic`, `pio`, `dma`, `recovery`). The
//! `as_*` accessors of [`I2cHardwareCore`] report exactly the strategies
//! that were built.
//!
//! # Examples
//!
//! ```rust,ignore
//! let mut i2c = RcarGen3I2c::new(host, NoOpLogger);
//! i2c.setup_speed(100_000)?;
//!
//! // <power on>
//! let mut data = [0u8; 4];
//! i2c.xfer_atomic(0, 1, 0x50 << 1 | 1, XferBuf::Rx(&mut data))?;
//! ```

use crate::common::{format_line, Logger, NoOpLogger};
use crate::i2c::common::{Error, I2cSpeed, Version, XferBuf};
use crate::i2c::traits::{HardwareInterface, I2cHardwareCore};

#[cfg(feature = "recovery")]
use crate::i2c::traits::BusRecovery;
#[cfg(feature = "atomic")]
use crate::i2c::traits::AtomicTransfer;
#[cfg(feature = "dma")]
use crate::i2c::traits::DmaTransfer;
#[cfg(feature = "pio")]
use crate::i2c::traits::PioTransfer;

mod xfer;

#[cfg(feature = "atomic")]
mod atomic;
#[cfg(feature = "dma")]
mod dma;
#[cfg(feature = "pio")]
mod pio;
#[cfg(feature = "recovery")]
mod recovery;

use xfer::XferContext;

pub const VERSION: Version = Version::new(1, 0, 0, 1);

/// Packed ICCCR value for `speed` with a 133.33 MHz module clock.
///
/// Recommended CDF/SCGD settings for open drain and LVTTL (low drive)
/// buffers: 100 kHz uses CDF = 6, SCGD = 21; 400 kHz uses CDF = 6, SCGD = 3.
#[must_use]
pub const fn clock_divider(speed: I2cSpeed) -> u32 {
    let (cdf, scgd) = match speed {
        I2cSpeed::Standard => (6, 21),
        I2cSpeed::Fast => (6, 3),
    };
    (scgd << 3) | cdf
}

pub struct RcarGen3I2c<'buf, H: HardwareInterface, L: Logger = NoOpLogger> {
    hw: H,
    logger: L,
    icccr: u32,
    xfer: Option<XferContext<'buf>>,
}

impl<'buf, H: HardwareInterface, L: Logger> RcarGen3I2c<'buf, H, L> {
    /// Wraps the host interface. No register is touched until the first
    /// transfer, so this is safe to call before the controller is powered.
    pub fn new(hw: H, logger: L) -> Self {
        Self {
            hw,
            logger,
            icccr: 0,
            xfer: None,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn logger(&self) -> &L {
        &self.logger
    }

    pub fn into_parts(self) -> (H, L) {
        (self.hw, self.logger)
    }

    /// ICCCR value programmed by the next transaction.
    pub fn clock_divider(&self) -> u32 {
        self.icccr
    }

    /// Cursor of the parked PIO/DMA message.
    pub fn position(&self) -> Option<usize> {
        self.xfer.as_ref().map(XferContext::position)
    }

    fn log_failure(&mut self, what: &str, err: Error) {
        self.logger
            .error(&format_line(format_args!("rcar-i2c: {what}: {err}")));
    }
}

impl<'buf, H: HardwareInterface, L: Logger> I2cHardwareCore<'buf> for RcarGen3I2c<'buf, H, L> {
    fn version(&self) -> Version {
        VERSION
    }

    fn setup_speed(&mut self, bus_speed: u32) -> Result<(), Error> {
        let speed = I2cSpeed::try_from(bus_speed).inspect_err(|e| {
            self.log_failure("setup_speed", *e);
        })?;
        self.icccr = clock_divider(speed);
        Ok(())
    }

    fn release_buffer(&mut self) -> Option<XferBuf<'buf>> {
        self.xfer.take().map(XferContext::into_buffer)
    }

    #[cfg(feature = "recovery")]
    fn as_recovery(&mut self) -> Option<&mut dyn BusRecovery> {
        Some(self)
    }

    #[cfg(feature = "atomic")]
    fn as_atomic(&mut self) -> Option<&mut dyn AtomicTransfer> {
        Some(self)
    }

    #[cfg(feature = "pio")]
    fn as_pio(&mut self) -> Option<&mut dyn PioTransfer<'buf>> {
        Some(self)
    }

    #[cfg(feature = "dma")]
    fn as_dma(&mut self) -> Option<&mut dyn DmaTransfer<'buf>> {
        Some(self)
    }
}
