// Licensed under the Apache-2.0 license

//! High-level I2C controller.
//!
//! Wraps any [`I2cHardwareCore`] driver, detects which transfer strategies
//! it has wired, and dispatches to them. Strategies the driver lacks report
//! `Error::NotSupported`. The controller also implements the
//! `embedded-hal` [`I2c`](embedded_hal::i2c::I2c) trait on top of the atomic
//! strategy, one message per operation.

use core::marker::PhantomData;

use crate::common::{format_line, Logger, NoOpLogger};
use crate::i2c::common::{
    Capabilities, DmaInfo, DmaRegion, Error, I2cConfig, I2cSpeed, Version, XferBuf,
};
use crate::i2c::traits::I2cHardwareCore;
use embedded_hal::i2c::{Operation, SevenBitAddress};
use fugit::HertzU32;

/// Highest 7-bit target address.
const MAX_ADDRESS: SevenBitAddress = 0x7F;

pub struct I2cController<'buf, H: I2cHardwareCore<'buf>, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub config: I2cConfig,
    pub logger: L,
    capabilities: Capabilities,
    _buf: PhantomData<&'buf mut [u8]>,
}

fn detect_capabilities<'buf, H: I2cHardwareCore<'buf>>(hardware: &mut H) -> Capabilities {
    let mut caps = hardware.extra_support();
    if hardware.as_recovery().is_some() {
        caps |= Capabilities::RECOVERY;
    }
    if hardware.as_atomic().is_some() {
        caps |= Capabilities::ATOMIC;
    }
    if hardware.as_pio().is_some() {
        caps |= Capabilities::PIO;
    }
    if hardware.as_dma().is_some() {
        caps |= Capabilities::DMA;
    }
    caps
}

impl<'buf, H: I2cHardwareCore<'buf>, L: Logger> I2cController<'buf, H, L> {
    /// Probes the driver and selects the configured bus speed.
    ///
    /// # Errors
    ///
    /// Whatever `probe` or `setup_speed` of the driver report.
    pub fn new(mut hardware: H, config: I2cConfig, mut logger: L) -> Result<Self, Error> {
        let capabilities = detect_capabilities(&mut hardware);

        if let Err(e) = hardware.probe() {
            logger.error(&format_line(format_args!("i2c: probe failed: {e}")));
            return Err(e);
        }
        let hz = config.speed.frequency().raw();
        if let Err(e) = hardware.setup_speed(hz) {
            logger.error(&format_line(format_args!("i2c: speed {hz} Hz rejected: {e}")));
            return Err(e);
        }

        logger.debug(&format_line(format_args!(
            "i2c: driver {} at {hz} Hz, capabilities {:#x}",
            hardware.version(),
            capabilities.bits()
        )));

        Ok(Self {
            hardware,
            config,
            logger,
            capabilities,
            _buf: PhantomData,
        })
    }

    /// Runs the driver's `remove` and hands the driver back.
    ///
    /// # Errors
    ///
    /// Whatever `remove` of the driver reports.
    pub fn remove(mut self) -> Result<H, Error> {
        self.hardware.remove()?;
        Ok(self.hardware)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn version(&self) -> Version {
        self.hardware.version()
    }

    /// # Errors
    ///
    /// `InvalidArgument` when the driver has no divider for `bus_speed`.
    pub fn setup_speed(&mut self, bus_speed: HertzU32) -> Result<(), Error> {
        self.hardware.setup_speed(bus_speed.raw())?;
        if let Ok(speed) = I2cSpeed::try_from(bus_speed) {
            self.config.speed = speed;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// `NotSupported` without a recovery strategy.
    pub fn recovery(&mut self) -> Result<(), Error> {
        self.hardware
            .as_recovery()
            .ok_or(Error::NotSupported)?
            .recovery()
    }

    /// # Errors
    ///
    /// `NotSupported` without an atomic strategy, otherwise see
    /// [`AtomicTransfer::xfer_atomic`](crate::i2c::traits::AtomicTransfer::xfer_atomic).
    pub fn xfer_atomic(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'_>,
    ) -> Result<(), Error> {
        self.hardware
            .as_atomic()
            .ok_or(Error::NotSupported)?
            .xfer_atomic(step, step_max, address, buf)
    }

    /// # Errors
    ///
    /// `NotSupported` without a PIO strategy.
    pub fn xfer_pio(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<(), Error> {
        self.hardware
            .as_pio()
            .ok_or(Error::NotSupported)?
            .xfer_pio(step, step_max, address, buf)
    }

    /// # Errors
    ///
    /// `NotSupported` without a PIO strategy.
    pub fn xfer_pio_irq(&mut self) -> nb::Result<(), Error> {
        self.hardware
            .as_pio()
            .ok_or(nb::Error::Other(Error::NotSupported))?
            .xfer_pio_irq()
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_setup(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<DmaRegion, Error> {
        self.hardware
            .as_dma()
            .ok_or(Error::NotSupported)?
            .xfer_dma_setup(step, step_max, address, buf)
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_enable(&mut self, enable: bool) -> Result<(), Error> {
        self.hardware
            .as_dma()
            .ok_or(Error::NotSupported)?
            .xfer_dma_enable(enable)
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_start(&mut self) -> Result<(), Error> {
        self.hardware
            .as_dma()
            .ok_or(Error::NotSupported)?
            .xfer_dma_start()
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_stop(&mut self) -> Result<(), Error> {
        self.hardware
            .as_dma()
            .ok_or(Error::NotSupported)?
            .xfer_dma_stop()
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_irq(&mut self) -> nb::Result<(), Error> {
        self.hardware
            .as_dma()
            .ok_or(nb::Error::Other(Error::NotSupported))?
            .xfer_dma_irq()
    }

    /// # Errors
    ///
    /// `NotSupported` without a DMA strategy.
    pub fn xfer_dma_info(&mut self) -> Result<DmaInfo, Error> {
        Ok(self
            .hardware
            .as_dma()
            .ok_or(Error::NotSupported)?
            .xfer_dma_info())
    }

    pub fn release_buffer(&mut self) -> Option<XferBuf<'buf>> {
        self.hardware.release_buffer()
    }

    fn run_transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Error> {
        let atomic = self.hardware.as_atomic().ok_or(Error::NotSupported)?;
        let step_max = operations.len();
        for (step, op) in operations.iter_mut().enumerate() {
            match op {
                Operation::Read(buf) => {
                    atomic.xfer_atomic(step, step_max, (address << 1) | 1, XferBuf::Rx(buf))?;
                }
                Operation::Write(bytes) => {
                    atomic.xfer_atomic(step, step_max, address << 1, XferBuf::Tx(bytes))?;
                }
            }
        }
        Ok(())
    }
}

/// Rejects transactions the message-per-operation mapping cannot express.
///
/// Every operation becomes one message that ends with STOP, so two adjacent
/// operations in the same direction cannot be merged, and an empty read would
/// leave the bus without a stop condition.
fn check_operations(address: SevenBitAddress, operations: &[Operation<'_>]) -> Result<(), Error> {
    if address > MAX_ADDRESS {
        return Err(Error::InvalidArgument);
    }

    let empty_read = operations
        .iter()
        .any(|op| matches!(op, Operation::Read(buf) if buf.is_empty()));
    let same_direction = operations.windows(2).any(|pair| {
        matches!(
            pair,
            [Operation::Read(_), Operation::Read(_)] | [Operation::Write(_), Operation::Write(_)]
        )
    });
    if empty_read || same_direction {
        return Err(Error::InvalidArgument);
    }

    Ok(())
}

impl<'buf, H: I2cHardwareCore<'buf>, L: Logger> embedded_hal::i2c::ErrorType
    for I2cController<'buf, H, L>
{
    type Error = Error;
}

/// Blocking `embedded-hal` access over the atomic strategy.
///
/// The controller always closes a message with STOP, so this is a subset of
/// the `embedded-hal` transaction contract:
///
/// - each operation is its own message, `ST addr data SP`;
/// - a change of direction is STOP followed by a new START, not a repeated
///   start. `write_read` is therefore `ST W SP ST R SP`;
/// - adjacent operations in the same direction and zero-length reads fail
///   with `Error::InvalidArgument` before any register access.
impl<'buf, H: I2cHardwareCore<'buf>, L: Logger> embedded_hal::i2c::I2c
    for I2cController<'buf, H, L>
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let checked = check_operations(address, operations);
        let result = checked.and_then(|()| self.run_transaction(address, operations));

        if let Err(e) = result {
            self.logger.error(&format_line(format_args!(
                "i2c: transaction with {address:#04x} failed: {e}"
            )));
            // rejected requests never reached the bus
            if self.config.recover_on_error && checked.is_ok() {
                if let Err(re) = self.recovery() {
                    self.logger
                        .error(&format_line(format_args!("i2c: recovery failed: {re}")));
                }
            }
        }
        result
    }
}
