// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! The driver core talks to the outside world through two kinds of traits:
//!
//! - [`HardwareInterface`] is what the host supplies: register read, register
//!   write and a microsecond delay. Nothing else about the host OS leaks into
//!   the core.
//! - [`I2cHardwareCore`] and the strategy traits are what the driver supplies.
//!   Each transfer strategy is its own trait, and the core trait exposes them
//!   through `as_*` accessors. A strategy that is not wired returns `None`,
//!   so the set of supported strategies is discovered once instead of being
//!   checked on every call.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! HardwareInterface (host side, extends embedded_hal::delay::DelayNs)
//!
//! I2cHardwareCore<'buf> (probe, remove, setup_speed, version)
//!     ├── as_recovery() -> BusRecovery
//!     ├── as_atomic()   -> AtomicTransfer
//!     ├── as_pio()      -> PioTransfer<'buf>
//!     └── as_dma()      -> DmaTransfer<'buf>
//! ```

use crate::i2c::common::{Capabilities, DmaInfo, DmaRegion, Error, Version, XferBuf};
use embedded_hal::delay::DelayNs;

/// Register access and delay primitives provided by the host.
///
/// `reg` is a byte offset from the controller base (see
/// [`registers`](crate::i2c::registers)). The delay comes from the
/// [`DelayNs`] supertrait; the driver only calls `delay_us`.
///
/// # Examples
///
/// ```rust,ignore
/// struct Mmio {
///     base: *mut u32,
///     timer: SysTimer,
/// }
///
/// impl DelayNs for Mmio {
///     fn delay_ns(&mut self, ns: u32) {
///         self.timer.spin_ns(ns);
///     }
/// }
///
/// impl HardwareInterface for Mmio {
///     fn read(&mut self, reg: u32) -> u32 {
///         unsafe { self.base.byte_add(reg as usize).read_volatile() }
///     }
///
///     fn write(&mut self, reg: u32, val: u32) {
///         unsafe { self.base.byte_add(reg as usize).write_volatile(val) }
///     }
/// }
/// ```
pub trait HardwareInterface: DelayNs {
    fn read(&mut self, reg: u32) -> u32;
    fn write(&mut self, reg: u32, val: u32);
}

impl<T: HardwareInterface + ?Sized> HardwareInterface for &mut T {
    fn read(&mut self, reg: u32) -> u32 {
        (**self).read(reg)
    }

    fn write(&mut self, reg: u32, val: u32) {
        (**self).write(reg, val);
    }
}

/// Core driver interface every controller variant provides.
///
/// `'buf` is the lifetime of buffers handed to the non-blocking strategies,
/// which keep them across calls until the host takes them back with
/// [`release_buffer`](I2cHardwareCore::release_buffer).
pub trait I2cHardwareCore<'buf> {
    /// Version of this driver variant.
    fn version(&self) -> Version;

    /// One-time software setup.
    ///
    /// Must not touch registers: the controller may still be unpowered.
    ///
    /// # Errors
    ///
    /// Driver specific. The default implementation always succeeds.
    fn probe(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Counterpart of [`probe`](I2cHardwareCore::probe).
    ///
    /// # Errors
    ///
    /// Driver specific. The default implementation always succeeds.
    fn remove(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Select the bus frequency in Hz used from the next transaction on.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for a frequency the driver has no
    /// divider for. The previous setting is kept in that case.
    fn setup_speed(&mut self, bus_speed: u32) -> Result<(), Error>;

    /// Capabilities beyond the wired strategies.
    fn extra_support(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Take back the buffer of the last PIO or DMA transfer.
    fn release_buffer(&mut self) -> Option<XferBuf<'buf>> {
        None
    }

    fn as_recovery(&mut self) -> Option<&mut dyn BusRecovery> {
        None
    }

    fn as_atomic(&mut self) -> Option<&mut dyn AtomicTransfer> {
        None
    }

    fn as_pio(&mut self) -> Option<&mut dyn PioTransfer<'buf>> {
        None
    }

    fn as_dma(&mut self) -> Option<&mut dyn DmaTransfer<'buf>> {
        None
    }
}

/// Manual bus recovery.
pub trait BusRecovery {
    /// Clock a stuck target off the bus and send a stop condition.
    ///
    /// # Errors
    ///
    /// Implementations may report failure; the R-Car Gen3 sequence does not
    /// observe the bus and always returns `Ok(())`.
    fn recovery(&mut self) -> Result<(), Error>;
}

/// Blocking transfer of one message.
pub trait AtomicTransfer {
    /// Transfer message `step` of `step_max` to or from `address`
    /// (8-bit form, bit 0 set for read) and return once it is complete.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for `step >= step_max` or a buffer that does not
    /// match the direction bit, `Busy` when the bus never went idle,
    /// `Timeout` when the controller stops reporting events, and
    /// `ArbitrationLost` / `NoAcknowledge` from the bus.
    fn xfer_atomic(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'_>,
    ) -> Result<(), Error>;
}

/// Interrupt driven transfer, one state machine step per interrupt.
pub trait PioTransfer<'buf> {
    /// Start message `step` of `step_max` and return immediately.
    ///
    /// # Errors
    ///
    /// Same argument and bus errors as [`AtomicTransfer::xfer_atomic`],
    /// minus `Timeout`.
    fn xfer_pio(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<(), Error>;

    /// Advance the message from the controller interrupt.
    ///
    /// `Ok(())` when the message is done, `WouldBlock` while it is still
    /// moving.
    ///
    /// # Errors
    ///
    /// `ArbitrationLost` / `NoAcknowledge`, or `InvalidArgument` when no
    /// transfer was started.
    fn xfer_pio_irq(&mut self) -> nb::Result<(), Error>;
}

/// DMA assisted transfer. The driver only handles the boundary bytes.
pub trait DmaTransfer<'buf> {
    /// Register message `step` of `step_max` and report which part of `buf`
    /// the host must program into its DMA engine.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the message is too short to leave a DMA part
    /// or the buffer does not match the direction bit.
    fn xfer_dma_setup(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<DmaRegion, Error>;

    /// `true` starts the registered message and raises the DMA request
    /// line; `false` only drops the request line.
    ///
    /// # Errors
    ///
    /// Start errors as in [`PioTransfer::xfer_pio`]; `InvalidArgument` when
    /// enabling without a registered message.
    fn xfer_dma_enable(&mut self, enable: bool) -> Result<(), Error>;

    /// Advance the message from the controller interrupt.
    ///
    /// # Errors
    ///
    /// As [`PioTransfer::xfer_pio_irq`].
    fn xfer_dma_irq(&mut self) -> nb::Result<(), Error>;

    /// Register endpoints for the DMA engine.
    fn xfer_dma_info(&self) -> DmaInfo;

    /// # Errors
    ///
    /// As [`DmaTransfer::xfer_dma_enable`].
    fn xfer_dma_start(&mut self) -> Result<(), Error> {
        self.xfer_dma_enable(true)
    }

    /// Called from the DMA completion interrupt.
    ///
    /// # Errors
    ///
    /// As [`DmaTransfer::xfer_dma_enable`].
    fn xfer_dma_stop(&mut self) -> Result<(), Error> {
        self.xfer_dma_enable(false)
    }
}
