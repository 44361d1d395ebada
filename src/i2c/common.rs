// Licensed under the Apache-2.0 license

//! Common types and constants for the R-Car I2C driver modules.
//!
//! This module provides shared definitions for error handling, bus speeds,
//! version and capability negotiation, transfer buffers and DMA descriptors
//! used across the driver implementation.

use core::fmt;
use core::ops::{BitOr, BitOrAssign, Range};
use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
use fugit::HertzU32;

/// Errors reported by every driver operation.
///
/// The set is closed. Each variant also has a stable negative integer code
/// (see [`Error::code`]) for hosts that speak the C convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The operation is not wired in this driver build.
    NotSupported,
    /// Bad argument, or no transfer in flight.
    InvalidArgument,
    /// The bus stayed busy for the whole bus barrier budget.
    Busy,
    /// No status event within the atomic poll budget.
    Timeout,
    /// Another master won the bus.
    ArbitrationLost,
    /// The target did not acknowledge.
    NoAcknowledge,
}

impl Error {
    /// Negative result code, `-1` (`NotSupported`) through `-6` (`NoAcknowledge`).
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Error::NotSupported => -1,
            Error::InvalidArgument => -2,
            Error::Busy => -3,
            Error::Timeout => -4,
            Error::ArbitrationLost => -5,
            Error::NoAcknowledge => -6,
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            Error::NoAcknowledge => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::Busy => ErrorKind::Bus,
            Error::NotSupported | Error::InvalidArgument | Error::Timeout => ErrorKind::Other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Error::NotSupported => "operation not supported",
            Error::InvalidArgument => "invalid argument",
            Error::Busy => "bus busy",
            Error::Timeout => "timeout",
            Error::ArbitrationLost => "arbitration lost",
            Error::NoAcknowledge => "no acknowledge",
        };
        f.write_str(msg)
    }
}

/// Collapses a non-blocking transfer result into the integer convention:
/// `1` when the message is done, `0` while it is still moving, and the
/// negative [`Error::code`] on failure.
#[must_use]
pub fn xfer_status_code(result: &nb::Result<(), Error>) -> i32 {
    match result {
        Ok(()) => 1,
        Err(nb::Error::WouldBlock) => 0,
        Err(nb::Error::Other(e)) => e.code(),
    }
}

/// Bus speeds with a pre-tabulated clock divider.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
}

impl I2cSpeed {
    #[must_use]
    pub const fn frequency(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

impl TryFrom<u32> for I2cSpeed {
    type Error = Error;

    fn try_from(bus_speed: u32) -> Result<Self, Self::Error> {
        match bus_speed {
            100_000 => Ok(I2cSpeed::Standard),
            400_000 => Ok(I2cSpeed::Fast),
            _ => Err(Error::InvalidArgument),
        }
    }
}

impl TryFrom<HertzU32> for I2cSpeed {
    type Error = Error;

    fn try_from(bus_speed: HertzU32) -> Result<Self, Self::Error> {
        Self::try_from(bus_speed.raw())
    }
}

pub struct I2cConfig {
    pub speed: I2cSpeed,
    /// Run bus recovery after a failed `embedded-hal` transaction.
    pub recover_on_error: bool,
}

pub struct I2cConfigBuilder {
    speed: I2cSpeed,
    recover_on_error: bool,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            speed: I2cSpeed::Standard,
            recover_on_error: false,
        }
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.speed = speed;
        self
    }
    #[must_use]
    pub fn recover_on_error(mut self, enabled: bool) -> Self {
        self.recover_on_error = enabled;
        self
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            speed: self.speed,
            recover_on_error: self.recover_on_error,
        }
    }
}

/// Driver version packed as `major.minor.bugfix-rcN` into one word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Version(u32);

impl Version {
    #[must_use]
    pub const fn new(major: u8, minor: u8, bugfix: u8, rc: u8) -> Self {
        Self((major as u32) << 24 | (minor as u32) << 16 | (bugfix as u32) << 8 | rc as u32)
    }

    /// Version a host was written against; only `major.minor` take part in
    /// [`Version::matches`].
    #[must_use]
    pub const fn target(major: u8, minor: u8) -> Self {
        Self::new(major, minor, 0, 0)
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn major(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[must_use]
    pub const fn minor(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[must_use]
    pub const fn bugfix(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[must_use]
    pub const fn rc(self) -> u8 {
        self.0 as u8
    }

    #[must_use]
    pub const fn matches(self, target: Version) -> bool {
        self.0 & 0xFFFF_0000 == target.0 & 0xFFFF_0000
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.bugfix())?;
        if self.rc() != 0 {
            write!(f, "-rc{}", self.rc())?;
        }
        Ok(())
    }
}

/// Set of transfer strategies a driver has wired.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(u32);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const RECOVERY: Self = Self(1 << 0);
    pub const ATOMIC: Self = Self(1 << 1);
    pub const PIO: Self = Self(1 << 2);
    pub const DMA: Self = Self(1 << 3);

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Buffer lent to a transfer.
///
/// Reads need somewhere to store bytes; writes only need to look at them,
/// which lets `embedded-hal` write operations pass their shared slices
/// straight through.
#[derive(Debug)]
pub enum XferBuf<'a> {
    Rx(&'a mut [u8]),
    Tx(&'a [u8]),
}

impl<'a> XferBuf<'a> {
    /// Picks the variant from the direction bit of an 8-bit address.
    pub fn for_address(address: u8, buf: &'a mut [u8]) -> Self {
        if address & 0x1 != 0 {
            XferBuf::Rx(buf)
        } else {
            XferBuf::Tx(buf)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            XferBuf::Rx(buf) => buf.len(),
            XferBuf::Tx(buf) => buf.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_rx(&self) -> bool {
        matches!(self, XferBuf::Rx(_))
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<u8> {
        match self {
            XferBuf::Rx(buf) => buf.get(index).copied(),
            XferBuf::Tx(buf) => buf.get(index).copied(),
        }
    }

    /// Stores `byte` at `index`. Transmit buffers and out-of-range indices
    /// are left untouched.
    pub fn store(&mut self, index: usize, byte: u8) {
        if let XferBuf::Rx(buf) = self {
            if let Some(slot) = buf.get_mut(index) {
                *slot = byte;
            }
        }
    }

    /// Hands a receive buffer back to its owner.
    #[must_use]
    pub fn into_rx(self) -> Option<&'a mut [u8]> {
        match self {
            XferBuf::Rx(buf) => Some(buf),
            XferBuf::Tx(_) => None,
        }
    }
}

/// Part of a message the host's DMA engine moves, as an offset into the
/// buffer passed to `xfer_dma_setup` and a byte count.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DmaRegion {
    pub offset: usize,
    pub len: usize,
}

impl DmaRegion {
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Register endpoints and transfer width for configuring the DMA engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DmaInfo {
    pub reg_dst: u32,
    pub reg_src: u32,
    pub xfer_size: u32,
}
