// Licensed under the Apache-2.0 license

//! Transfer context and the state machine shared by all strategies.
//!
//! There is no phase field. Every step looks at `pos`, the buffer length and
//! the flags to decide what the controller needs next, so an interrupt that
//! re-enters the machine resumes exactly where the previous one left off.

// a build without any transfer strategy only keeps the context type around
#![cfg_attr(
    not(any(feature = "atomic", feature = "pio", feature = "dma")),
    allow(dead_code)
)]

use crate::i2c::common::{Error, XferBuf};
use crate::i2c::registers::{
    icfbscr, icmcr, icmsr, icscr, ICCCR, ICFBSCR, ICMAR, ICMCR, ICMIER, ICMSR, ICRXTX, ICSAR,
    ICSCR, ICSIER, ICSSR,
};
use crate::i2c::traits::HardwareInterface;
use fugit::MicrosDurationU32;

/// Bus busy polls before a transaction gives up.
pub(crate) const BUS_BARRIER_RETRIES: usize = 200;

/// Spacing of every busy-wait poll and of the recovery clock edges.
pub(crate) const POLL_INTERVAL: MicrosDurationU32 = MicrosDurationU32::from_ticks(5);

const FLAG_READ: u8 = 1 << 0;
/// The address phase clocks the first receive cycle, which carries no data.
const FLAG_READ0: u8 = 1 << 1;

pub(crate) struct XferContext<'a> {
    step: usize,
    step_max: usize,
    address: u8,
    buf: XferBuf<'a>,
    pos: usize,
    flags: u8,
}

impl<'a> XferContext<'a> {
    pub(crate) fn new(
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'a>,
    ) -> Result<Self, Error> {
        let mut flags = 0;
        if address & 0x1 != 0 {
            flags |= FLAG_READ | FLAG_READ0;
        }
        if flags & FLAG_READ != 0 && !buf.is_rx() {
            return Err(Error::InvalidArgument);
        }

        Ok(Self {
            step,
            step_max,
            address,
            buf,
            pos: 0,
            flags,
        })
    }

    pub(crate) fn is_read(&self) -> bool {
        self.flags & FLAG_READ != 0
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor over bytes transferred outside the state machine.
    #[cfg(feature = "dma")]
    pub(crate) fn skip_to(&mut self, pos: usize) {
        self.pos = pos.min(self.len());
    }

    pub(crate) fn into_buffer(self) -> XferBuf<'a> {
        self.buf
    }

    /// Program the controller and issue the start condition.
    ///
    /// The first message of a transaction waits for an idle bus and brings
    /// both the slave and master halves of the controller to a known state;
    /// later messages only load the address and send a repeated start.
    pub(crate) fn begin<H: HardwareInterface>(&self, hw: &mut H, icccr: u32) -> Result<(), Error> {
        if self.step >= self.step_max {
            return Err(Error::InvalidArgument);
        }

        if self.step == 0 {
            // check bus status not to lose bus busy info
            bus_barrier(hw)?;

            // Reset slave
            hw.write(ICSIER, 0);
            hw.write(ICSCR, icscr::SDBS);
            hw.write(ICSAR, 0);
            hw.write(ICSSR, 0);

            // Reset master
            hw.write(ICMIER, 0);
            hw.write(ICMCR, icmcr::MDBS);
            hw.write(ICMAR, 0);
            hw.write(ICMSR, 0);

            hw.write(ICCCR, icccr);
            hw.write(ICFBSCR, icfbscr::TCYC17);
        }

        hw.write(ICMAR, u32::from(self.address));

        hw.write(ICMSR, 0);
        hw.write(ICMCR, icmcr::PHASE_START);

        Ok(())
    }

    /// Feed one status snapshot through the interpreter and, while the
    /// message is still moving, through the continuation for its direction.
    pub(crate) fn advance<H: HardwareInterface>(
        &mut self,
        hw: &mut H,
        msr: u32,
    ) -> nb::Result<(), Error> {
        match status_update(hw, msr) {
            Err(nb::Error::WouldBlock) => {}
            finished => return finished,
        }

        if self.is_read() {
            self.recv(hw);
        } else {
            self.send(hw);
        }

        Err(nb::Error::WouldBlock)
    }

    // (address sent by begin())
    // IRQ  [DATA] [SEND] [ACK]
    // IRQ         [SEND] [ACK]
    //  ...
    // IRQ  [STOP]        [CLEAR]
    fn send<H: HardwareInterface>(&mut self, hw: &mut H) {
        let Some(byte) = self.buf.get(self.pos) else {
            hw.write(ICMCR, icmcr::PHASE_STOP);
            hw.write(ICMSR, 0);
            return;
        };

        if self.pos == 0 {
            hw.write(ICMCR, icmcr::PHASE_DATA);
        }

        hw.write(ICRXTX, u32::from(byte));
        self.pos += 1;

        hw.write(ICMSR, icmsr::STATE_ACK_SEND);
    }

    // len == 1
    //  IRQ  [STOP]        [ACK]    (A) pos check is not enough
    //  IRQ         [READ] [CLEAR]
    //
    // len > 1
    //  IRQ  [DATA]        [ACK]
    //  IRQ         [READ] [ACK]
    //   ...
    //  IRQ  [STOP] [READ] [ACK]    (B)
    //  IRQ         [READ] [CLEAR]
    fn recv<H: HardwareInterface>(&mut self, hw: &mut H) {
        let len = self.len();

        if (len == 1 && self.is_read()) || (len > 1 && self.pos + 1 == len) {
            hw.write(ICMCR, icmcr::PHASE_STOP);
        } else if self.flags & FLAG_READ0 != 0 {
            hw.write(ICMCR, icmcr::PHASE_DATA);
        }

        if self.flags & FLAG_READ0 != 0 {
            self.flags &= !FLAG_READ0;
        } else if self.pos < len {
            let byte = (hw.read(ICRXTX) & 0xFF) as u8;
            self.buf.store(self.pos, byte);
            self.pos += 1;
        }

        if self.pos < len {
            hw.write(ICMSR, icmsr::STATE_ACK_RECV);
        } else {
            hw.write(ICMSR, 0);
        }
    }
}

/// Wait until no other master holds the bus.
pub(crate) fn bus_barrier<H: HardwareInterface>(hw: &mut H) -> Result<(), Error> {
    for _ in 0..BUS_BARRIER_RETRIES {
        if hw.read(ICMCR) & icmcr::FSDA == 0 {
            return Ok(());
        }
        hw.delay_us(POLL_INTERVAL.ticks());
    }

    Err(Error::Busy)
}

/// Classify a master status snapshot.
///
/// Arbitration loss wins over a missing acknowledge, which wins over the
/// stop event. All three leave master interrupts off and the status clear.
pub(crate) fn status_update<H: HardwareInterface>(hw: &mut H, msr: u32) -> nb::Result<(), Error> {
    let result = if msr & icmsr::MAL != 0 {
        Err(nb::Error::Other(Error::ArbitrationLost))
    } else if msr & icmsr::MNR != 0 {
        Err(nb::Error::Other(Error::NoAcknowledge))
    } else if msr & icmsr::MST != 0 {
        Ok(())
    } else {
        return Err(nb::Error::WouldBlock);
    };

    irq_disable(hw);
    hw.write(ICMSR, 0);

    result
}

#[cfg(any(feature = "pio", feature = "dma"))]
pub(crate) fn irq_enable<H: HardwareInterface>(hw: &mut H, read: bool) {
    let val = if read {
        icmsr::ENABLE_RECV
    } else {
        icmsr::ENABLE_SEND
    };
    hw.write(ICMIER, val);
}

pub(crate) fn irq_disable<H: HardwareInterface>(hw: &mut H) {
    hw.write(ICMIER, 0);
}
