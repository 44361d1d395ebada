// Licensed under the Apache-2.0 license

//! Blocking transfers: poll the master status and run the state machine
//! until the message completes, without returning to the host in between.

use super::xfer::{XferContext, POLL_INTERVAL};
use super::RcarGen3I2c;
use crate::common::Logger;
use crate::i2c::common::{Error, XferBuf};
use crate::i2c::registers::{icmsr, ICMSR};
use crate::i2c::traits::{AtomicTransfer, HardwareInterface};

/// Status polls per event before an atomic transfer times out.
const ATOMIC_POLL_RETRIES: usize = 256;

impl<H: HardwareInterface, L: Logger> RcarGen3I2c<'_, H, L> {
    fn wait_event(&mut self) -> Result<u32, Error> {
        for _ in 0..ATOMIC_POLL_RETRIES {
            let msr = self.hw.read(ICMSR);
            if msr & icmsr::WAIT_BUSY != 0 {
                return Ok(msr);
            }
            self.hw.delay_us(POLL_INTERVAL.ticks());
        }

        Err(Error::Timeout)
    }

    fn run_atomic(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'_>,
    ) -> Result<(), Error> {
        let mut xfer = XferContext::new(step, step_max, address, buf)?;
        xfer.begin(&mut self.hw, self.icccr)?;

        loop {
            let msr = self.wait_event()?;
            match xfer.advance(&mut self.hw, msr) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(e),
            }
        }
    }
}

impl<H: HardwareInterface, L: Logger> AtomicTransfer for RcarGen3I2c<'_, H, L> {
    fn xfer_atomic(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'_>,
    ) -> Result<(), Error> {
        self.run_atomic(step, step_max, address, buf)
            .inspect_err(|e| self.log_failure("atomic transfer", *e))
    }
}
