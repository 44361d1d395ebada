// Licensed under the Apache-2.0 license

use super::xfer::POLL_INTERVAL;
use super::RcarGen3I2c;
use crate::common::Logger;
use crate::i2c::common::Error;
use crate::i2c::registers::{icmcr, ICMCR};
use crate::i2c::traits::{BusRecovery, HardwareInterface};

/// SCL pulses needed to walk a target through the rest of a byte and its
/// acknowledge bit.
const RECOVERY_CLOCKS: usize = 9;

/// Manual mode with the bus pins driven from ICMCR.
const MANUAL: u32 = icmcr::MDBS | icmcr::OBPC;

/// Manual stop condition: SDA low, SCL low, SCL high, SDA high.
const STOP_SEQUENCE: [u32; 4] = [
    MANUAL | icmcr::FSDA,
    MANUAL,
    MANUAL | icmcr::FSCL,
    MANUAL | icmcr::FSDA | icmcr::FSCL,
];

impl<H: HardwareInterface, L: Logger> RcarGen3I2c<'_, H, L> {
    fn write_and_settle(&mut self, icmcr_val: u32) {
        self.hw.write(ICMCR, icmcr_val);
        self.hw.delay_us(POLL_INTERVAL.ticks());
    }
}

impl<H: HardwareInterface, L: Logger> BusRecovery for RcarGen3I2c<'_, H, L> {
    /// Toggles SCL with SDA released until a stuck target lets go, then
    /// drives a stop condition by hand.
    ///
    /// The bus is never sampled, so success is assumed.
    fn recovery(&mut self) -> Result<(), Error> {
        self.logger.debug("rcar-i2c: bus recovery");

        for _ in 0..RECOVERY_CLOCKS {
            self.write_and_settle(MANUAL | icmcr::FSDA | icmcr::FSCL);
            self.write_and_settle(MANUAL | icmcr::FSDA);
        }

        self.hw.delay_us(POLL_INTERVAL.ticks());
        for val in STOP_SEQUENCE {
            self.write_and_settle(val);
        }

        Ok(())
    }
}
