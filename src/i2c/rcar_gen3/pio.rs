// Licensed under the Apache-2.0 license

use super::xfer::{irq_enable, XferContext};
use super::RcarGen3I2c;
use crate::common::Logger;
use crate::i2c::common::{Error, XferBuf};
use crate::i2c::registers::ICMSR;
use crate::i2c::traits::{HardwareInterface, PioTransfer};

impl<'buf, H: HardwareInterface, L: Logger> PioTransfer<'buf> for RcarGen3I2c<'buf, H, L> {
    fn xfer_pio(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<(), Error> {
        let xfer = XferContext::new(step, step_max, address, buf)?;
        let read = xfer.is_read();

        // the buffer stays with the driver even if the start fails
        let xfer = self.xfer.insert(xfer);
        if let Err(e) = xfer.begin(&mut self.hw, self.icccr) {
            self.log_failure("pio start", e);
            return Err(e);
        }

        irq_enable(&mut self.hw, read);
        Ok(())
    }

    fn xfer_pio_irq(&mut self) -> nb::Result<(), Error> {
        let Some(xfer) = self.xfer.as_mut() else {
            return Err(nb::Error::Other(Error::InvalidArgument));
        };

        let msr = self.hw.read(ICMSR);
        let result = xfer.advance(&mut self.hw, msr);
        if let Err(nb::Error::Other(e)) = result {
            self.log_failure("pio transfer", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::{MockHost, RecordingLogger};
    use crate::i2c::registers::icmsr::{self, MAL, MAT, MDE, MDR, MST};
    use crate::i2c::registers::{icmcr, ICMCR, ICMIER, ICRXTX};
    use crate::i2c::traits::I2cHardwareCore;

    fn controller<'buf>(host: MockHost) -> RcarGen3I2c<'buf, MockHost, RecordingLogger> {
        let mut i2c = RcarGen3I2c::new(host, RecordingLogger::default());
        i2c.setup_speed(400_000).unwrap();
        i2c
    }

    #[test]
    fn test_start_enables_send_interrupts() {
        let mut i2c = controller(MockHost::new());

        i2c.xfer_pio(0, 1, 0xAA, XferBuf::Tx(&[0x01, 0x02])).unwrap();

        let writes = i2c.hardware().writes();
        assert_eq!(
            writes[writes.len() - 3..],
            [
                (ICMSR, 0),
                (ICMCR, icmcr::PHASE_START),
                (ICMIER, icmsr::ENABLE_SEND)
            ]
        );
        assert_eq!(i2c.position(), Some(0));
    }

    #[test]
    fn test_write_driven_by_interrupts() {
        let mut i2c = controller(MockHost::with_msr(&[MAT | MDE, MDE, MDE, MST]));

        i2c.xfer_pio(0, 1, 0xAA, XferBuf::Tx(&[0x01, 0x02])).unwrap();

        assert_eq!(i2c.xfer_pio_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.position(), Some(1));
        assert_eq!(i2c.xfer_pio_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.xfer_pio_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.xfer_pio_irq(), Ok(()));

        assert_eq!(i2c.hardware().writes_to(ICRXTX), [0x01, 0x02]);
        assert_eq!(i2c.hardware().writes_to(ICMIER).last(), Some(&0));
        assert!(i2c.logger().lines.is_empty());
    }

    #[test]
    fn test_read_returns_buffer_to_host() {
        let mut host = MockHost::with_msr(&[MAT, MDR, MDR, MST]);
        host.rx.extend([0x10, 0x20]);
        let mut data = [0u8; 2];
        let mut i2c = controller(host);

        i2c.xfer_pio(0, 1, 0x51, XferBuf::Rx(&mut data)).unwrap();
        assert_eq!(
            i2c.hardware().writes_to(ICMIER),
            [0, icmsr::ENABLE_RECV]
        );

        while i2c.xfer_pio_irq() == Err(nb::Error::WouldBlock) {}

        assert_eq!(i2c.position(), Some(2));
        let buf = i2c.release_buffer().unwrap();
        assert_eq!(buf.into_rx().unwrap(), [0x10, 0x20]);
        assert!(i2c.release_buffer().is_none());
    }

    #[test]
    fn test_arbitration_loss_is_reported() {
        let mut i2c = controller(MockHost::with_msr(&[MAL]));

        i2c.xfer_pio(0, 1, 0xAA, XferBuf::Tx(&[0x01])).unwrap();

        assert_eq!(
            i2c.xfer_pio_irq(),
            Err(nb::Error::Other(Error::ArbitrationLost))
        );
        assert_eq!(
            i2c.logger().lines,
            ["error: rcar-i2c: pio transfer: arbitration lost"]
        );
    }

    #[test]
    fn test_interrupt_without_transfer() {
        let mut i2c = controller(MockHost::with_msr(&[MST]));

        assert_eq!(
            i2c.xfer_pio_irq(),
            Err(nb::Error::Other(Error::InvalidArgument))
        );
        assert!(i2c.hardware().log.is_empty());
    }

    #[test]
    fn test_busy_start_keeps_buffer() {
        let mut host = MockHost::new();
        host.stuck = true;
        let data = [0x7Eu8];
        let mut i2c = controller(host);

        assert_eq!(i2c.xfer_pio(0, 1, 0xAA, XferBuf::Tx(&data)), Err(Error::Busy));
        assert!(i2c.hardware().writes_to(ICMIER).is_empty());
        assert!(i2c.release_buffer().is_some());
    }
}
