// Licensed under the Apache-2.0 license

//! DMA assisted transfers.
//!
//! The state machine still runs from the controller interrupt, but only for
//! the bytes at the edges of the message. The first byte of a write and the
//! last two bytes of a read go through ICRXTX by hand so that the start and
//! stop conditions are placed correctly; everything in between is moved by
//! the host's DMA engine between the buffer and ICRXTX.

use super::xfer::{irq_enable, XferContext};
use super::RcarGen3I2c;
use crate::common::Logger;
use crate::i2c::common::{DmaInfo, DmaRegion, Error, XferBuf};
use crate::i2c::registers::{icdmaer, ICDMAER, ICMSR, ICRXTX};
use crate::i2c::traits::{DmaTransfer, HardwareInterface};

/// Leading bytes of a write sent before the DMA engine takes over.
const DMA_WRITE_HEAD: usize = 1;
/// Trailing bytes of a read received after the DMA engine is done.
const DMA_READ_TAIL: usize = 2;

fn dma_region(xfer: &XferContext<'_>) -> Option<DmaRegion> {
    let len = xfer.len();
    if xfer.is_read() {
        Some(DmaRegion {
            offset: 0,
            len: len.checked_sub(DMA_READ_TAIL)?,
        })
    } else {
        Some(DmaRegion {
            offset: DMA_WRITE_HEAD,
            len: len.checked_sub(DMA_WRITE_HEAD)?,
        })
    }
}

impl<'buf, H: HardwareInterface, L: Logger> RcarGen3I2c<'buf, H, L> {
    fn dma_start(&mut self) -> Result<(), Error> {
        let xfer = self.xfer.as_ref().ok_or(Error::InvalidArgument)?;
        let read = xfer.is_read();

        xfer.begin(&mut self.hw, self.icccr)?;
        irq_enable(&mut self.hw, read);

        let request = if read {
            icdmaer::RMDMAE
        } else {
            icdmaer::TMDMAE
        };
        self.hw.write(ICDMAER, request);
        Ok(())
    }
}

impl<'buf, H: HardwareInterface, L: Logger> DmaTransfer<'buf> for RcarGen3I2c<'buf, H, L> {
    fn xfer_dma_setup(
        &mut self,
        step: usize,
        step_max: usize,
        address: u8,
        buf: XferBuf<'buf>,
    ) -> Result<DmaRegion, Error> {
        let xfer = XferContext::new(step, step_max, address, buf)?;
        let region = dma_region(&xfer).ok_or(Error::InvalidArgument)?;

        self.xfer = Some(xfer);
        Ok(region)
    }

    fn xfer_dma_enable(&mut self, enable: bool) -> Result<(), Error> {
        if !enable {
            self.hw.write(ICDMAER, 0);
            return Ok(());
        }

        self.dma_start()
            .inspect_err(|e| self.log_failure("dma start", *e))
    }

    fn xfer_dma_irq(&mut self) -> nb::Result<(), Error> {
        let Some(xfer) = self.xfer.as_mut() else {
            return Err(nb::Error::Other(Error::InvalidArgument));
        };

        let msr = self.hw.read(ICMSR);
        let result = xfer.advance(&mut self.hw, msr);
        match result {
            Err(nb::Error::WouldBlock) => {
                // skip over the bytes the DMA engine owns
                let len = xfer.len();
                match (xfer.is_read(), xfer.position()) {
                    (true, 0) => xfer.skip_to(len.saturating_sub(DMA_READ_TAIL)),
                    (false, DMA_WRITE_HEAD) => xfer.skip_to(len),
                    _ => {}
                }
            }
            Err(nb::Error::Other(e)) => self.log_failure("dma transfer", e),
            Ok(()) => {}
        }
        result
    }

    fn xfer_dma_info(&self) -> DmaInfo {
        DmaInfo {
            reg_dst: ICRXTX,
            reg_src: ICRXTX,
            xfer_size: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i2c::mock::{MockHost, RecordingLogger};
    use crate::i2c::registers::icmsr::{self, MAT, MDE, MDR, MNR, MST};
    use crate::i2c::registers::{icmcr, ICMCR, ICMIER};
    use crate::i2c::traits::I2cHardwareCore;
    use hex_literal::hex;

    fn controller<'buf>(host: MockHost) -> RcarGen3I2c<'buf, MockHost, RecordingLogger> {
        let mut i2c = RcarGen3I2c::new(host, RecordingLogger::default());
        i2c.setup_speed(100_000).unwrap();
        i2c
    }

    #[test]
    fn test_write_region_and_jump() {
        let data = hex!("0102030405");
        let mut i2c = controller(MockHost::with_msr(&[MAT | MDE, MDE, MST]));

        let region = i2c.xfer_dma_setup(0, 1, 0xAA, XferBuf::Tx(&data)).unwrap();
        assert_eq!(region, DmaRegion { offset: 1, len: 4 });
        assert_eq!(&data[region.range()], hex!("02030405"));
        assert!(i2c.hardware().log.is_empty());

        i2c.xfer_dma_start().unwrap();
        let writes = i2c.hardware().writes();
        assert_eq!(
            writes[writes.len() - 2..],
            [(ICMIER, icmsr::ENABLE_SEND), (ICDMAER, icdmaer::TMDMAE)]
        );

        // head byte by hand, the rest belongs to the DMA engine
        assert_eq!(i2c.xfer_dma_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.position(), Some(5));
        assert_eq!(i2c.hardware().writes_to(ICRXTX), [0x01]);

        i2c.xfer_dma_stop().unwrap();
        assert_eq!(i2c.hardware().writes_to(ICDMAER).last(), Some(&0));

        assert_eq!(i2c.xfer_dma_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.hardware().writes_to(ICMCR).last(), Some(&icmcr::PHASE_STOP));
        assert_eq!(i2c.xfer_dma_irq(), Ok(()));
    }

    #[test]
    fn test_read_region_and_tail() {
        let mut host = MockHost::with_msr(&[MAT, MDR, MDR, MST]);
        host.rx.extend([0xD3, 0xD4]);
        let mut data = [0u8; 5];
        let mut i2c = controller(host);

        let region = i2c
            .xfer_dma_setup(0, 1, 0xA1, XferBuf::Rx(&mut data))
            .unwrap();
        assert_eq!(region, DmaRegion { offset: 0, len: 3 });

        i2c.xfer_dma_enable(true).unwrap();
        assert_eq!(i2c.hardware().writes_to(ICDMAER), [icdmaer::RMDMAE]);

        assert_eq!(i2c.xfer_dma_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.position(), Some(3));
        assert_eq!(i2c.hardware().reads_of(ICRXTX), 0);

        assert_eq!(i2c.xfer_dma_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.xfer_dma_irq(), Err(nb::Error::WouldBlock));
        assert_eq!(i2c.xfer_dma_irq(), Ok(()));

        let rx = i2c.release_buffer().unwrap().into_rx().unwrap();
        assert_eq!(rx[3..], [0xD3, 0xD4]);
    }

    #[test]
    fn test_too_short_for_dma() {
        let mut one = [0u8; 1];
        let mut two = [0u8; 2];
        let mut i2c = controller(MockHost::new());

        assert_eq!(
            i2c.xfer_dma_setup(0, 1, 0xA1, XferBuf::Rx(&mut one)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            i2c.xfer_dma_setup(0, 1, 0xA0, XferBuf::Tx(&[])),
            Err(Error::InvalidArgument)
        );
        assert!(i2c.release_buffer().is_none());

        assert_eq!(
            i2c.xfer_dma_setup(0, 1, 0xA1, XferBuf::Rx(&mut two)),
            Ok(DmaRegion { offset: 0, len: 0 })
        );
    }

    #[test]
    fn test_enable_without_setup() {
        let mut i2c = controller(MockHost::new());

        assert_eq!(i2c.xfer_dma_enable(true), Err(Error::InvalidArgument));
        assert!(i2c.hardware().log.is_empty());
        assert_eq!(i2c.logger().lines, ["error: rcar-i2c: dma start: invalid argument"]);
        assert_eq!(
            i2c.xfer_dma_irq(),
            Err(nb::Error::Other(Error::InvalidArgument))
        );
    }

    #[test]
    fn test_nack_during_dma() {
        let data = hex!("a0a1a2");
        let mut i2c = controller(MockHost::with_msr(&[MNR]));

        i2c.xfer_dma_setup(0, 1, 0xAA, XferBuf::Tx(&data)).unwrap();
        i2c.xfer_dma_start().unwrap();

        assert_eq!(
            i2c.xfer_dma_irq(),
            Err(nb::Error::Other(Error::NoAcknowledge))
        );
        assert_eq!(i2c.position(), Some(0));
    }

    #[test]
    fn test_register_endpoints() {
        let i2c = controller(MockHost::new());
        let info = i2c.xfer_dma_info();
        assert_eq!(info.reg_dst, ICRXTX);
        assert_eq!(info.reg_src, ICRXTX);
        assert_eq!(info.xfer_size, 1);
    }

    #[test]
    fn test_dma_write_uses_send_interrupts_only() {
        let data = [0u8; 3];
        let mut i2c = controller(MockHost::with_msr(&[MDE]));

        i2c.xfer_dma_setup(0, 1, 0xAA, XferBuf::Tx(&data)).unwrap();
        i2c.xfer_dma_start().unwrap();
        assert!(!i2c.hardware().writes_to(ICMIER).contains(&icmsr::ENABLE_RECV));
    }
}
