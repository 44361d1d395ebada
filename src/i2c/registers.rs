// Licensed under the Apache-2.0 license

//! R-Car Gen3 I2C register map.
//!
//! Offsets are relative to the controller base; the host's
//! [`HardwareInterface`](crate::i2c::traits::HardwareInterface) adds the base.

/// Slave control
pub const ICSCR: u32 = 0x00;
/// Master control
pub const ICMCR: u32 = 0x04;
/// Slave status
pub const ICSSR: u32 = 0x08;
/// Master status
pub const ICMSR: u32 = 0x0C;
/// Slave interrupt enable
pub const ICSIER: u32 = 0x10;
/// Master interrupt enable
pub const ICMIER: u32 = 0x14;
/// Clock control
pub const ICCCR: u32 = 0x18;
/// Slave address
pub const ICSAR: u32 = 0x1C;
/// Master address
pub const ICMAR: u32 = 0x20;
/// Receive/transmit data
pub const ICRXTX: u32 = 0x24;
/// First bit setup cycle
pub const ICFBSCR: u32 = 0x38;
/// DMA enable
pub const ICDMAER: u32 = 0x3C;

/// ICSCR bits
pub mod icscr {
    /// Slave device buffer select
    pub const SDBS: u32 = 1 << 3;
}

/// ICMCR bits
pub mod icmcr {
    pub const MDBS: u32 = 1 << 7;
    pub const FSCL: u32 = 1 << 6;
    pub const FSDA: u32 = 1 << 5;
    pub const OBPC: u32 = 1 << 4;
    pub const MIE: u32 = 1 << 3;
    pub const TSBE: u32 = 1 << 2;
    pub const FSB: u32 = 1 << 1;
    pub const ESG: u32 = 1 << 0;

    pub const PHASE_START: u32 = MDBS | MIE | ESG;
    pub const PHASE_DATA: u32 = MDBS | MIE;
    pub const PHASE_STOP: u32 = MDBS | MIE | FSB;
}

/// ICMSR / ICMIER bits
pub mod icmsr {
    /// No acknowledge received
    pub const MNR: u32 = 1 << 6;
    /// Arbitration lost
    pub const MAL: u32 = 1 << 5;
    /// Stop condition sent
    pub const MST: u32 = 1 << 4;
    /// Transmit data empty
    pub const MDE: u32 = 1 << 3;
    /// Transmit done
    pub const MDT: u32 = 1 << 2;
    /// Receive data ready
    pub const MDR: u32 = 1 << 1;
    /// Address transfer done
    pub const MAT: u32 = 1 << 0;

    /// Any event the atomic strategy reacts to.
    pub const WAIT_BUSY: u32 = MNR | MAL | MST | MDE | MDR | MAT;
    /// Written to ICMSR to release the next transmit cycle.
    pub const STATE_ACK_SEND: u32 = MNR | MAL | MST | MDT | MDR;
    /// Written to ICMSR to release the next receive cycle.
    pub const STATE_ACK_RECV: u32 = MNR | MAL | MST | MDE | MDT;

    pub const ENABLE_SEND: u32 = MNR | MAL | MST | MDE | MAT;
    pub const ENABLE_RECV: u32 = MNR | MAL | MST | MDR | MAT;
}

/// ICFBSCR values
pub mod icfbscr {
    /// 17 Tcyc delay of the first bit between SDA and SCL
    pub const TCYC17: u32 = 0x0f;
}

/// ICDMAER bits
pub mod icdmaer {
    pub const RSDMAE: u32 = 1 << 3;
    pub const TSDMAE: u32 = 1 << 2;
    pub const RMDMAE: u32 = 1 << 1;
    pub const TMDMAE: u32 = 1 << 0;
}
