// Licensed under the Apache-2.0 license

//! Fake controller used by the unit tests.
//!
//! Records every register access and delay, and answers reads from scripted
//! queues: ICMSR from `msr`, ICRXTX from `rx`. ICMCR reports the bus as busy
//! for `busy_polls` reads, or forever when `stuck` is set.

use crate::common::Logger;
use crate::i2c::registers::{icmcr, ICMCR, ICMSR, ICRXTX};
use crate::i2c::traits::HardwareInterface;
use embedded_hal::delay::DelayNs;
use std::collections::VecDeque;
use std::string::{String, ToString};
use std::vec::Vec;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read(u32),
    Write(u32, u32),
    Delay(u32),
}

#[derive(Default)]
pub struct MockHost {
    pub log: Vec<Access>,
    pub msr: VecDeque<u32>,
    pub rx: VecDeque<u8>,
    pub busy_polls: usize,
    pub stuck: bool,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_msr(events: &[u32]) -> Self {
        let mut host = Self::new();
        host.msr.extend(events.iter().copied());
        host
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                Access::Write(reg, val) => Some((reg, val)),
                _ => None,
            })
            .collect()
    }

    pub fn writes_to(&self, reg: u32) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|(r, _)| *r == reg)
            .map(|(_, val)| val)
            .collect()
    }

    pub fn reads_of(&self, reg: u32) -> usize {
        self.log.iter().filter(|a| **a == Access::Read(reg)).count()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                Access::Delay(us) => Some(us),
                _ => None,
            })
            .collect()
    }

    pub fn position_of(&self, access: Access) -> Option<usize> {
        self.log.iter().position(|a| *a == access)
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl DelayNs for MockHost {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Access::Delay(ns / 1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Access::Delay(us));
    }
}

impl HardwareInterface for MockHost {
    fn read(&mut self, reg: u32) -> u32 {
        self.log.push(Access::Read(reg));
        match reg {
            ICMSR => self.msr.pop_front().unwrap_or(0),
            ICRXTX => u32::from(self.rx.pop_front().unwrap_or(0)),
            ICMCR if self.stuck => icmcr::FSDA,
            ICMCR if self.busy_polls > 0 => {
                self.busy_polls -= 1;
                icmcr::FSDA
            }
            _ => 0,
        }
    }

    fn write(&mut self, reg: u32, val: u32) {
        self.log.push(Access::Write(reg, val));
    }
}

/// Logger keeping every line for assertions.
#[derive(Default)]
pub struct RecordingLogger {
    pub lines: Vec<String>,
}

impl Logger for RecordingLogger {
    fn debug(&mut self, msg: &str) {
        self.lines.push(std::format!("debug: {msg}"));
    }

    fn error(&mut self, msg: &str) {
        self.lines.push("error: ".to_string() + msg);
    }
}
