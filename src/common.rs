// Licensed under the Apache-2.0 license

//! Crate-wide helpers shared by the drivers.
//!
//! Drivers and controllers take a `Logger` type parameter so that firmware
//! without a console pays nothing for diagnostics (`NoOpLogger`), while a
//! board bring-up build can route the same messages to a UART through
//! [`WriteLogger`].

use core::fmt::Write as _;
use heapless::String;

/// Capacity of the scratch buffer used for formatted log lines.
pub const LOG_LINE_CAPACITY: usize = 96;

/// Minimal line-oriented logging sink.
pub trait Logger {
    fn debug(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Logger that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

/// Logger writing `[LEVEL] message` lines to an `embedded_io::Write` sink.
///
/// Write errors are ignored: logging must never turn into a transfer failure.
pub struct WriteLogger<W: embedded_io::Write> {
    writer: W,
}

impl<W: embedded_io::Write> WriteLogger<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: embedded_io::Write> Logger for WriteLogger<W> {
    fn debug(&mut self, msg: &str) {
        let _ = writeln!(self.writer, "[DEBUG] {msg}\r");
    }

    fn error(&mut self, msg: &str) {
        let _ = writeln!(self.writer, "[ERROR] {msg}\r");
    }
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn debug(&mut self, msg: &str) {
        (**self).debug(msg);
    }

    fn error(&mut self, msg: &str) {
        (**self).error(msg);
    }
}

/// Formats `args` into a bounded line buffer.
///
/// Lines longer than [`LOG_LINE_CAPACITY`] are truncated at the point where
/// the buffer filled up.
#[must_use]
pub fn format_line(args: core::fmt::Arguments<'_>) -> String<LOG_LINE_CAPACITY> {
    let mut line = String::new();
    let _ = line.write_fmt(args);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    struct Sink(Vec<u8>);

    impl embedded_io::ErrorType for Sink {
        type Error = core::convert::Infallible;
    }

    impl embedded_io::Write for Sink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_write_logger_prefixes_level() {
        let mut logger = WriteLogger::new(Sink(Vec::new()));
        logger.debug("probe");
        logger.error("nack");

        let out = logger.into_inner().0;
        assert_eq!(out, b"[DEBUG] probe\r\n[ERROR] nack\r\n".to_vec());
    }

    #[test]
    fn test_format_line_truncates() {
        let long = "x".repeat(LOG_LINE_CAPACITY * 2);
        let line = format_line(format_args!("{long}"));
        assert!(line.len() <= LOG_LINE_CAPACITY);

        let short = format_line(format_args!("speed {} Hz", 100_000));
        assert_eq!(short.as_str(), "speed 100000 Hz");
    }
}
