//! Simulation output: redraws the channel values on a terminal instead of
//! sending them.

use std::io::{self, Write};

use tracing::warn;

use super::sink::FrameSink;
use crate::rcinput::protocol::RcPacket;
use crate::state::Channel;

/// ANSI cursor-home plus clear-screen
const CLEAR_SCREEN: &str = "\x1b[H\x1b[J";

/// Terminal display of the current channel values
#[derive(Debug)]
pub struct ConsoleDisplay<W: Write> {
    out: W,
    clear: bool,
}

impl ConsoleDisplay<io::Stdout> {
    /// Display on standard output, redrawing in place
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            out: io::stdout(),
            clear: true,
        }
    }
}

impl<W: Write> ConsoleDisplay<W> {
    /// Display on any writer; `clear` controls the ANSI redraw prefix
    pub fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    /// Consume the display and return the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, packet: &RcPacket) -> io::Result<()> {
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        for (channel, pwm) in Channel::ALL.iter().zip(packet.pwms.iter()) {
            writeln!(self.out, "{}: {}", channel, pwm)?;
        }
        self.out.flush()
    }
}

impl<W: Write> FrameSink for ConsoleDisplay<W> {
    async fn send(&mut self, packet: &RcPacket) {
        if let Err(e) = self.render(packet) {
            warn!("Failed to draw channel values: {}", e);
        }
    }
}
