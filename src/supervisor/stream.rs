/// Line that flips the echo into character granularity: the suite is about
/// to print its one-dot-per-test progress stream.
pub const CHAR_MODE_TRIGGER: &str = "Started";

/// Where decoded output goes: whole lines in line mode, single bytes in
/// character mode. The supervisor's sink echoes to the console and appends
/// to the run transcript; tests collect events.
pub trait EchoSink {
    fn line(&mut self, line: &str);
    fn byte(&mut self, byte: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EchoMode {
    /// Buffer bytes until a newline, emit whole lines.
    Line,
    /// Emit every byte as it arrives, up to and including the next
    /// newline, then drop back to line mode.
    Char,
}

/// Two-mode stream transformer for worker output.
///
/// Normally the worker's output is consumed a line at a time. When a
/// completed line is exactly [`CHAR_MODE_TRIGGER`], the next line is
/// relayed byte by byte so a human watching the console sees each progress
/// dot the moment the suite prints it.
#[derive(Debug)]
pub struct ProgressEcho {
    mode: EchoMode,
    pending: Vec<u8>,
}

impl Default for ProgressEcho {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressEcho {
    pub fn new() -> Self {
        Self {
            mode: EchoMode::Line,
            pending: Vec::new(),
        }
    }

    /// Feed a chunk of raw worker output through the state machine.
    pub fn feed(&mut self, chunk: &[u8], sink: &mut impl EchoSink) {
        for &byte in chunk {
            match self.mode {
                EchoMode::Line => {
                    if byte == b'\n' {
                        let line = String::from_utf8_lossy(&self.pending).into_owned();
                        sink.line(&line);
                        self.pending.clear();
                        if line == CHAR_MODE_TRIGGER {
                            self.mode = EchoMode::Char;
                        }
                    } else {
                        self.pending.push(byte);
                    }
                }
                EchoMode::Char => {
                    sink.byte(byte);
                    if byte == b'\n' {
                        self.mode = EchoMode::Line;
                    }
                }
            }
        }
    }

    /// Flush a trailing unterminated line at end of stream.
    pub fn finish(&mut self, sink: &mut impl EchoSink) {
        if !self.pending.is_empty() {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            sink.line(&line);
            self.pending.clear();
        }
        self.mode = EchoMode::Line;
    }
}
