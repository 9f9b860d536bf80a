//! Framing of the raw input stream into command lines.

pub const BACKSPACE: u8 = 0x08;
pub const DELETE: u8 = 0x7F;

/// What a single input byte did to the line buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Byte stored; the caller may echo it.
    Appended(u8),
    /// Last byte removed; the caller may echo an erase sequence.
    Erased,
    /// Backspace on an empty buffer.
    Ignored,
    /// Buffer full, byte discarded.
    Dropped,
    /// CR or LF. Carries the finished line unless the buffer was empty.
    Terminated(Option<String>),
}

/// Bounded line buffer with destructive backspace.
///
/// At most `capacity - 1` bytes are held, leaving room for a terminator the
/// way a fixed C buffer would.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    buf: Vec<u8>,
    capacity: usize,
}

impl LineAssembler {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(crate::config::MIN_LINE_CAPACITY);
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn feed(&mut self, byte: u8) -> LineEvent {
        match byte {
            b'\r' | b'\n' => {
                if self.buf.is_empty() {
                    LineEvent::Terminated(None)
                } else {
                    let line = String::from_utf8_lossy(&self.buf).into_owned();
                    self.buf.clear();
                    LineEvent::Terminated(Some(line))
                }
            }
            BACKSPACE | DELETE => match self.buf.pop() {
                Some(_) => LineEvent::Erased,
                None => LineEvent::Ignored,
            },
            _ if self.buf.len() < self.capacity - 1 => {
                self.buf.push(byte);
                LineEvent::Appended(byte)
            }
            _ => LineEvent::Dropped,
        }
    }

    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_str(line: &mut LineAssembler, s: &str) -> Vec<LineEvent> {
        s.bytes().map(|b| line.feed(b)).collect()
    }

    #[test]
    fn assembles_line_on_cr() {
        let mut line = LineAssembler::new(64);
        let events = feed_str(&mut line, "S R 1000\r");
        assert_eq!(
            events.last(),
            Some(&LineEvent::Terminated(Some("S R 1000".to_string())))
        );
        assert!(line.is_empty());
    }

    #[test]
    fn lf_terminates_too() {
        let mut line = LineAssembler::new(64);
        feed_str(&mut line, "HELP");
        assert_eq!(line.feed(b'\n'), LineEvent::Terminated(Some("HELP".into())));
    }

    #[test]
    fn empty_line_emits_nothing() {
        let mut line = LineAssembler::new(64);
        assert_eq!(line.feed(b'\r'), LineEvent::Terminated(None));
        assert_eq!(line.feed(b'\n'), LineEvent::Terminated(None));
    }

    #[test]
    fn backspace_and_delete_erase() {
        let mut line = LineAssembler::new(64);
        feed_str(&mut line, "S RX");
        assert_eq!(line.feed(BACKSPACE), LineEvent::Erased);
        feed_str(&mut line, " 10Z");
        assert_eq!(line.feed(DELETE), LineEvent::Erased);
        feed_str(&mut line, "00");
        assert_eq!(line.feed(b'\r'), LineEvent::Terminated(Some("S R 1000".into())));
        assert_eq!(line.feed(BACKSPACE), LineEvent::Ignored);
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut line = LineAssembler::new(8);
        let events = feed_str(&mut line, "ABCDEFGHIJKLMNOP");
        assert_eq!(line.len(), 7);
        assert_eq!(line.pending(), b"ABCDEFG");
        assert!(events[7..].iter().all(|e| *e == LineEvent::Dropped));

        // room frees up again after an erase
        assert_eq!(line.feed(BACKSPACE), LineEvent::Erased);
        assert_eq!(line.feed(b'Z'), LineEvent::Appended(b'Z'));
        assert_eq!(line.feed(b'\r'), LineEvent::Terminated(Some("ABCDEFZ".into())));
    }

    #[test]
    fn tiny_capacity_is_raised() {
        let mut line = LineAssembler::new(0);
        assert_eq!(line.capacity(), 2);
        assert_eq!(line.feed(b'A'), LineEvent::Appended(b'A'));
        assert_eq!(line.feed(b'B'), LineEvent::Dropped);
    }
}
