// Destination layout (DEST_CAPACITY = 10):
// [payload: up to 9 bytes][terminator: 0u8][zero fill]

use std::io::{self, BufRead, Read, Write};

use log::{debug, warn};

use crate::error::DemoError;

/// Capacity of the demo's destination buffer, terminator included.
pub const DEST_CAPACITY: usize = 10;

/// Size of the console capture buffer in the vulnerable program.
pub const INPUT_CAPACITY: usize = 100;

/// Fixed-capacity, always-terminated byte buffer.
///
/// The only way to write into it is [`FixedBuffer::copy_from`], which
/// truncates to `N - 1` payload bytes and terminates, so an out-of-bounds
/// write cannot be expressed.
#[derive(Clone, PartialEq, Eq)]
pub struct FixedBuffer<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> FixedBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "FixedBuffer needs room for the terminator");

    pub fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self { data: [0u8; N] }
    }

    /// Largest payload the buffer can hold.
    pub const fn max_payload(&self) -> usize {
        N - 1
    }

    /// Copies `src` up to its first NUL or `N - 1` bytes, whichever comes
    /// first, then zero-fills the rest. Returns the number of bytes copied.
    pub fn copy_from(&mut self, src: &[u8]) -> usize {
        let limit = src.len().min(N - 1);
        let copied = src[..limit]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(limit);

        self.data[..copied].copy_from_slice(&src[..copied]);
        self.data[copied..].fill(0);
        copied
    }

    /// Payload bytes, up to (not including) the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.data.iter().position(|&b| b == 0).unwrap_or(N - 1);
        &self.data[..end]
    }

    pub fn raw(&self) -> &[u8; N] {
        &self.data
    }
}

impl<const N: usize> Default for FixedBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for FixedBuffer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedBuffer")
            .field("capacity", &N)
            .field("payload", &String::from_utf8_lossy(self.as_bytes()))
            .finish()
    }
}

/// Copies `input` into a fresh demo-sized buffer.
pub fn bounded_copy(input: &[u8]) -> FixedBuffer<DEST_CAPACITY> {
    let mut buffer = FixedBuffer::new();
    let copied = buffer.copy_from(input);
    if copied < input.len() {
        debug!("truncated {} input bytes to {}", input.len(), copied);
    }
    buffer
}

/// Reads one whitespace-delimited token. EOF before any token yields an
/// empty token.
pub fn read_token<R: BufRead>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut token = Vec::new();
    for byte in reader.by_ref().bytes() {
        let byte = byte?;
        if byte.is_ascii_whitespace() {
            if token.is_empty() {
                continue;
            }
            break;
        }
        token.push(byte);
    }
    Ok(token)
}

pub fn run_bounded_copy<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(), DemoError> {
    write!(writer, "Enter input: ")?;
    writer.flush()?;

    let token = read_token(reader)?;
    // The capture side is left unbounded on purpose; only report it.
    if token.len() >= INPUT_CAPACITY {
        warn!(
            "captured {} bytes, more than the {}-byte capture buffer would hold",
            token.len(),
            INPUT_CAPACITY
        );
    }

    let buffer = bounded_copy(&token);
    writer.write_all(b"Buffer content: ")?;
    writer.write_all(buffer.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn short_input_is_unchanged() {
        assert_eq!(bounded_copy(b"hello").as_bytes(), b"hello");
        assert_eq!(bounded_copy(b"").as_bytes(), b"");
        assert_eq!(bounded_copy(b"123456789").as_bytes(), b"123456789");
    }

    #[test]
    fn long_input_is_truncated_to_nine_bytes() {
        let buffer = bounded_copy(b"ThisStringIsDefinitelyLongerThanTenChars");
        assert_eq!(buffer.as_bytes(), b"ThisStrin");
        assert_eq!(buffer.raw()[DEST_CAPACITY - 1], 0);

        let buffer = bounded_copy(b"0123456789");
        assert_eq!(buffer.as_bytes(), b"012345678");
    }

    #[test]
    fn terminator_holds_for_every_length() {
        for len in 0..=4096usize {
            let input: Vec<u8> = (0..len).map(|i| (i % 250) as u8 + 1).collect();
            let buffer = bounded_copy(&input);

            let expected = len.min(DEST_CAPACITY - 1);
            assert_eq!(buffer.as_bytes(), &input[..expected], "len {}", len);
            assert_eq!(buffer.raw().len(), DEST_CAPACITY);
            assert_eq!(buffer.raw()[DEST_CAPACITY - 1], 0, "len {}", len);
            assert!(buffer.raw()[expected..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn embedded_nul_stops_the_copy() {
        let mut buffer = FixedBuffer::<DEST_CAPACITY>::new();
        assert_eq!(buffer.copy_from(b"abc\0def"), 3);
        assert_eq!(buffer.as_bytes(), b"abc");
        assert_eq!(buffer.raw(), &[b'a', b'b', b'c', 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn reuse_clears_previous_payload() {
        let mut buffer = FixedBuffer::<4>::new();
        buffer.copy_from(b"xyzw");
        assert_eq!(buffer.as_bytes(), b"xyz");
        buffer.copy_from(b"a");
        assert_eq!(buffer.raw(), &[b'a', 0, 0, 0]);
        assert_eq!(buffer.max_payload(), 3);
    }

    #[test]
    fn single_byte_buffer_holds_only_terminator() {
        let mut buffer = FixedBuffer::<1>::new();
        assert_eq!(buffer.copy_from(b"anything"), 0);
        assert_eq!(buffer.as_bytes(), b"");
        assert_eq!(buffer.raw(), &[0]);
    }

    #[test]
    fn read_token_skips_whitespace_and_stops_at_delimiter() {
        let mut input = Cursor::new(&b"  \n\thello world\n"[..]);
        assert_eq!(read_token(&mut input).unwrap(), b"hello");
        assert_eq!(read_token(&mut input).unwrap(), b"world");
        assert_eq!(read_token(&mut input).unwrap(), b"");
    }

    #[test]
    fn run_prints_prompt_and_truncated_content() {
        let mut input = Cursor::new(&b"ThisStringIsDefinitelyLongerThanTenChars\n"[..]);
        let mut output = Vec::new();
        run_bounded_copy(&mut input, &mut output).unwrap();
        assert_eq!(output, b"Enter input: Buffer content: ThisStrin\n");
    }

    #[test]
    fn run_accepts_oversized_capture() {
        let long = "x".repeat(INPUT_CAPACITY * 3);
        let mut input = Cursor::new(long.into_bytes());
        let mut output = Vec::new();
        run_bounded_copy(&mut input, &mut output).unwrap();
        assert_eq!(output, b"Enter input: Buffer content: xxxxxxxxx\n");
    }
}
