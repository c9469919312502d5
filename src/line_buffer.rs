use bytes::BytesMut;

/// The full output of one standard stream, split into lines.
///
/// Lines are newline-stripped and kept in the order they were written. `byte_len` is the raw
/// length of everything the stream produced, newlines included, and is what "did the stream
/// say anything at all" checks look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStream {
    pub lines: Vec<String>,
    pub byte_len: usize,
}

impl CapturedStream {
    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }
}

/// Captures an already complete byte sequence.
pub fn capture(raw: &[u8]) -> CapturedStream {
    let mut buffer = LineBuffer::new();
    buffer.extend(raw);
    buffer.finish()
}

/// Incrementally builds a [CapturedStream] from chunks of arbitrary size.
///
/// A line may span any number of chunks. Whatever is left without a closing newline when
/// [LineBuffer::finish] is called becomes the last line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: BytesMut,
    lines: Vec<String>,
    byte_len: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.byte_len += chunk.len();
        let lr = LineReader {
            chunk,
            line_buffer: &mut self.partial,
        };
        for line in lr {
            self.lines.push(String::from_utf8_lossy(&line).into_owned());
        }
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn finish(mut self) -> CapturedStream {
        if !self.partial.is_empty() {
            self.lines
                .push(String::from_utf8_lossy(&self.partial).into_owned());
        }
        CapturedStream {
            lines: self.lines,
            byte_len: self.byte_len,
        }
    }
}

/// Conceptually, this iterator appends the given byte slice to the current line buffer, which may
/// already hold some previously written data.
/// The resulting view of data is split by newlines (`\n`). Every completed line is yielded.
/// The remainder of the chunk, not completed with a newline character, will become the new content
/// of `line_buffer`.
///
/// Bytes are kept raw until a line completes, so a multi-byte character split across two chunks
/// is decoded correctly.
pub(crate) struct LineReader<'c, 'b> {
    chunk: &'c [u8],
    line_buffer: &'b mut BytesMut,
}

impl Iterator for LineReader<'_, '_> {
    type Item = bytes::Bytes;

    fn next(&mut self) -> Option<Self::Item> {
        if self.chunk.is_empty() {
            return None;
        }

        match self.chunk.iter().position(|b| *b == b'\n') {
            None => {
                // No more line breaks - consume the remaining chunk.
                self.line_buffer.extend_from_slice(self.chunk);
                self.chunk = &[];
                None
            }
            Some(pos) => {
                let (until_line_break, rest) = self.chunk.split_at(pos);
                self.line_buffer.extend_from_slice(until_line_break);

                // Skip the newline itself.
                self.chunk = &rest[1..];

                Some(self.line_buffer.split().freeze())
            }
        }
    }
}
