use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

/// Default read size. Bounds per-worker memory for well-formed inputs; a
/// single line longer than one chunk is still reassembled correctly.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Streams a source as logical lines with 1-based line numbers.
///
/// Reads fixed-size chunks, splits on `\n`, and carries the unterminated
/// suffix of each chunk (the pending tail) into the next read. At end of
/// stream a non-empty tail is emitted as the final line even without a
/// trailing newline. The produced `(line, number)` sequence is identical for
/// every chunk size >= 1, and every source byte lands in exactly one line.
///
/// A read error other than end-of-stream is yielded once as `Err`, after
/// every line completed before the failure, and ends the iteration.
pub struct LineReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pending: Vec<u8>,
    ready: VecDeque<Vec<u8>>,
    line: u64,
    eof: bool,
    failed: bool,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(inner: R, chunk_size: usize) -> Self {
        assert!(chunk_size >= 1, "chunk size must be at least 1 byte");
        Self {
            inner,
            buf: vec![0; chunk_size],
            pending: Vec::new(),
            ready: VecDeque::new(),
            line: 0,
            eof: false,
            failed: false,
        }
    }

    /// Reads chunks until at least one complete line is queued or the stream
    /// ends. On entry `ready` is empty, so any lines queued here all come
    /// from reads that happened before a possible error.
    fn fill(&mut self) -> std::io::Result<()> {
        while !self.eof && self.ready.is_empty() {
            let n = self.inner.read(&mut self.buf)?;
            if n == 0 {
                self.eof = true;
                break;
            }
            self.pending.extend_from_slice(&self.buf[..n]);

            let mut start = 0;
            while let Some(rel) = self.pending[start..].iter().position(|&b| b == b'\n') {
                let end = start + rel;
                self.ready.push_back(self.pending[start..end].to_vec());
                start = end + 1;
            }
            self.pending.drain(..start);
        }
        Ok(())
    }
}

impl<R: Read> Iterator for LineReader<R> {
    type Item = std::io::Result<(Vec<u8>, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(line) = self.ready.pop_front() {
                self.line += 1;
                return Some(Ok((line, self.line)));
            }
            if self.eof {
                if self.pending.is_empty() {
                    return None;
                }
                // Final unterminated line.
                let tail = std::mem::take(&mut self.pending);
                self.line += 1;
                return Some(Ok((tail, self.line)));
            }
            match self.fill() {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
