use std::io::{self, BufRead};

const INITIAL_CAPACITY: usize = 128;

/// Reads newline-terminated records from a stream into a reusable buffer.
///
/// The buffer starts at 128 bytes and doubles whenever a record would
/// overflow it; bytes already read are kept across the reallocation.
pub struct LineReader<R> {
	inner: R,
	line: Vec<u8>,
	eof: bool,
}

impl<R: BufRead> LineReader<R> {
	pub fn new(inner: R) -> Self {
		Self {
			inner,
			line: Vec::with_capacity(INITIAL_CAPACITY),
			eof: false,
		}
	}

	/// Returns the next record without its delimiter, or `None` once the
	/// stream is exhausted with no partial record pending.
	pub fn next_record(&mut self) -> io::Result<Option<&[u8]>> {
		self.line.clear();
		while !self.eof {
			let buf = self.inner.fill_buf()?;
			if buf.is_empty() {
				self.eof = true;
				break;
			}
			match buf.iter().position(|&b| b == b'\n') {
				Some(end) => {
					grow_and_push(&mut self.line, &buf[..end]);
					self.inner.consume(end + 1);
					return Ok(Some(&self.line));
				}
				None => {
					let len = buf.len();
					grow_and_push(&mut self.line, &buf[..len]);
					self.inner.consume(len);
				}
			}
		}
		if self.line.is_empty() {
			Ok(None)
		} else {
			Ok(Some(&self.line))
		}
	}

	#[cfg(test)]
	fn capacity(&self) -> usize {
		self.line.capacity()
	}
}

// Keeps one spare slot, doubling until the record fits.
fn grow_and_push(line: &mut Vec<u8>, bytes: &[u8]) {
	let mut cap = line.capacity();
	while line.len() + bytes.len() + 1 > cap {
		cap *= 2;
	}
	if cap > line.capacity() {
		line.reserve_exact(cap - line.len());
	}
	line.extend_from_slice(bytes);
}
