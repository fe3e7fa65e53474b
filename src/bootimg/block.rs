//! Block-level primitives: chunked copy, alignment and image appending.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

use super::BLOCK_SIZE;

/// Placement of one appended image, in blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageExtent {
    /// Index of the first block.
    pub offset: u64,
    /// Number of blocks the image occupies, padding included.
    pub len: u64,
}

impl ImageExtent {
    /// First block past the end of the image.
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }
}

/// Round `pos` up to the next block boundary.
pub fn round_up(pos: u64) -> u64 {
    (pos + BLOCK_SIZE - 1) & !(BLOCK_SIZE - 1)
}

/// Copy everything left in `input` to `out`, one block-sized read at a time.
///
/// Returns the number of bytes transferred. Neither stream is closed.
pub fn copy_data<W: Write + ?Sized, R: Read + ?Sized>(out: &mut W, input: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; BLOCK_SIZE as usize];
    let mut copied = 0u64;

    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.write_all(&buf[..n])?;
        copied += n as u64;
    }

    Ok(copied)
}

/// Seek `out` forward to the next block boundary and return the new position.
///
/// Only the position moves. Bytes already present beyond it are left alone,
/// and a file is not extended until something is written past its end.
pub fn align_offset<S: Seek + ?Sized>(out: &mut S) -> io::Result<u64> {
    let pos = out.stream_position()?;
    out.seek(SeekFrom::Start(round_up(pos)))
}

/// Write `input` at the next block boundary of `out` and report where it landed.
pub fn append_image<W, R>(out: &mut W, input: &mut R) -> io::Result<ImageExtent>
where
    W: Write + Seek + ?Sized,
    R: Read + ?Sized,
{
    let offset = align_offset(out)?;
    copy_data(out, input)?;
    let length = align_offset(out)? - offset;

    assert!(offset % BLOCK_SIZE == 0, "image offset {offset} is not block aligned");
    assert!(length % BLOCK_SIZE == 0, "image length {length} is not block aligned");

    Ok(ImageExtent {
        offset: offset / BLOCK_SIZE,
        len: length / BLOCK_SIZE,
    })
}

/// Zero-fill `out` so that it is at least `len` bytes long.
///
/// Leaves the stream positioned at its (possibly new) end.
pub fn pad_to_len<W: Write + Seek + ?Sized>(out: &mut W, len: u64) -> io::Result<u64> {
    let end = out.seek(SeekFrom::End(0))?;
    if end < len {
        io::copy(&mut io::repeat(0).take(len - end), out)?;
    }
    out.stream_position()
}
