//! Line reader for the producer pipe.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Most bytes kept from a single input line.
pub const MAX_LINE_LEN: usize = crate::frame::MAX_FRAME_LEN;

/// Read one line into `buf`, keeping at most `limit` bytes of it.
///
/// The rest of an over-long line is consumed and discarded so the next call
/// starts on a line boundary. Returns the number of bytes consumed from
/// `reader`, which is 0 only at end of input.
pub async fn read_line_bounded<R>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut consumed = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(consumed);
        }

        let (chunk_len, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (i + 1, true),
            None => (available.len(), false),
        };

        let room = limit.saturating_sub(buf.len());
        buf.extend_from_slice(&available[..chunk_len.min(room)]);

        reader.consume(chunk_len);
        consumed += chunk_len;

        if found_newline {
            return Ok(consumed);
        }
    }
}
