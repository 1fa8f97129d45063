//! Length-prefixed message framing: `[u32 big-endian length][payload]`.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Width of the length prefix in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Initial receive buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    Oversized { len: usize, max: usize },
    #[error("payload of {0} bytes does not fit a 32-bit length prefix")]
    PayloadTooLarge(usize),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Reads frames off a byte stream into a reusable buffer.
/// The buffer grows to the largest declared frame and never shrinks.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buf: Vec<u8>,
    max_frame_len: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_BUFFER_SIZE, usize::MAX)
    }

    pub fn with_capacity(reader: R, capacity: usize, max_frame_len: usize) -> Self {
        Self {
            reader,
            buf: vec![0u8; capacity],
            max_frame_len,
        }
    }

    /// Current receive buffer size.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Read exactly one frame and return its payload.
    /// A short read at any point means the peer went away.
    pub async fn read_frame(&mut self) -> Result<&[u8], FrameError> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        read_exact_or_closed(&mut self.reader, &mut prefix).await?;

        let len = u32::from_be_bytes(prefix) as usize;
        if len > self.max_frame_len {
            return Err(FrameError::Oversized {
                len,
                max: self.max_frame_len,
            });
        }
        if len > self.buf.len() {
            self.buf.resize(len, 0);
        }

        read_exact_or_closed(&mut self.reader, &mut self.buf[..len]).await?;
        Ok(&self.buf[..len])
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

async fn read_exact_or_closed<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), FrameError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(FrameError::Closed),
        Err(e) => Err(FrameError::Io(e)),
    }
}

/// Prefix `payload` with its length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Write one frame with a single `write_all`, so prefix and payload leave together.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), FrameError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
