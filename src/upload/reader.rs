use super::pool::{PartPool, PooledBuf};
use crate::error::{Error, Result};

use bytes::Bytes;
use futures::future::BoxFuture;
use std::fmt::{self, Debug, Formatter};
use std::io::Result as IoResult;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt as _};

/// A byte source supporting positioned reads and a length query.
///
/// Bodies with this capability are cut into windows without any buffering
/// on the producer side; each worker materializes its own window with one
/// positioned read, so windows can be read concurrently.
pub trait RandomAccessBody: Send + Sync {
    /// Total length of the body in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read up to `len` bytes starting at `offset`.
    fn read_range(&self, offset: u64, len: usize) -> BoxFuture<'_, IoResult<Bytes>>;
}

impl RandomAccessBody for Bytes {
    fn len(&self) -> u64 {
        Bytes::len(self) as u64
    }

    fn read_range(&self, offset: u64, len: usize) -> BoxFuture<'_, IoResult<Bytes>> {
        let start = (offset as usize).min(Bytes::len(self));
        let end = (start + len).min(Bytes::len(self));
        let window = self.slice(start..end);
        Box::pin(futures::future::ready(Ok(window)))
    }
}

/// Customizes how the window of a [`RandomAccessBody`] is materialized
/// right before upload.
///
/// When no provider is configured, a window is a direct `read_range` call.
/// A provider can interpose aligned reads, caching, or its own buffering.
pub trait BufferProvider: Send + Sync {
    fn get_window<'a>(
        &'a self,
        body: &'a dyn RandomAccessBody,
        offset: u64,
        len: usize,
    ) -> BoxFuture<'a, IoResult<Bytes>>;
}

/// The input stream of an upload.
///
/// Two capability sets are supported: plain forward reads, and positioned
/// reads with a known total length. The uploader picks its chunking
/// strategy from the variant: streaming bodies are buffered through the
/// part pool, seekable bodies are windowed with no extra copies.
pub enum UploadBody {
    /// Forward reads only; the total length is unknown.
    Streaming(Box<dyn AsyncRead + Send + Unpin>),
    /// Positioned reads and a known total length.
    Seekable(Arc<dyn RandomAccessBody>),
}

impl UploadBody {
    /// Upload from a plain byte stream of unknown length.
    pub fn streaming<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::Streaming(Box::new(reader))
    }

    /// Upload from a random access body of known length.
    pub fn seekable<B>(body: B) -> Self
    where
        B: RandomAccessBody + 'static,
    {
        Self::Seekable(Arc::new(body))
    }

    pub(crate) fn total_size(&self) -> Option<u64> {
        match self {
            Self::Streaming(_) => None,
            Self::Seekable(body) => Some(body.len()),
        }
    }
}

impl Debug for UploadBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Streaming(_) => f.debug_tuple("Streaming").field(&"AsyncRead").finish(),
            Self::Seekable(body) => f.debug_tuple("Seekable").field(&body.len()).finish(),
        }
    }
}

impl From<Bytes> for UploadBody {
    fn from(value: Bytes) -> Self {
        Self::seekable(value)
    }
}

impl From<Vec<u8>> for UploadBody {
    fn from(value: Vec<u8>) -> Self {
        Bytes::from(value).into()
    }
}

impl From<&'static [u8]> for UploadBody {
    fn from(value: &'static [u8]) -> Self {
        Bytes::from_static(value).into()
    }
}

impl From<String> for UploadBody {
    fn from(value: String) -> Self {
        Bytes::from(value).into()
    }
}

/// The bytes of one part, in whichever form the body's capabilities allow.
pub(crate) enum ChunkBody {
    /// A filled pool buffer. The frozen view is dropped before the guard,
    /// which lets the pool recycle the allocation.
    Buffered { data: Bytes, _guard: PooledBuf },
    /// A window over a random access body, read by the worker that uploads
    /// or verifies it.
    Window {
        source: Arc<dyn RandomAccessBody>,
        offset: u64,
        len: usize,
    },
}

impl ChunkBody {
    pub(crate) async fn bytes(&self, provider: Option<&dyn BufferProvider>) -> IoResult<Bytes> {
        match self {
            Self::Buffered { data, .. } => Ok(data.clone()),
            Self::Window {
                source,
                offset,
                len,
            } => match provider {
                Some(provider) => provider.get_window(source.as_ref(), *offset, *len).await,
                None => source.read_range(*offset, *len).await,
            },
        }
    }
}

/// One chunk cut from the input, as handed to the upload path.
pub(crate) struct PartData {
    pub(crate) body: ChunkBody,
    pub(crate) len: usize,
    pub(crate) eof: bool,
}

/// Produces successive parts from the input stream.
///
/// Only the producer task calls `next`, so the position needs no locking.
pub(crate) struct PartReader {
    body: UploadBody,
    part_size: usize,
    position: u64,
    pool: Arc<PartPool>,
}

impl PartReader {
    pub(crate) fn new(body: UploadBody, part_size: usize, pool: Arc<PartPool>) -> Self {
        Self {
            body,
            part_size,
            position: 0,
            pool,
        }
    }

    /// Cut the next part. `eof` is set on the part that exhausts the input;
    /// for streaming bodies that is only known once the source reports end
    /// of stream, so a stream whose length is an exact multiple of the part
    /// size yields one final empty part.
    pub(crate) async fn next(&mut self) -> Result<PartData> {
        match &mut self.body {
            UploadBody::Seekable(source) => {
                let bytes_left = source.len().saturating_sub(self.position);
                let (len, eof) = if bytes_left <= self.part_size as u64 {
                    (bytes_left as usize, true)
                } else {
                    (self.part_size, false)
                };

                let body = ChunkBody::Window {
                    source: Arc::clone(source),
                    offset: self.position,
                    len,
                };
                self.position += len as u64;

                Ok(PartData { body, len, eof })
            }
            UploadBody::Streaming(reader) => {
                let mut guard = self.pool.get().await?;
                let buf = guard.buf_mut();
                buf.resize(self.pool.slice_size(), 0);

                let (len, eof) = read_fill(reader, buf).await.map_err(Error::from_dyn)?;
                buf.truncate(len);
                let data = guard.freeze();
                self.position += len as u64;

                Ok(PartData {
                    body: ChunkBody::Buffered {
                        data,
                        _guard: guard,
                    },
                    len,
                    eof,
                })
            }
        }
    }
}

/// Read until `buf` is full or the source reports end of stream. Returns
/// the filled length and whether end of stream was hit.
async fn read_fill<R>(reader: &mut R, buf: &mut [u8]) -> IoResult<(usize, bool)>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return Ok((filled, true));
        }
        filled += n;
    }
    Ok((filled, false))
}
