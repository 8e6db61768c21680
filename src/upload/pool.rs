use crate::error::{ErrorRepr, Result};

use bytes::{Bytes, BytesMut};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// A bounded pool of part-sized byte buffers.
///
/// The pool is what bounds peak memory for sequential inputs: an upload
/// never holds more buffers than the pool's capacity, regardless of object
/// size or how far the input stream can run ahead of the network. `get`
/// blocks until a buffer returns or the upload is canceled.
///
/// Buffers are handed out as [`PooledBuf`] guards; dropping the guard is the
/// one and only release point.
pub(crate) struct PartPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    slice_size: usize,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    state: Mutex<PoolState>,
}

#[derive(Default)]
struct PoolState {
    free: Vec<BytesMut>,
    pending_shrink: usize,
    closed: bool,
}

impl PartPool {
    /// Create a pool of buffers of exactly `slice_size` bytes. Capacity
    /// starts at zero; grow it with [`modify_capacity`](Self::modify_capacity).
    pub(crate) fn new(slice_size: usize, cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                slice_size,
                semaphore: Arc::new(Semaphore::new(0)),
                cancel,
                state: Mutex::new(PoolState::default()),
            }),
        }
    }

    /// The fixed size of the buffers this pool hands out.
    pub(crate) fn slice_size(&self) -> usize {
        self.inner.slice_size
    }

    /// Grow or shrink the pool's capacity.
    ///
    /// Growth is lazy: permits are added now, buffers are allocated on
    /// demand in `get`. A shrink consumes idle capacity immediately and
    /// absorbs the remainder as outstanding buffers return.
    pub(crate) fn modify_capacity(&self, delta: isize) {
        if delta >= 0 {
            self.inner.semaphore.add_permits(delta as usize);
            return;
        }
        for _ in 0..delta.unsigned_abs() {
            match self.inner.semaphore.try_acquire() {
                Ok(permit) => permit.forget(),
                Err(_) => {
                    self.inner.state.lock().unwrap().pending_shrink += 1;
                }
            }
        }
    }

    /// Acquire a buffer, waiting for capacity if every buffer is out.
    pub(crate) async fn get(&self) -> Result<PooledBuf> {
        let permit = tokio::select! {
            biased;
            _ = self.inner.cancel.cancelled() => return Err(ErrorRepr::Canceled.into()),
            permit = self.inner.semaphore.clone().acquire_owned() => {
                permit.map_err(|_| ErrorRepr::Canceled)?
            }
        };

        let recycled = {
            let mut state = self.inner.state.lock().unwrap();
            if state.closed {
                return Err(ErrorRepr::Canceled.into());
            }
            state.free.pop()
        };
        let buf = recycled.unwrap_or_else(|| BytesMut::with_capacity(self.inner.slice_size));

        Ok(PooledBuf {
            frozen: None,
            buf,
            permit: Some(permit),
            inner: Arc::clone(&self.inner),
        })
    }

    /// Refuse further `get`s and drop every held buffer. Idempotent.
    pub(crate) fn close(&self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if state.closed {
                return;
            }
            state.closed = true;
            state.free.clear();
        }
        self.inner.semaphore.close();
    }
}

/// A buffer on loan from a [`PartPool`].
///
/// While filling, the buffer is writable through `buf_mut`. Once the part
/// has been cut, `freeze` converts it into a cheaply cloneable [`Bytes`]
/// view. Dropping the guard returns capacity to the pool; the underlying
/// allocation is recycled when the guard holds the last reference to it.
pub(crate) struct PooledBuf {
    frozen: Option<Bytes>,
    buf: BytesMut,
    permit: Option<OwnedSemaphorePermit>,
    inner: Arc<PoolInner>,
}

impl PooledBuf {
    pub(crate) fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Convert the filled prefix into an immutable view, keeping one
    /// reference here so the allocation can be reclaimed on drop.
    pub(crate) fn freeze(&mut self) -> Bytes {
        let data = std::mem::take(&mut self.buf).freeze();
        self.frozen = Some(data.clone());
        data
    }
}

impl Drop for PooledBuf {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock().unwrap();
        if state.pending_shrink > 0 {
            state.pending_shrink -= 1;
            if let Some(permit) = self.permit.take() {
                permit.forget();
            }
            return;
        }
        if state.closed {
            return;
        }
        let reclaimed = match self.frozen.take() {
            Some(bytes) => bytes.try_into_mut().ok(),
            None => Some(std::mem::take(&mut self.buf)),
        };
        if let Some(mut buf) = reclaimed {
            buf.clear();
            state.free.push(buf);
        }
        // Dropping the permit releases the capacity either way.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    const SIZE: usize = 64;

    fn pool(capacity: isize) -> PartPool {
        let pool = PartPool::new(SIZE, CancellationToken::new());
        pool.modify_capacity(capacity);
        pool
    }

    #[tokio::test]
    async fn get_blocks_at_capacity_until_a_buffer_returns() {
        let pool = pool(2);
        let a = pool.get().await.unwrap();
        let _b = pool.get().await.unwrap();

        let blocked = timeout(Duration::from_millis(20), pool.get()).await;
        assert!(blocked.is_err(), "third get should block at capacity 2");

        drop(a);
        let c = timeout(Duration::from_millis(100), pool.get()).await;
        assert!(c.is_ok_and(|res| res.is_ok()));
    }

    #[tokio::test]
    async fn frozen_buffers_are_recycled() {
        let pool = pool(1);
        let mut buf = pool.get().await.unwrap();
        buf.buf_mut().extend_from_slice(&[7u8; SIZE]);
        let view = buf.freeze();
        drop(view);
        drop(buf);

        let reused = pool.get().await.unwrap();
        assert_eq!(reused.buf.capacity(), SIZE);
        assert!(reused.buf.is_empty());
    }

    #[tokio::test]
    async fn close_refuses_further_gets() {
        let pool = pool(2);
        pool.close();
        pool.close();
        assert!(pool.get().await.is_err());
    }

    #[tokio::test]
    async fn shrink_absorbs_returning_buffers() {
        let pool = pool(2);
        let a = pool.get().await.unwrap();
        let b = pool.get().await.unwrap();

        // Idle capacity is gone, so the shrink waits on a return.
        pool.modify_capacity(-1);
        drop(a);
        drop(b);

        let c = pool.get().await.unwrap();
        let blocked = timeout(Duration::from_millis(20), pool.get()).await;
        assert!(blocked.is_err(), "capacity should have shrunk to 1");
        drop(c);
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_waiting_get() {
        let cancel = CancellationToken::new();
        let pool = PartPool::new(SIZE, cancel.clone());
        pool.modify_capacity(1);
        let _held = pool.get().await.unwrap();

        cancel.cancel();
        let res = pool.get().await;
        assert!(res.is_err());
    }
}
