use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;

use crate::core::UnitProgress;

/// Size of the slices handed to the HTTP body. Smaller slices give smoother
/// progress at the cost of more callbacks.
pub const BODY_SLICE_SIZE: usize = 64 * 1024;

pin_project! {
    /// Reports the cumulative number of bytes yielded by `inner`.
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        progress: UnitProgress,
        bytes_sent: u64,
    }
}

impl<S> ProgressStream<S> {
    pub fn new(inner: S, progress: UnitProgress) -> Self {
        Self {
            inner,
            progress,
            bytes_sent: 0,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = std::io::Result<Bytes>>,
{
    type Item = std::io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        match this.inner.poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                if !chunk.is_empty() {
                    *this.bytes_sent += chunk.len() as u64;
                    this.progress.report(*this.bytes_sent);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            other => other,
        }
    }
}

/// Splits `body` into zero-copy slices of at most `slice_size` bytes.
pub fn sliced(
    body: Bytes,
    slice_size: usize,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
    let slice_size = slice_size.max(1);
    let len = body.len();
    let slices = (0..len).step_by(slice_size).map(move |start| {
        let end = std::cmp::min(start + slice_size, len);
        Ok::<_, std::io::Error>(body.slice(start..end))
    });

    futures::stream::iter(slices)
}
