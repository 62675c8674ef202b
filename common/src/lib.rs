#![warn(missing_docs)]

//! `gpmf-common` is a common library shared by the `gpmf` telemetry decoder crates.

#[macro_use]
pub mod macros;

pub mod error;
pub mod parse;
pub mod sync;

use std::future::poll_fn;
use std::io;
use std::io::SeekFrom;
use std::result::Result as StdResult;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::io::BufReader;
use futures_util::{AsyncBufRead, AsyncRead, AsyncSeek, AsyncSeekExt};

//
// public types
//

pub use error::{Error, Report, Result, ResultExt};

/// A pointer to a span in the given input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct InputSpan {
    /// The offset from the beginning of the input where the span begins.
    pub offset: u64,

    /// The length of the span.
    pub len: u64,
}

/// Extensions for [`io::Result`].
pub trait IoResultExt<T> {
    /// Map an [`io::ErrorKind::UnexpectedEof`] error with `fun`, converting any other error with [`From`].
    fn map_eof<E: From<io::Error>, F: FnOnce(io::Error) -> E>(self, fun: F) -> StdResult<T, E>;
}

//
// public functions
//

/// Poll skipping `amount` bytes forward in a seekable [`BufReader`].
///
/// Bytes already buffered are consumed first; only the remainder is seeked over in the underlying reader.
pub fn poll_buf_skip<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    cx: &mut Context<'_>,
    amount: u64,
) -> Poll<io::Result<()>> {
    let buf_len = reader.buffer().len();
    if let Some(skip_amount) = amount.checked_sub(buf_len as u64) {
        if skip_amount != 0 {
            let skip_amount = i64::try_from(skip_amount)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "skip past i64::MAX"))?;
            ready!(reader.as_mut().get_pin_mut().poll_seek(cx, SeekFrom::Current(skip_amount)))?;
        }
    }
    reader.consume(buf_len.min(amount as usize));
    Poll::Ready(Ok(()))
}

/// Skip `amount` bytes forward in a seekable [`BufReader`].
pub async fn buf_skip<R: AsyncRead + AsyncSeek>(mut reader: Pin<&mut BufReader<R>>, amount: u64) -> io::Result<()> {
    poll_fn(|cx| poll_buf_skip(reader.as_mut(), cx, amount)).await
}

/// Seek a [`BufReader`] to the absolute position `pos`, discarding any buffered data.
pub async fn buf_seek<R: AsyncRead + AsyncSeek>(mut reader: Pin<&mut BufReader<R>>, pos: u64) -> io::Result<()> {
    reader.seek(SeekFrom::Start(pos)).await.map(drop)
}

/// Poll the stream position for a seekable [`BufReader`], accounting for buffered data.
pub fn poll_buf_stream_position<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    cx: &mut Context<'_>,
) -> Poll<io::Result<u64>> {
    let stream_pos = ready!(reader.as_mut().get_pin_mut().poll_seek(cx, SeekFrom::Current(0)))?;
    Poll::Ready(Ok(stream_pos.saturating_sub(reader.buffer().len() as u64)))
}

/// Return the stream position for a seekable [`BufReader`], accounting for buffered data.
pub async fn buf_stream_position<R: AsyncRead + AsyncSeek>(mut reader: Pin<&mut BufReader<R>>) -> io::Result<u64> {
    poll_fn(|cx| poll_buf_stream_position(reader.as_mut(), cx)).await
}

/// Poll the total stream length of the reader underlying a [`BufReader`].
///
/// The underlying reader is returned to its original position afterwards, so buffered data stays valid.
pub fn poll_buf_stream_len<R: AsyncRead + AsyncSeek>(
    mut reader: Pin<&mut BufReader<R>>,
    cx: &mut Context<'_>,
) -> Poll<io::Result<u64>> {
    // This is the unstable Seek::stream_len
    let mut inner = reader.as_mut().get_pin_mut();
    let inner_pos = ready!(inner.as_mut().poll_seek(cx, SeekFrom::Current(0)))?;
    let len = ready!(inner.as_mut().poll_seek(cx, SeekFrom::End(0)))?;
    if inner_pos != len {
        ready!(inner.poll_seek(cx, SeekFrom::Start(inner_pos)))?;
    }
    Poll::Ready(Ok(len))
}

/// Return the total stream length of the reader underlying a [`BufReader`].
pub async fn buf_stream_len<R: AsyncRead + AsyncSeek>(mut reader: Pin<&mut BufReader<R>>) -> io::Result<u64> {
    poll_fn(|cx| poll_buf_stream_len(reader.as_mut(), cx)).await
}

//
// IoResultExt impls
//

impl<T> IoResultExt<T> for io::Result<T> {
    fn map_eof<E: From<io::Error>, F: FnOnce(io::Error) -> E>(self, fun: F) -> StdResult<T, E> {
        match self {
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(fun(err)),
            result => result.map_err(E::from),
        }
    }
}

//
// InputSpan impls
//

impl InputSpan {
    /// The offset one past the last byte of the span, or [`None`] on overflow.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.len)
    }
}
