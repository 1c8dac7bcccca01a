use std::{
    io::{Cursor, Read},
    pin::Pin,
    task::{Context, Poll},
};

use bytes::Bytes;

/// The body of an HTTP request or response.
///
/// Bodies are fully buffered; they implement [`futures::AsyncRead`] so that
/// callers can consume them the same way regardless of the transport.
#[derive(Debug, Default)]
pub struct AsyncBody(Inner);

#[derive(Debug, Default)]
enum Inner {
    #[default]
    Empty,
    Bytes(Cursor<Bytes>),
}

impl AsyncBody {
    pub fn empty() -> Self {
        Self(Inner::Empty)
    }

    pub fn from_bytes(bytes: Bytes) -> Self {
        Self(Inner::Bytes(Cursor::new(bytes)))
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        match &self.0 {
            Inner::Empty => 0,
            Inner::Bytes(cursor) => {
                let position = cursor.position() as usize;
                cursor.get_ref().len().saturating_sub(position)
            }
        }
    }

    /// Consumes the body, returning the bytes that have not been read yet.
    pub fn into_bytes(self) -> Bytes {
        match self.0 {
            Inner::Empty => Bytes::new(),
            Inner::Bytes(cursor) => {
                let position = (cursor.position() as usize).min(cursor.get_ref().len());
                cursor.into_inner().slice(position..)
            }
        }
    }
}

impl From<Bytes> for AsyncBody {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for AsyncBody {
    fn from(body: Vec<u8>) -> Self {
        Self::from_bytes(Bytes::from(body))
    }
}

impl From<String> for AsyncBody {
    fn from(body: String) -> Self {
        Self::from_bytes(Bytes::from(body))
    }
}

impl From<&'static str> for AsyncBody {
    fn from(body: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(body.as_bytes()))
    }
}

impl futures::AsyncRead for AsyncBody {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        match &mut self.get_mut().0 {
            Inner::Empty => Poll::Ready(Ok(0)),
            Inner::Bytes(cursor) => Poll::Ready(cursor.read(buf)),
        }
    }
}
