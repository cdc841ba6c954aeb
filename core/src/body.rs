/*
 * body.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Corriere, a portable HTTP client library.
 *
 * Corriere is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Corriere is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Corriere.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request and response bodies over asynchronous byte sources. Reads are
//! sequential and observe cancellation at every await; closing a body
//! releases its transport resource exactly once.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Error;
use crate::media_type::MediaType;

/// Default chunk size for read loops.
pub(crate) const READ_CHUNK: usize = 8 * 1024;

/// An asynchronous byte source. Reads append to the sink and return the
/// number of bytes read; 0 means exhausted.
#[async_trait]
pub trait AsyncSource: Send {
    async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> io::Result<usize>;

    /// Release underlying resources. Idempotent; further reads fail.
    fn close(&mut self) {}
}

/// Source over an in-memory buffer.
pub struct BufferSource {
    data: Bytes,
    pos: usize,
    closed: bool,
}

impl BufferSource {
    pub fn new(data: Bytes) -> BufferSource {
        BufferSource { data, pos: 0, closed: false }
    }
}

#[async_trait]
impl AsyncSource for BufferSource {
    async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "source is closed"));
        }
        let available = self.data.len() - self.pos;
        let n = available.min(byte_count);
        sink.extend_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Source over any tokio `AsyncRead`.
pub struct ReaderSource<R> {
    reader: Option<R>,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    pub fn new(reader: R) -> ReaderSource<R> {
        ReaderSource { reader: Some(reader) }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> AsyncSource for ReaderSource<R> {
    async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> io::Result<usize> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "source is closed"))?;
        let mut limited = sink.limit(byte_count);
        reader.read_buf(&mut limited).await
    }

    fn close(&mut self) {
        self.reader = None;
    }
}

/// Abstract file system, used only by file-backed request bodies.
#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn len(&self, path: &Path) -> io::Result<u64>;
    async fn source(&self, path: &Path) -> io::Result<Box<dyn AsyncSource>>;
}

/// File system backed by tokio's fs.
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn source(&self, path: &Path) -> io::Result<Box<dyn AsyncSource>> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Box::new(ReaderSource::new(file)))
    }
}

/// A request body: a capability set over {content type, content length,
/// one-shot-ness, opening an async source}.
pub trait RequestBody: Send + Sync {
    fn content_type(&self) -> Option<MediaType> {
        None
    }

    /// Byte length, or -1 when unknown (sent chunked).
    fn content_length(&self) -> i64 {
        -1
    }

    /// One-shot bodies may be transmitted at most once; redirects that
    /// would retransmit them are refused.
    fn is_one_shot(&self) -> bool {
        false
    }

    fn open_read(&self) -> Result<Box<dyn AsyncSource>, Error>;
}

/// Body over owned bytes. Replayable (not one-shot).
pub struct BytesRequestBody {
    content: Bytes,
    content_type: Option<MediaType>,
}

impl BytesRequestBody {
    pub fn new(content: impl Into<Bytes>, content_type: Option<MediaType>) -> BytesRequestBody {
        BytesRequestBody { content: content.into(), content_type }
    }

    pub fn from_text(text: &str, content_type: Option<MediaType>) -> BytesRequestBody {
        BytesRequestBody::new(Bytes::copy_from_slice(text.as_bytes()), content_type)
    }
}

impl RequestBody for BytesRequestBody {
    fn content_type(&self) -> Option<MediaType> {
        self.content_type.clone()
    }

    fn content_length(&self) -> i64 {
        self.content.len() as i64
    }

    fn open_read(&self) -> Result<Box<dyn AsyncSource>, Error> {
        Ok(Box::new(BufferSource::new(self.content.clone())))
    }
}

/// One-shot body around an externally produced source. The source is
/// surrendered on first open; a second open fails.
pub struct StreamingRequestBody {
    source: Mutex<Option<Box<dyn AsyncSource>>>,
    content_type: Option<MediaType>,
    content_length: i64,
    opened: AtomicBool,
}

impl StreamingRequestBody {
    pub fn new(
        source: Box<dyn AsyncSource>,
        content_type: Option<MediaType>,
        content_length: i64,
    ) -> StreamingRequestBody {
        StreamingRequestBody {
            source: Mutex::new(Some(source)),
            content_type,
            content_length,
            opened: AtomicBool::new(false),
        }
    }
}

impl RequestBody for StreamingRequestBody {
    fn content_type(&self) -> Option<MediaType> {
        self.content_type.clone()
    }

    fn content_length(&self) -> i64 {
        self.content_length
    }

    fn is_one_shot(&self) -> bool {
        true
    }

    fn open_read(&self) -> Result<Box<dyn AsyncSource>, Error> {
        if self.opened.swap(true, Ordering::SeqCst) {
            return Err(Error::BodyAlreadyRead);
        }
        self.source
            .lock()
            .unwrap()
            .take()
            .ok_or(Error::BodyAlreadyRead)
    }
}

/// Body streamed from a file through an abstract [`FileSystem`]. The
/// length is captured at construction.
pub struct FileRequestBody {
    file_system: Arc<dyn FileSystem>,
    path: PathBuf,
    content_type: Option<MediaType>,
    content_length: i64,
}

impl FileRequestBody {
    pub async fn create(
        file_system: Arc<dyn FileSystem>,
        path: impl Into<PathBuf>,
        content_type: Option<MediaType>,
    ) -> io::Result<FileRequestBody> {
        let path = path.into();
        let content_length = file_system.len(&path).await? as i64;
        Ok(FileRequestBody { file_system, path, content_type, content_length })
    }
}

impl RequestBody for FileRequestBody {
    fn content_type(&self) -> Option<MediaType> {
        self.content_type.clone()
    }

    fn content_length(&self) -> i64 {
        self.content_length
    }

    fn open_read(&self) -> Result<Box<dyn AsyncSource>, Error> {
        Ok(Box::new(LazyFileSource {
            file_system: self.file_system.clone(),
            path: self.path.clone(),
            open: None,
            closed: false,
        }))
    }
}

/// Defers the file open to the first read so `open_read` stays synchronous.
struct LazyFileSource {
    file_system: Arc<dyn FileSystem>,
    path: PathBuf,
    open: Option<Box<dyn AsyncSource>>,
    closed: bool,
}

#[async_trait]
impl AsyncSource for LazyFileSource {
    async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "source is closed"));
        }
        if self.open.is_none() {
            self.open = Some(self.file_system.source(&self.path).await?);
        }
        self.open.as_mut().unwrap().read(sink, byte_count).await
    }

    fn close(&mut self) {
        self.closed = true;
        if let Some(mut source) = self.open.take() {
            source.close();
        }
    }
}

/// A one-shot streaming response body owning a transport resource.
pub struct ResponseBody {
    /// None for the body-stripped placeholder on linked responses.
    source: Option<Box<dyn AsyncSource>>,
    content_type: Option<MediaType>,
    content_length: i64,
    closed: bool,
    stripped: bool,
}

impl ResponseBody {
    pub fn new(
        source: Box<dyn AsyncSource>,
        content_type: Option<MediaType>,
        content_length: i64,
    ) -> ResponseBody {
        ResponseBody {
            source: Some(source),
            content_type,
            content_length,
            closed: false,
            stripped: false,
        }
    }

    /// A readable empty body.
    pub fn empty() -> ResponseBody {
        ResponseBody::new(Box::new(BufferSource::new(Bytes::new())), None, 0)
    }

    /// Body over owned bytes, mainly for tests and synthetic responses.
    pub fn from_bytes(content: impl Into<Bytes>, content_type: Option<MediaType>) -> ResponseBody {
        let content = content.into();
        let len = content.len() as i64;
        ResponseBody::new(Box::new(BufferSource::new(content)), content_type, len)
    }

    /// Placeholder that reports type and length but refuses reads. Used
    /// for the network/cache/prior responses linked from a final response.
    pub fn unreadable(content_type: Option<MediaType>, content_length: i64) -> ResponseBody {
        ResponseBody {
            source: None,
            content_type,
            content_length,
            closed: false,
            stripped: true,
        }
    }

    /// True for the unreadable placeholder.
    pub(crate) fn is_stripped(&self) -> bool {
        self.stripped
    }

    pub fn content_type(&self) -> Option<&MediaType> {
        self.content_type.as_ref()
    }

    /// Byte length, or -1 when unknown.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    /// Read up to `byte_count` bytes into `sink`; Ok(0) is EOF.
    pub async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> Result<usize, Error> {
        if self.closed {
            return Err(Error::ResponseBodyClosed);
        }
        match &mut self.source {
            Some(source) => Ok(source.read(sink, byte_count).await?),
            None => Err(Error::UnreadableResponseBody),
        }
    }

    /// Read the remaining body to completion, close, and return the bytes.
    /// Fails when a declared Content-Length disagrees with what streamed.
    pub async fn bytes(&mut self) -> Result<Bytes, Error> {
        let mut buffer = BytesMut::new();
        loop {
            match self.read(&mut buffer, READ_CHUNK).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
        self.close();
        if self.content_length >= 0 && self.content_length != buffer.len() as i64 {
            return Err(Error::ContentLengthMismatch {
                expected: self.content_length,
                actual: buffer.len() as i64,
            });
        }
        Ok(buffer.freeze())
    }

    /// Read the remaining body as text. Charsets other than UTF-8 decode
    /// lossily.
    pub async fn text(&mut self) -> Result<String, Error> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Release the underlying resource. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut source) = self.source.take() {
            source.close();
        }
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        self.close();
    }
}
