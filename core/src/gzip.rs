/*
 * gzip.rs
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

//! Streaming gzip transform for request bodies: identity bytes in, gzip
//! frames out, with bounded staging so large bodies never sit in memory.

use std::io::{self, Write};
use std::sync::Arc;

use bytes::buf::Writer;
use bytes::{BufMut, BytesMut};
use flate2::write::GzEncoder;
use flate2::Compression;

use async_trait::async_trait;

use crate::body::{AsyncSource, RequestBody};
use crate::error::Error;
use crate::media_type::MediaType;

/// Reads from the delegate come in chunks of at most this size.
const STAGING_LIMIT: usize = 8 * 1024;
/// Target amount of compressed bytes to buffer ahead of the caller.
const PREBUFFER_TARGET: usize = 16 * 1024;

/// Async source producing the gzip encoding of a delegate source.
pub struct GzipSource {
    delegate: Box<dyn AsyncSource>,
    /// Present until the delegate reaches EOF and the trailer is flushed.
    encoder: Option<GzEncoder<Writer<BytesMut>>>,
    /// Compressed bytes ready to hand to the caller.
    compressed: BytesMut,
    staging: BytesMut,
    delegate_exhausted: bool,
    closed: bool,
}

impl GzipSource {
    pub fn new(delegate: Box<dyn AsyncSource>) -> GzipSource {
        GzipSource {
            delegate,
            encoder: Some(GzEncoder::new(BytesMut::new().writer(), Compression::default())),
            compressed: BytesMut::new(),
            staging: BytesMut::with_capacity(STAGING_LIMIT),
            delegate_exhausted: false,
            closed: false,
        }
    }

    /// Move whatever the encoder has produced into the ready buffer.
    fn drain_encoder(&mut self) {
        if let Some(encoder) = &mut self.encoder {
            let inner = encoder.get_mut().get_mut();
            if !inner.is_empty() {
                self.compressed.extend_from_slice(inner);
                inner.clear();
            }
        }
    }

    /// Close the gzip stream so the trailer lands in the ready buffer.
    fn finish_encoder(&mut self) -> io::Result<()> {
        if let Some(encoder) = self.encoder.take() {
            let writer = encoder.finish()?;
            let inner = writer.into_inner();
            self.compressed.extend_from_slice(&inner);
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncSource for GzipSource {
    async fn read(&mut self, sink: &mut BytesMut, byte_count: usize) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "source is closed"));
        }

        // Pull from the delegate until enough compressed bytes are ready
        // or the input is exhausted.
        let target = byte_count.max(PREBUFFER_TARGET);
        while self.compressed.len() < target && !self.delegate_exhausted {
            self.staging.clear();
            let read = self.delegate.read(&mut self.staging, STAGING_LIMIT).await?;
            if read == 0 {
                self.delegate_exhausted = true;
                self.finish_encoder()?;
                break;
            }
            let encoder = self.encoder.as_mut().expect("encoder alive before EOF");
            encoder.write_all(&self.staging)?;
            self.drain_encoder();
        }

        if self.compressed.is_empty() {
            return Ok(0); // delegate exhausted and trailer drained
        }
        let n = byte_count.min(self.compressed.len());
        sink.extend_from_slice(&self.compressed.split_to(n));
        Ok(n)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.delegate.close();
        self.encoder = None;
    }
}

/// Wraps a request body so it is transmitted gzip-encoded. The compressed
/// length is unknown up front, so the body is sent chunked; one-shot-ness
/// follows the delegate. Callers set `Content-Encoding: gzip` alongside.
pub struct GzipRequestBody {
    delegate: Arc<dyn RequestBody>,
}

impl GzipRequestBody {
    pub fn new(delegate: Arc<dyn RequestBody>) -> GzipRequestBody {
        GzipRequestBody { delegate }
    }
}

impl RequestBody for GzipRequestBody {
    fn content_type(&self) -> Option<MediaType> {
        self.delegate.content_type()
    }

    fn content_length(&self) -> i64 {
        -1
    }

    fn is_one_shot(&self) -> bool {
        self.delegate.is_one_shot()
    }

    fn open_read(&self) -> Result<Box<dyn AsyncSource>, Error> {
        Ok(Box::new(GzipSource::new(self.delegate.open_read()?)))
    }
}
