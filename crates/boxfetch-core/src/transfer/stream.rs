//! Blocking streaming GET that hands the body to a sink in fixed-size chunks.

use std::cell::RefCell;
use std::str;
use std::time::Duration;

use crate::error::JobError;
use crate::fetch_head::{parse_headers, ResponseHead};

/// Receiver of a streamed response.
pub(crate) trait ChunkSink {
    /// Called once with the final response headers, before any body chunk.
    fn on_headers(&mut self, head: &ResponseHead) -> Result<(), JobError>;

    /// Called for every `chunk_size` bytes of body (the last chunk may be shorter).
    fn on_chunk(&mut self, chunk: &[u8]) -> Result<(), JobError>;
}

/// Streams `url` into `sink`. A sink error aborts the transfer and is returned as-is.
///
/// Runs in the current thread; call from `spawn_blocking`.
pub(crate) fn stream_to(url: &str, chunk_size: usize, sink: &mut dyn ChunkSink) -> Result<u64, JobError> {
    let chunk_size = chunk_size.max(1);
    let curl_err = |e: curl::Error| JobError::transfer_io("curl", e);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(curl_err)?;
    easy.follow_location(true).map_err(curl_err)?;
    easy.max_redirections(10).map_err(curl_err)?;
    easy.connect_timeout(Duration::from_secs(30)).map_err(curl_err)?;
    easy.low_speed_limit(1024).map_err(curl_err)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(curl_err)?;

    let header_lines = RefCell::new(Vec::<String>::new());
    let mut started = false;
    let mut buffer: Vec<u8> = Vec::with_capacity(chunk_size);
    let mut delivered: u64 = 0;
    let mut failure: Option<JobError> = None;

    let outcome = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.borrow_mut().push(s.trim_end().to_string());
                }
                true
            })
            .map_err(curl_err)?;
        transfer
            .write_function(|data| {
                if !started {
                    started = true;
                    let head = parse_headers(&header_lines.borrow());
                    if let Err(e) = accept(&head).and_then(|()| sink.on_headers(&head)) {
                        failure = Some(e);
                        return Ok(0);
                    }
                }
                buffer.extend_from_slice(data);
                while buffer.len() >= chunk_size {
                    let rest = buffer.split_off(chunk_size);
                    if let Err(e) = sink.on_chunk(&buffer) {
                        failure = Some(e);
                        return Ok(0);
                    }
                    delivered += buffer.len() as u64;
                    buffer = rest;
                }
                Ok(data.len())
            })
            .map_err(curl_err)?;
        transfer.perform()
    };

    if let Some(e) = failure {
        return Err(e);
    }
    outcome.map_err(|e| JobError::transfer_io("GET failed", e))?;

    if !started {
        // Empty body: headers were never handed over.
        let head = parse_headers(&header_lines.borrow());
        accept(&head)?;
        sink.on_headers(&head)?;
    }
    if !buffer.is_empty() {
        sink.on_chunk(&buffer)?;
        delivered += buffer.len() as u64;
    }
    Ok(delivered)
}

fn accept(head: &ResponseHead) -> Result<(), JobError> {
    if head.is_success() {
        Ok(())
    } else {
        Err(JobError::TransferIo(format!(
            "GET returned HTTP {}",
            head.status.unwrap_or(0)
        )))
    }
}
