use std::vec::Vec;

use embassy_futures::block_on;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

use super::*;
use crate::config::Endpoint;

const ENDPOINT: Endpoint = Endpoint {
    host: "192.168.1.10",
    port: 8086,
    database: "telemetry",
};

const BODY: &[u8] = b"baro,site=S,place=P temp=21.50\n";

/// In-memory peer that records the request and replays a canned response in
/// fixed-size chunks.
struct FakeStream {
    written: Vec<u8>,
    response: Vec<u8>,
    cursor: usize,
    chunk: usize,
    write_error: Option<ErrorKind>,
    read_error: Option<ErrorKind>,
}

impl FakeStream {
    fn replying(response: &[u8]) -> Self {
        Self {
            written: Vec::new(),
            response: response.to_vec(),
            cursor: 0,
            chunk: 7,
            write_error: None,
            read_error: None,
        }
    }

    fn written_text(&self) -> &str {
        std::str::from_utf8(&self.written).expect("request is utf-8")
    }
}

impl ErrorType for FakeStream {
    type Error = ErrorKind;
}

impl Read for FakeStream {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if let Some(kind) = self.read_error {
            return Err(kind);
        }
        let left = &self.response[self.cursor..];
        let n = left.len().min(buf.len()).min(self.chunk);
        buf[..n].copy_from_slice(&left[..n]);
        self.cursor += n;
        Ok(n)
    }
}

impl Write for FakeStream {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if let Some(kind) = self.write_error {
            return Err(kind);
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Seen {
    Connected,
    HeadersSent,
    Header(std::string::String),
    Data(usize),
    Finished,
    Error(TransportError),
    Disconnected,
}

fn run_exchange(stream: &mut FakeStream, scratch_len: usize) -> (UploadResult, Vec<Seen>) {
    let request = UploadRequest::new(&ENDPOINT, BODY);
    let mut scratch = vec![0u8; scratch_len];
    let mut seen = Vec::new();
    let result = block_on(exchange(stream, &request, &mut scratch, |event| {
        seen.push(match event {
            HttpEvent::Connected => Seen::Connected,
            HttpEvent::HeadersSent => Seen::HeadersSent,
            HttpEvent::Header(line) => Seen::Header(line.into()),
            HttpEvent::Data { len } => Seen::Data(len),
            HttpEvent::Finished => Seen::Finished,
            HttpEvent::Error(err) => Seen::Error(err),
            HttpEvent::Disconnected => Seen::Disconnected,
        })
    }));
    (result, seen)
}

#[test]
fn request_has_write_target_and_headers() {
    let mut stream = FakeStream::replying(b"HTTP/1.1 204 No Content\r\n\r\n");
    let (result, _) = run_exchange(&mut stream, 128);

    assert!(result.is_success());
    let expected = "POST /write?db=telemetry HTTP/1.1\r\n\
                    Host: 192.168.1.10:8086\r\n\
                    Content-Type: text/plain; charset=utf-8\r\n\
                    Content-Length: 31\r\n\
                    Connection: close\r\n\r\n\
                    baro,site=S,place=P temp=21.50\n";
    assert_eq!(stream.written_text(), expected);
}

#[test]
fn no_content_reply_completes_without_body() {
    let mut stream = FakeStream::replying(
        b"HTTP/1.1 204 No Content\r\nX-Influxdb-Version: 1.8.10\r\n\r\n",
    );
    let (result, seen) = run_exchange(&mut stream, 128);

    assert_eq!(
        result,
        UploadResult::Completed {
            status: 204,
            content_length: None
        }
    );
    assert_eq!(
        seen,
        [
            Seen::HeadersSent,
            Seen::Header("X-Influxdb-Version: 1.8.10".into()),
            Seen::Finished,
        ]
    );
}

#[test]
fn declared_body_is_drained() {
    let mut stream = FakeStream::replying(
        b"HTTP/1.1 400 Bad Request\r\nContent-Length: 30\r\n\r\n{\"error\":\"unable to parse xx\"}",
    );
    let (result, seen) = run_exchange(&mut stream, 64);

    assert_eq!(result.status(), Some(400));
    assert!(!result.is_success());
    let drained: usize = seen
        .iter()
        .map(|event| match event {
            Seen::Data(len) => *len,
            _ => 0,
        })
        .sum();
    assert_eq!(drained, 30);
    assert_eq!(stream.cursor, stream.response.len());
    assert_eq!(seen.last(), Some(&Seen::Finished));
}

#[test]
fn short_body_is_reported_but_keeps_status() {
    let mut stream =
        FakeStream::replying(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc");
    let (result, seen) = run_exchange(&mut stream, 64);

    assert_eq!(result.status(), Some(200));
    assert!(seen.contains(&Seen::Error(TransportError::Read)));
}

#[test]
fn head_larger_than_scratch_is_malformed() {
    let mut stream = FakeStream::replying(
        b"HTTP/1.1 204 No Content\r\nX-Request-Id: 0123456789abcdef0123456789abcdef\r\n\r\n",
    );
    let (result, seen) = run_exchange(&mut stream, 32);

    assert_eq!(result, UploadResult::Failed(TransportError::MalformedResponse));
    assert_eq!(
        seen.last(),
        Some(&Seen::Error(TransportError::MalformedResponse))
    );
}

#[test]
fn peer_close_before_head_is_malformed() {
    let mut stream = FakeStream::replying(b"HTTP/1.1 204");
    let (result, _) = run_exchange(&mut stream, 64);
    assert_eq!(result, UploadResult::Failed(TransportError::MalformedResponse));
}

#[test]
fn garbage_status_line_is_malformed() {
    let mut stream = FakeStream::replying(b"SSH-2.0-OpenSSH_9.6\r\n\r\n");
    let (result, _) = run_exchange(&mut stream, 64);
    assert_eq!(result, UploadResult::Failed(TransportError::MalformedResponse));
}

#[test]
fn write_failure_never_reads() {
    let mut stream = FakeStream::replying(b"HTTP/1.1 204 No Content\r\n\r\n");
    stream.write_error = Some(ErrorKind::BrokenPipe);
    let (result, seen) = run_exchange(&mut stream, 64);

    assert_eq!(result, UploadResult::Failed(TransportError::Write));
    assert_eq!(stream.cursor, 0);
    assert_eq!(seen, [Seen::Error(TransportError::Write)]);
}

#[test]
fn read_timeout_maps_to_timeout() {
    let mut stream = FakeStream::replying(b"");
    stream.read_error = Some(ErrorKind::TimedOut);
    let (result, _) = run_exchange(&mut stream, 64);
    assert_eq!(result, UploadResult::Failed(TransportError::Timeout));
}

#[test]
fn oversized_head_is_rejected_before_io() {
    let long_host: &'static str = Box::leak("h".repeat(REQUEST_HEAD_MAX).into_boxed_str());
    let endpoint = Endpoint {
        host: long_host,
        ..ENDPOINT
    };
    let request = UploadRequest::new(&endpoint, BODY);
    let mut stream = FakeStream::replying(b"HTTP/1.1 204 No Content\r\n\r\n");
    let mut scratch = [0u8; 64];

    let result = block_on(exchange(&mut stream, &request, &mut scratch, log_http_event));

    assert_eq!(result, UploadResult::Failed(TransportError::RequestTooLarge));
    assert!(stream.written.is_empty());
}

#[test]
fn success_is_any_2xx() {
    let completed = |status| UploadResult::Completed {
        status,
        content_length: None,
    };
    assert!(completed(200).is_success());
    assert!(completed(204).is_success());
    assert!(!completed(301).is_success());
    assert!(!UploadResult::Failed(TransportError::Connect).is_success());
}
