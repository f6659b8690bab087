use core::{cmp::min, fmt::Write as _};

use embedded_io_async::{Error as _, ErrorKind, Read, Write};
use heapless::String;
use log::warn;

use super::helpers::{find_header_end, parse_content_length, parse_status_line};
use super::{HttpEvent, TransportError, UploadRequest, UploadResult};

/// Bound for the rendered request line and headers.
pub const REQUEST_HEAD_MAX: usize = 256;

/// Runs one request/response over an already connected stream.
///
/// The response head must fit in `scratch`; bytes past the head are counted
/// against the declared `Content-Length`. A body that ends early is reported
/// to `on_event` but does not change the result, the status is already known.
pub async fn exchange<S, F>(
    socket: &mut S,
    request: &UploadRequest<'_>,
    scratch: &mut [u8],
    mut on_event: F,
) -> UploadResult
where
    S: Read + Write,
    F: FnMut(HttpEvent<'_>),
{
    match run(socket, request, scratch, &mut on_event).await {
        Ok(result) => {
            on_event(HttpEvent::Finished);
            result
        }
        Err(err) => {
            on_event(HttpEvent::Error(err));
            UploadResult::Failed(err)
        }
    }
}

async fn run<S, F>(
    socket: &mut S,
    request: &UploadRequest<'_>,
    scratch: &mut [u8],
    on_event: &mut F,
) -> Result<UploadResult, TransportError>
where
    S: Read + Write,
    F: FnMut(HttpEvent<'_>),
{
    let head = render_head(request).map_err(|_| TransportError::RequestTooLarge)?;
    socket
        .write_all(head.as_bytes())
        .await
        .map_err(|err| io_error(err.kind(), TransportError::Write))?;
    socket
        .write_all(request.payload)
        .await
        .map_err(|err| io_error(err.kind(), TransportError::Write))?;
    socket
        .flush()
        .await
        .map_err(|err| io_error(err.kind(), TransportError::Write))?;
    on_event(HttpEvent::HeadersSent);

    let mut filled = 0usize;
    let header_end = loop {
        if let Some(end) = find_header_end(&scratch[..filled]) {
            break end;
        }
        if filled == scratch.len() {
            warn!("upload: response head exceeds {}B", scratch.len());
            return Err(TransportError::MalformedResponse);
        }
        let n = socket
            .read(&mut scratch[filled..])
            .await
            .map_err(|err| io_error(err.kind(), TransportError::Read))?;
        if n == 0 {
            return Err(TransportError::MalformedResponse);
        }
        filled += n;
    };

    let head = core::str::from_utf8(&scratch[..header_end])
        .map_err(|_| TransportError::MalformedResponse)?;
    let status = parse_status_line(head).map_err(|reason| {
        warn!("upload: bad status line: {}", reason);
        TransportError::MalformedResponse
    })?;
    let content_length = parse_content_length(head).map_err(|reason| {
        warn!("upload: bad headers: {}", reason);
        TransportError::MalformedResponse
    })?;
    for line in head.lines().skip(1) {
        on_event(HttpEvent::Header(line));
    }

    if let Some(declared) = content_length {
        let body_start = header_end + 4;
        let buffered = min(filled - body_start, declared);
        if buffered > 0 {
            on_event(HttpEvent::Data { len: buffered });
        }
        if let Err(err) = drain_body(socket, declared - buffered, scratch, on_event).await {
            on_event(HttpEvent::Error(err));
        }
    }

    Ok(UploadResult::Completed {
        status,
        content_length: content_length.and_then(|len| u32::try_from(len).ok()),
    })
}

fn render_head(request: &UploadRequest<'_>) -> Result<String<REQUEST_HEAD_MAX>, core::fmt::Error> {
    let endpoint = request.endpoint;
    let mut head = String::new();
    head.write_str("POST ")?;
    endpoint.write_target(&mut head)?;
    write!(
        head,
        " HTTP/1.1\r\nHost: {}:{}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        endpoint.host,
        endpoint.port,
        request.payload.len()
    )?;
    Ok(head)
}

async fn drain_body<S, F>(
    socket: &mut S,
    mut remaining: usize,
    sink: &mut [u8],
    on_event: &mut F,
) -> Result<(), TransportError>
where
    S: Read,
    F: FnMut(HttpEvent<'_>),
{
    while remaining > 0 {
        let want = min(remaining, sink.len());
        let n = socket
            .read(&mut sink[..want])
            .await
            .map_err(|err| io_error(err.kind(), TransportError::Read))?;
        if n == 0 {
            return Err(TransportError::Read);
        }
        on_event(HttpEvent::Data { len: n });
        remaining -= n;
    }
    Ok(())
}

fn io_error(kind: ErrorKind, fallback: TransportError) -> TransportError {
    match kind {
        ErrorKind::TimedOut => TransportError::Timeout,
        _ => fallback,
    }
}
