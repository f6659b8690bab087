pub(super) fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Status code from `HTTP/1.x NNN reason`.
pub(super) fn parse_status_line(head: &str) -> Result<u16, &'static str> {
    let first_line = head.lines().next().ok_or("empty response")?;
    let mut parts = first_line.split_ascii_whitespace();
    let version = parts.next().ok_or("missing version")?;
    if !version.starts_with("HTTP/1.") {
        return Err("unsupported version");
    }
    let code = parts.next().ok_or("missing status")?;
    if code.len() != 3 {
        return Err("invalid status");
    }
    let status = code.parse::<u16>().map_err(|_| "invalid status")?;
    if !(100..=599).contains(&status) {
        return Err("invalid status");
    }
    Ok(status)
}

pub(super) fn parse_content_length(head: &str) -> Result<Option<usize>, &'static str> {
    let mut content_length = None;

    for line in head.lines().skip(1) {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if !name.eq_ignore_ascii_case("content-length") {
            continue;
        }

        let parsed = value
            .trim()
            .parse::<usize>()
            .map_err(|_| "invalid content-length")?;

        if content_length.is_some() {
            return Err("duplicate content-length");
        }

        content_length = Some(parsed);
    }

    Ok(content_length)
}
