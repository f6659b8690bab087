use core::{fmt, time::Duration};

pub const WIFI_SSID_MAX: usize = 32;
pub const WIFI_PASSWORD_MAX: usize = 64;
/// Upper bound for one encoded upload body.
pub const PAYLOAD_MAX: usize = 256;
pub const DEFAULT_MAX_RETRY: u8 = 5;
pub const DEFAULT_SLEEP_SECONDS: u32 = 300;
// Matches the 20-tick pause the sampling driver expects before sleep entry.
pub const DEFAULT_LOG_FLUSH_MS: u64 = 200;
pub const DEFAULT_INFLUX_PORT: u16 = 8086;
pub const DEFAULT_TEMP_DIFF_CENTI: u16 = 10;
pub const DEFAULT_PRES_DIFF_PA: u16 = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: &'static str,
    pub password: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialsError {
    MissingSsid,
    SsidTooLong,
    PasswordTooLong,
}

impl CredentialsError {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingSsid => "missing_ssid",
            Self::SsidTooLong => "ssid_too_long",
            Self::PasswordTooLong => "password_too_long",
        }
    }
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WifiCredentials {
    pub const fn new(ssid: &'static str, password: &'static str) -> Self {
        Self { ssid, password }
    }

    pub fn validate(&self) -> Result<(), CredentialsError> {
        if self.ssid.is_empty() {
            return Err(CredentialsError::MissingSsid);
        }
        if self.ssid.len() > WIFI_SSID_MAX {
            return Err(CredentialsError::SsidTooLong);
        }
        if self.password.len() > WIFI_PASSWORD_MAX {
            return Err(CredentialsError::PasswordTooLong);
        }
        Ok(())
    }

    /// Open networks are joined without an auth method.
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Destination of the `/write` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: &'static str,
    pub port: u16,
    pub database: &'static str,
}

impl Endpoint {
    pub fn write_target<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "/write?db={}", self.database)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagSet {
    pub site: &'static str,
    pub place: &'static str,
}

impl TagSet {
    pub const fn pairs(&self) -> [(&'static str, &'static str); 2] {
        [("site", self.site), ("place", self.place)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSchema {
    pub measurement: &'static str,
    pub tags: TagSet,
}

/// Change thresholds handed to the co-processor program. The core never
/// interprets them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingThresholds {
    pub temperature_centi: u16,
    pub pressure_pa: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    pub credentials: WifiCredentials,
    pub max_retries: u8,
    pub sleep_interval: Duration,
    pub log_flush_delay: Duration,
    pub endpoint: Endpoint,
    pub schema: LineSchema,
    pub thresholds: SamplingThresholds,
}

pub const fn str_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => default,
    }
}

/// Decimal parse usable for `option_env!` values in const items. Anything that
/// is not a plain decimal `u32` yields `default`.
pub const fn parse_u32_or(value: Option<&str>, default: u32) -> u32 {
    let Some(text) = value else {
        return default;
    };
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return default;
    }

    let mut acc = 0u32;
    let mut idx = 0usize;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if !byte.is_ascii_digit() {
            return default;
        }
        acc = match acc.checked_mul(10) {
            Some(value) => value,
            None => return default,
        };
        acc = match acc.checked_add((byte - b'0') as u32) {
            Some(value) => value,
            None => return default,
        };
        idx += 1;
    }
    acc
}

pub const fn parse_u16_or(value: Option<&str>, default: u16) -> u16 {
    let parsed = parse_u32_or(value, default as u32);
    if parsed > u16::MAX as u32 {
        default
    } else {
        parsed as u16
    }
}

pub const fn parse_u8_or(value: Option<&str>, default: u8) -> u8 {
    let parsed = parse_u32_or(value, default as u32);
    if parsed > u8::MAX as u32 {
        default
    } else {
        parsed as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_env_values_parse_or_fall_back() {
        assert_eq!(parse_u32_or(Some("300"), 7), 300);
        assert_eq!(parse_u32_or(None, 7), 7);
        assert_eq!(parse_u32_or(Some(""), 7), 7);
        assert_eq!(parse_u32_or(Some("3O0"), 7), 7);
        assert_eq!(parse_u32_or(Some("-1"), 7), 7);
        assert_eq!(parse_u32_or(Some("99999999999"), 7), 7);
        assert_eq!(parse_u16_or(Some("8086"), 1), 8086);
        assert_eq!(parse_u16_or(Some("70000"), 1), 1);
        assert_eq!(parse_u8_or(Some("5"), 1), 5);
        assert_eq!(parse_u8_or(Some("256"), 1), 1);
    }

    #[test]
    fn parse_is_usable_in_const_items() {
        const SLEEP: u32 = parse_u32_or(Some("60"), DEFAULT_SLEEP_SECONDS);
        const HOST: &str = str_or(None, "10.0.0.2");
        assert_eq!(SLEEP, 60);
        assert_eq!(HOST, "10.0.0.2");
        assert_eq!(str_or(Some(""), "fallback"), "fallback");
    }

    #[test]
    fn credentials_validation_limits() {
        assert_eq!(
            WifiCredentials::new("", "secret").validate(),
            Err(CredentialsError::MissingSsid)
        );
        assert_eq!(
            WifiCredentials::new("abcdefghijklmnopqrstuvwxyz0123456", "").validate(),
            Err(CredentialsError::SsidTooLong)
        );
        let long_password = "p".repeat(WIFI_PASSWORD_MAX + 1);
        let leaked: &'static str = Box::leak(long_password.into_boxed_str());
        assert_eq!(
            WifiCredentials::new("lab", leaked).validate(),
            Err(CredentialsError::PasswordTooLong)
        );
        let open = WifiCredentials::new("lab", "");
        assert_eq!(open.validate(), Ok(()));
        assert!(open.is_open());
    }

    #[test]
    fn endpoint_renders_write_target() {
        let endpoint = Endpoint {
            host: "10.0.0.2",
            port: 8086,
            database: "weather",
        };
        let mut target = heapless::String::<32>::new();
        endpoint.write_target(&mut target).unwrap();
        assert_eq!(target.as_str(), "/write?db=weather");
    }
}
