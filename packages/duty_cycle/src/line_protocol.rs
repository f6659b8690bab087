//! Line-protocol rendering for one telemetry sample.
//!
//! Every field becomes its own line sharing the measurement and tag set:
//!
//! ```text
//! baro,site=home,place=garden temp=21.50
//! baro,site=home,place=garden pres=1013.25
//! baro,site=home,place=garden battery_mv=3712
//! ```
//!
//! The output lives in a fixed-capacity buffer. A line that does not fit is
//! dropped whole together with every line after it, so the receiver never sees
//! a cut-off record.

use core::fmt::{self, Write};

use heapless::String;
use log::warn;

use crate::{
    config::LineSchema,
    telemetry::{Field, FieldValue, TelemetrySample},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload<const N: usize> {
    text: String<N>,
    lines: usize,
    dropped: usize,
}

impl<const N: usize> Payload<N> {
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Lines left out because the buffer bound was reached or the reading was
    /// not a finite number.
    pub fn dropped_lines(&self) -> usize {
        self.dropped
    }

    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }
}

pub fn encode<const N: usize>(sample: &TelemetrySample, schema: &LineSchema) -> Payload<N> {
    let mut payload = Payload {
        text: String::new(),
        lines: 0,
        dropped: 0,
    };
    let mut full = false;

    for field in sample.fields() {
        if full {
            payload.dropped += 1;
            continue;
        }
        if let FieldValue::Float(value) = field.value {
            if !value.is_finite() {
                warn!("encode: field {} is not finite; skipped", field.name);
                payload.dropped += 1;
                continue;
            }
        }

        let mark = payload.text.len();
        if write_line(&mut payload.text, schema, field).is_err() {
            payload.text.truncate(mark);
            payload.dropped += 1;
            full = true;
            continue;
        }
        payload.lines += 1;
    }

    if full {
        warn!(
            "encode: payload bound {}B reached; dropped {} line(s)",
            N, payload.dropped
        );
    }
    payload
}

fn write_line<W: Write>(out: &mut W, schema: &LineSchema, field: &Field) -> fmt::Result {
    out.write_str(schema.measurement)?;
    for (key, value) in schema.tags.pairs() {
        write!(out, ",{}={}", key, value)?;
    }
    match field.value {
        FieldValue::Float(value) => write!(out, " {}={:.2}\n", field.name, value),
        FieldValue::Integer(value) => write!(out, " {}={}\n", field.name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TagSet;

    const SCHEMA: LineSchema = LineSchema {
        measurement: "baro",
        tags: TagSet {
            site: "S",
            place: "P",
        },
    };

    #[test]
    fn two_float_fields_render_byte_exact() {
        let sample = TelemetrySample::new()
            .with_float("temp", 21.5)
            .with_float("secondary", 1013.25);
        let payload = encode::<128>(&sample, &SCHEMA);
        assert_eq!(
            payload.as_str(),
            "baro,site=S,place=P temp=21.50\nbaro,site=S,place=P secondary=1013.25\n"
        );
        assert_eq!(payload.lines(), 2);
        assert!(!payload.is_truncated());
    }

    #[test]
    fn integer_fields_have_no_decimals() {
        let sample = TelemetrySample::new().with_integer("battery_mv", 3712);
        let payload = encode::<64>(&sample, &SCHEMA);
        assert_eq!(payload.as_str(), "baro,site=S,place=P battery_mv=3712\n");
    }

    #[test]
    fn negative_and_rounded_floats() {
        let sample = TelemetrySample::new()
            .with_float("temp", -3.256)
            .with_float("pres", 998.0);
        let payload = encode::<128>(&sample, &SCHEMA);
        assert_eq!(
            payload.as_str(),
            "baro,site=S,place=P temp=-3.26\nbaro,site=S,place=P pres=998.00\n"
        );
    }

    #[test]
    fn overflow_drops_whole_trailing_lines() {
        // 31 bytes for the first line, 38 for the second.
        let sample = TelemetrySample::new()
            .with_float("temp", 21.5)
            .with_float("secondary", 1013.25)
            .with_integer("battery_mv", 3712);
        let payload = encode::<64>(&sample, &SCHEMA);
        assert_eq!(payload.as_str(), "baro,site=S,place=P temp=21.50\n");
        assert_eq!(payload.lines(), 1);
        assert_eq!(payload.dropped_lines(), 2);
        assert!(payload.is_truncated());
    }

    #[test]
    fn exact_fit_is_not_truncated() {
        let sample = TelemetrySample::new()
            .with_float("temp", 21.5)
            .with_float("secondary", 1013.25);
        let payload = encode::<69>(&sample, &SCHEMA);
        assert_eq!(payload.len(), 69);
        assert!(!payload.is_truncated());
    }

    #[test]
    fn first_line_too_long_leaves_empty_payload() {
        let sample = TelemetrySample::new().with_float("temp", 21.5);
        let payload = encode::<16>(&sample, &SCHEMA);
        assert!(payload.is_empty());
        assert_eq!(payload.dropped_lines(), 1);
    }

    #[test]
    fn non_finite_reading_is_skipped() {
        let sample = TelemetrySample::new()
            .with_float("temp", f32::NAN)
            .with_float("pres", 1000.0);
        let payload = encode::<128>(&sample, &SCHEMA);
        assert_eq!(payload.as_str(), "baro,site=S,place=P pres=1000.00\n");
        assert_eq!(payload.dropped_lines(), 1);
    }
}
