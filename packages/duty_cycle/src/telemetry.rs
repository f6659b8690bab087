use heapless::Vec;

use crate::config::SamplingThresholds;

pub const SAMPLE_FIELDS_MAX: usize = 4;

pub const FIELD_TEMPERATURE: &str = "temp";
pub const FIELD_PRESSURE: &str = "pres";
pub const FIELD_BATTERY_MV: &str = "battery_mv";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue {
    Float(f32),
    /// Count-like readings, rendered without decimals.
    Integer(i32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

/// Readings captured once per cycle, in upload order.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TelemetrySample {
    fields: Vec<Field, SAMPLE_FIELDS_MAX>,
}

impl TelemetrySample {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder form; fields past `SAMPLE_FIELDS_MAX` are dropped.
    pub fn with_float(mut self, name: &'static str, value: f32) -> Self {
        let _ = self.push(name, FieldValue::Float(value));
        self
    }

    pub fn with_integer(mut self, name: &'static str, value: i32) -> Self {
        let _ = self.push(name, FieldValue::Integer(value));
        self
    }

    pub fn push(&mut self, name: &'static str, value: FieldValue) -> Result<(), Field> {
        self.fields.push(Field { name, value })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Low-power co-processor that samples autonomously while the main core
/// sleeps. Accessors return the latest computed reading and cannot fail once
/// the source has been set up.
pub trait TelemetrySource {
    /// One-time arm after a cold boot.
    fn setup(&mut self, thresholds: &SamplingThresholds);

    /// Re-arm autonomous sampling; called on every path right before sleep.
    fn enable(&mut self);

    /// False when no sampling program is running; such a source captures an
    /// empty sample instead of stale mailbox contents.
    fn is_sampling(&self) -> bool {
        true
    }

    /// Degrees Celsius.
    fn temperature(&mut self) -> f32;

    /// Hectopascal.
    fn pressure(&mut self) -> f32;

    fn battery_millivolts(&mut self) -> u16;

    fn capture(&mut self) -> TelemetrySample {
        if !self.is_sampling() {
            return TelemetrySample::new();
        }
        TelemetrySample::new()
            .with_float(FIELD_TEMPERATURE, self.temperature())
            .with_float(FIELD_PRESSURE, self.pressure())
            .with_integer(FIELD_BATTERY_MV, i32::from(self.battery_millivolts()))
    }
}
