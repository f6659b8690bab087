/// Why the main core is running this cycle. Read once from the RTC before
/// anything else happens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-on or reset: the co-processor has not been armed yet.
    ColdBoot,
    /// Resumed from deep sleep by the wake timer.
    TimerWake,
}

impl WakeCause {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColdBoot => "cold_boot",
            Self::TimerWake => "timer_wake",
        }
    }

    pub const fn runs_uplink(self) -> bool {
        matches!(self, Self::TimerWake)
    }
}
