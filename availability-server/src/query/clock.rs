use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Hong Kong time, the default authority timezone.
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Source of "now" in the authority's local timezone.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The system clock, viewed at a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Returns `None` when the offset is out of range (±24h).
    pub fn with_offset_secs(secs: i32) -> Option<Self> {
        FixedOffset::east_opt(secs).map(Self::new)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_secs(DEFAULT_UTC_OFFSET_SECS).unwrap_or(Self::new(Utc.fix()))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
