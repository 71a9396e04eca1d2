//! S101 framing statistics collection

/// Deframing statistics
///
/// Tracks what the framing reader received and why frames or messages were
/// thrown away. Counters are updated by [`crate::FramingReader`] and can be
/// queried at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramingStatistics {
    /// Frames with a valid checksum
    pub frames_received: u64,
    /// EmBER packages accepted into a message
    pub packages_received: u64,
    /// Complete messages delivered
    pub messages_received: u64,
    /// Keep-alive requests and responses received
    pub keep_alives_received: u64,
    /// Frames rejected for a checksum mismatch
    pub crc_errors: u64,
    /// Frames or headers that could not be parsed
    pub invalid_frames: u64,
    /// Messages discarded because the reassembly buffer was full
    pub overflows: u64,
    /// Frames cut short by a new begin-of-frame marker
    pub aborted_frames: u64,
    /// Invalid escape sequences or unescaped reserved bytes
    pub invalid_escapes: u64,
    /// Continuation packages received outside a message
    pub dropped_packages: u64,
    /// Incomplete messages replaced by a new first package
    pub dropped_messages: u64,
}

impl FramingStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Total number of rejected frames and discarded data
    pub fn error_count(&self) -> u64 {
        self.crc_errors
            + self.invalid_frames
            + self.overflows
            + self.aborted_frames
            + self.invalid_escapes
            + self.dropped_packages
            + self.dropped_messages
    }

    /// Get error rate as a percentage of all frames seen
    ///
    /// Returns 0.0 if nothing has been received.
    pub fn error_rate(&self) -> f64 {
        let total = self.frames_received + self.crc_errors + self.aborted_frames + self.invalid_escapes;
        if total == 0 {
            0.0
        } else {
            (self.error_count() as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics_clear() {
        let mut stats = FramingStatistics::new();
        stats.crc_errors = 2;
        stats.frames_received = 2;
        assert_eq!(stats.error_count(), 2);
        assert!((stats.error_rate() - 50.0).abs() < f64::EPSILON);
        stats.clear();
        assert_eq!(stats, FramingStatistics::default());
        assert_eq!(stats.error_rate(), 0.0);
    }
}
