use tokio::sync::watch;

/// Broadcasts cumulative byte progress, both as a raw delta per event and as
/// a human-readable `"<done>/<total>"` string.
///
/// Both channels are "replay-latest": a subscriber created after the first
/// publish immediately observes the most recent value, matching the
/// `ValueNotifier`/`BehaviorSubject` semantics this is modeled on.
#[derive(Clone)]
pub struct ProgressPublisher {
    bytes_delta: watch::Sender<u64>,
    formatted: watch::Sender<String>,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        let (bytes_delta, _) = watch::channel(0);
        let (formatted, _) = watch::channel(format_pair(0, 0));
        Self {
            bytes_delta,
            formatted,
        }
    }

    /// Publishes one byte-segment arrival: `delta` is this segment's size,
    /// `downloaded`/`total` are the cumulative counters used to render the
    /// formatted string.
    pub fn publish(&self, delta: u64, downloaded: u64, total: u64) {
        let _ = self.bytes_delta.send(delta);
        let _ = self.formatted.send(format_pair(downloaded, total));
    }

    pub fn subscribe_bytes(&self) -> watch::Receiver<u64> {
        self.bytes_delta.subscribe()
    }

    pub fn subscribe_formatted(&self) -> watch::Receiver<String> {
        self.formatted.subscribe()
    }
}

impl Default for ProgressPublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn format_pair(downloaded: u64, total: u64) -> String {
    format!("{}/{}", format_bytes(downloaded as i64), format_bytes(total as i64))
}

/// Formats a byte count using binary (1024-based) units. Negative inputs
/// are reflected to positive first; whole-valued results render without a
/// decimal point, fractional results render with exactly one.
pub fn format_bytes(bytes: i64) -> String {
    let n = bytes.unsigned_abs();
    if n == 0 {
        return "0 B".to_string();
    }

    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    let (divisor, unit) = if n >= TB {
        (TB, "TB")
    } else if n >= GB {
        (GB, "GB")
    } else if n >= MB {
        (MB, "MB")
    } else if n >= KB {
        (KB, "KB")
    } else {
        (1, "B")
    };

    let value = n as f64 / divisor as f64;
    if value.fract() == 0.0 {
        format!("{} {}", value as u64, unit)
    } else {
        format!("{:.1} {}", value, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_formatting_round_trip() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(1536), "1.5 KB");
    }

    #[test]
    fn negative_inputs_are_reflected_to_positive() {
        assert_eq!(format_bytes(-1536), "1.5 KB");
    }

    #[test]
    fn late_subscriber_replays_latest_value() {
        let publisher = ProgressPublisher::new();
        publisher.publish(512, 512, 2048);

        let bytes_rx = publisher.subscribe_bytes();
        let formatted_rx = publisher.subscribe_formatted();

        assert_eq!(*bytes_rx.borrow(), 512);
        assert_eq!(*formatted_rx.borrow(), "512 B/2 KB");
    }
}
