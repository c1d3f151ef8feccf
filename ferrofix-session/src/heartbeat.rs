/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 9/4/26
******************************************************************************/

//! Heartbeat and TestRequest timing.
//!
//! Quiet outbound for a full interval triggers a Heartbeat. Quiet inbound
//! for the interval plus the configured tolerance margin triggers a single
//! TestRequest; if the matching Heartbeat does not come back within another
//! interval, the session is considered dead.

use std::time::{Duration, Instant};

/// Manages heartbeat timing for a FIX session.
#[derive(Debug)]
pub struct HeartbeatManager {
    /// Heartbeat interval.
    interval: Duration,
    /// Grace added to the interval before a TestRequest goes out.
    tolerance: Duration,
    /// Time of last message sent.
    last_sent: Instant,
    /// Time of last message received.
    last_received: Instant,
    /// Pending TestRequest ID, if any.
    test_request_pending: Option<String>,
    /// Time when TestRequest was sent.
    test_request_sent_at: Option<Instant>,
}

impl HeartbeatManager {
    /// Creates a new heartbeat manager.
    ///
    /// # Arguments
    /// * `interval` - The negotiated heartbeat interval
    /// * `tolerance` - Margin added before a TestRequest is emitted
    #[must_use]
    pub fn new(interval: Duration, tolerance: Duration) -> Self {
        let now = Instant::now();
        Self {
            interval,
            tolerance,
            last_sent: now,
            last_received: now,
            test_request_pending: None,
            test_request_sent_at: None,
        }
    }

    /// Records that a message was sent.
    #[inline]
    pub fn on_message_sent(&mut self) {
        self.last_sent = Instant::now();
    }

    /// Records that a message was received.
    ///
    /// A Heartbeat answering the pending TestRequest (matching TestReqID)
    /// clears the pending state; any other traffic proves liveness but
    /// leaves the TestRequest outstanding.
    pub fn on_message_received(&mut self, is_heartbeat: bool, test_req_id: Option<&str>) {
        self.last_received = Instant::now();

        if is_heartbeat
            && let (Some(pending), Some(received)) = (&self.test_request_pending, test_req_id)
            && pending == received
        {
            self.test_request_pending = None;
            self.test_request_sent_at = None;
        }
    }

    /// Checks if a heartbeat should be sent (no outbound within the interval).
    #[must_use]
    pub fn should_send_heartbeat(&self) -> bool {
        self.last_sent.elapsed() >= self.interval
    }

    /// Checks if a TestRequest should be sent.
    ///
    /// True when nothing was received within interval + tolerance and no
    /// TestRequest is already outstanding.
    #[must_use]
    pub fn should_send_test_request(&self) -> bool {
        if self.test_request_pending.is_some() {
            return false;
        }

        self.last_received.elapsed() >= self.interval + self.tolerance
    }

    /// Checks if the session has timed out: a TestRequest went unanswered
    /// for a full further interval.
    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.test_request_sent_at
            .is_some_and(|sent_at| sent_at.elapsed() >= self.interval)
    }

    /// Records that a TestRequest was sent.
    pub fn on_test_request_sent(&mut self, test_req_id: String) {
        self.test_request_pending = Some(test_req_id);
        self.test_request_sent_at = Some(Instant::now());
        self.last_sent = Instant::now();
    }

    /// Returns the pending TestRequest ID, if any.
    #[must_use]
    pub fn pending_test_request(&self) -> Option<&str> {
        self.test_request_pending.as_deref()
    }

    /// Returns the time since the last message was received.
    #[must_use]
    pub fn time_since_last_received(&self) -> Duration {
        self.last_received.elapsed()
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Resets the manager state, e.g. after logon.
    pub fn reset(&mut self) {
        let now = Instant::now();
        self.last_sent = now;
        self.last_received = now;
        self.test_request_pending = None;
        self.test_request_sent_at = None;
    }
}

/// Generates a TestReqID from the current timestamp in nanoseconds.
#[must_use]
pub fn generate_test_req_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    format!("TEST{}", nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_heartbeat_manager_new() {
        let mgr = HeartbeatManager::new(Duration::from_secs(30), Duration::from_secs(1));
        assert_eq!(mgr.interval(), Duration::from_secs(30));
        assert!(mgr.pending_test_request().is_none());
        assert!(!mgr.is_timed_out());
    }

    #[test]
    fn test_should_send_heartbeat() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(10), Duration::from_millis(5));
        assert!(!mgr.should_send_heartbeat());

        sleep(Duration::from_millis(15));
        assert!(mgr.should_send_heartbeat());

        mgr.on_message_sent();
        assert!(!mgr.should_send_heartbeat());
    }

    #[test]
    fn test_test_request_after_tolerance() {
        let mgr = HeartbeatManager::new(Duration::from_millis(10), Duration::from_millis(10));

        sleep(Duration::from_millis(12));
        // Interval elapsed but tolerance not yet.
        assert!(!mgr.should_send_test_request());

        sleep(Duration::from_millis(12));
        assert!(mgr.should_send_test_request());
    }

    #[test]
    fn test_single_test_request_outstanding() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(5), Duration::from_millis(1));
        sleep(Duration::from_millis(10));
        assert!(mgr.should_send_test_request());

        mgr.on_test_request_sent("TEST1".to_string());
        // Never a second one while the first is pending.
        assert!(!mgr.should_send_test_request());
        assert_eq!(mgr.pending_test_request(), Some("TEST1"));
    }

    #[test]
    fn test_matching_heartbeat_clears_pending() {
        let mut mgr = HeartbeatManager::new(Duration::from_secs(30), Duration::from_secs(1));

        mgr.on_test_request_sent("TEST123".to_string());
        mgr.on_message_received(true, Some("OTHER"));
        assert_eq!(mgr.pending_test_request(), Some("TEST123"));

        mgr.on_message_received(true, Some("TEST123"));
        assert!(mgr.pending_test_request().is_none());
        assert!(!mgr.is_timed_out());
    }

    #[test]
    fn test_timeout_after_unanswered_test_request() {
        let mut mgr = HeartbeatManager::new(Duration::from_millis(5), Duration::from_millis(1));
        mgr.on_test_request_sent("TEST1".to_string());
        assert!(!mgr.is_timed_out());

        sleep(Duration::from_millis(10));
        assert!(mgr.is_timed_out());
    }

    #[test]
    fn test_generate_test_req_id() {
        let id = generate_test_req_id();
        assert!(id.starts_with("TEST"));
        assert!(id.len() > 4);
    }
}
