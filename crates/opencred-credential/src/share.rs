//! # Share Access Policy
//!
//! A share token grants time- and view-limited read access to a
//! credential's verification view. The gate checks, in order: the active
//! flag (cleared en masse when the credential is revoked), the expiry
//! timestamp, then the view limit.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a share token was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareDenied {
    /// The share was deactivated (typically by revocation of the
    /// underlying credential).
    #[error("share is no longer active")]
    Inactive,

    /// The share's expiry timestamp has passed.
    #[error("share has expired")]
    Expired,

    /// The share's view allowance is used up.
    #[error("share view limit reached")]
    ViewsExhausted,
}

/// Access-control fields of a stored share.
#[derive(Debug, Clone, Copy)]
pub struct ShareGate {
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub current_views: i32,
}

impl ShareGate {
    /// Evaluate the gate at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first matching [`ShareDenied`] condition.
    pub fn evaluate(&self, now: DateTime<Utc>) -> Result<(), ShareDenied> {
        if !self.is_active {
            return Err(ShareDenied::Inactive);
        }
        if matches!(self.expires_at, Some(at) if at < now) {
            return Err(ShareDenied::Expired);
        }
        if matches!(self.max_views, Some(max) if self.current_views >= max) {
            return Err(ShareDenied::ViewsExhausted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn open_gate() -> ShareGate {
        ShareGate {
            is_active: true,
            expires_at: None,
            max_views: None,
            current_views: 0,
        }
    }

    #[test]
    fn open_share_passes() {
        assert!(open_gate().evaluate(now()).is_ok());
    }

    #[test]
    fn inactive_share_is_refused_first() {
        let gate = ShareGate {
            is_active: false,
            expires_at: Some(now() - chrono::Duration::days(1)),
            ..open_gate()
        };
        assert_eq!(gate.evaluate(now()), Err(ShareDenied::Inactive));
    }

    #[test]
    fn expired_share_is_refused() {
        let gate = ShareGate {
            expires_at: Some(now() - chrono::Duration::seconds(1)),
            ..open_gate()
        };
        assert_eq!(gate.evaluate(now()), Err(ShareDenied::Expired));
    }

    #[test]
    fn future_expiry_passes() {
        let gate = ShareGate {
            expires_at: Some(now() + chrono::Duration::hours(1)),
            ..open_gate()
        };
        assert!(gate.evaluate(now()).is_ok());
    }

    #[test]
    fn exhausted_views_are_refused() {
        let gate = ShareGate {
            max_views: Some(3),
            current_views: 3,
            ..open_gate()
        };
        assert_eq!(gate.evaluate(now()), Err(ShareDenied::ViewsExhausted));
    }

    #[test]
    fn remaining_views_pass() {
        let gate = ShareGate {
            max_views: Some(3),
            current_views: 2,
            ..open_gate()
        };
        assert!(gate.evaluate(now()).is_ok());
    }
}
