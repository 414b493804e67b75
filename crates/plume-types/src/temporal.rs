use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Signed seconds since the UNIX epoch.
///
/// Post records carry this as their creation stamp. It is always assigned by
/// the ledger program's clock, never by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnixTimestamp(i64);

impl UnixTimestamp {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// The current wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// The epoch itself.
    pub const fn zero() -> Self {
        Self(0)
    }
}

impl fmt::Debug for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnixTimestamp({})", self.0)
    }
}

impl fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_produces_reasonable_timestamp() {
        // After 2020-01-01.
        assert!(UnixTimestamp::now().as_secs() > 1_577_836_800);
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(UnixTimestamp::from_secs(-5) < UnixTimestamp::zero());
        assert!(UnixTimestamp::from_secs(10) > UnixTimestamp::from_secs(9));
    }

    #[test]
    fn display_format() {
        assert_eq!(UnixTimestamp::from_secs(1700000000).to_string(), "1700000000");
    }
}
