//! Server clock used for `created_at` / `updated_at`.
//!
//! Timestamps are truncated to whole microseconds. That is the finest
//! resolution PostgreSQL `timestamptz` keeps, so a value read back from any
//! backend compares equal to the value that was written.

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// The current time, truncated to microseconds.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

/// The timestamp to record for a mutation of a row last touched at
/// `previous`. Always strictly later than `previous`.
pub fn touch(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = now();
  if now > previous {
    now
  } else {
    previous + Duration::microseconds(1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn now_has_no_sub_microsecond_component() {
    let t = now();
    assert_eq!(t.timestamp_subsec_nanos() % 1_000, 0);
  }

  #[test]
  fn touch_moves_forward_from_the_past() {
    let past = now() - Duration::seconds(5);
    assert!(touch(past) > past);
  }

  #[test]
  fn touch_moves_forward_from_the_future() {
    // A row stamped by a clock that ran ahead still gets a later value.
    let future = now() + Duration::hours(1);
    assert_eq!(touch(future), future + Duration::microseconds(1));
  }
}
