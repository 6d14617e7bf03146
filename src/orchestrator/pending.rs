//! Pending-request guard: at most one submission of a kind in flight.

use crate::error::{ApiError, ApiResult};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub(crate) struct PendingGuard {
    busy: AtomicBool,
}

/// Held for the duration of a request. Releases the guard on drop, so an
/// early return or a dropped future never leaves it stuck.
#[derive(Debug)]
pub(crate) struct PendingTicket<'a> {
    busy: &'a AtomicBool,
}

impl PendingGuard {
    pub(crate) fn try_begin(&self) -> ApiResult<PendingTicket<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ApiError::Busy)?;
        Ok(PendingTicket { busy: &self.busy })
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for PendingTicket<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_busy_until_ticket_drops() {
        let guard = PendingGuard::default();
        let ticket = guard.try_begin().unwrap();
        assert!(guard.is_busy());
        assert!(matches!(guard.try_begin(), Err(ApiError::Busy)));
        drop(ticket);
        assert!(!guard.is_busy());
        assert!(guard.try_begin().is_ok());
    }
}
