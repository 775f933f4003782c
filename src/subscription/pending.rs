use crate::api::FeedId;
use std::collections::HashMap;

/// In-flight follow/unfollow requests, tracked per feed.
///
/// Several requests for one feed may overlap. The feed settles once the last
/// of them completes, in whatever order they arrive. Its final membership is
/// the intent of the newest request the server accepted, or the membership
/// it had before the first request (the baseline) when none was accepted.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    pending: HashMap<FeedId, Pending>,
    next_generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    outstanding: usize,
    baseline: bool,
    /// Generation of the newest accepted request, if any.
    confirmed: Option<u64>,
}

impl InFlight {
    /// Register a new request for `feed_id` and return its generation.
    pub(crate) fn begin(&mut self, feed_id: FeedId, is_member: bool) -> u64 {
        self.next_generation = self.next_generation.wrapping_add(1);
        let pending = self.pending.entry(feed_id).or_insert(Pending {
            outstanding: 0,
            baseline: is_member,
            confirmed: None,
        });
        pending.outstanding += 1;
        self.next_generation
    }

    /// Record a completed request.
    ///
    /// `accepted` is the membership the request asked for when the server
    /// accepted it, `None` when it was rejected or failed. Returns the feed's
    /// settled membership once no request for it is outstanding, `None`
    /// while others are still in flight.
    pub(crate) fn finish(
        &mut self,
        feed_id: FeedId,
        generation: u64,
        accepted: Option<bool>,
    ) -> Option<bool> {
        let pending = self.pending.get_mut(&feed_id)?;

        if let Some(member) = accepted {
            if pending.confirmed.map_or(true, |newest| generation > newest) {
                pending.baseline = member;
                pending.confirmed = Some(generation);
            }
        }

        pending.outstanding = pending.outstanding.saturating_sub(1);
        if pending.outstanding > 0 {
            return None;
        }
        let settled = pending.baseline;
        self.pending.remove(&feed_id);
        Some(settled)
    }

    pub(crate) fn is_pending(&self, feed_id: FeedId) -> bool {
        self.pending.contains_key(&feed_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}
