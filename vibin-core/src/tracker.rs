use std::time::{Duration, Instant};

use crate::{activity::ActivitySource, grouping::GroupingKind};

/// Identifies one dispatched grouping request.
///
/// IDs are allocated in increasing order, so a larger ID is always a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);
impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that has been sent to the engine and not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: GroupingKind,
    pub dispatched_at: Instant,
}

/// Tracks which grouping requests are outstanding.
///
/// Entries are keyed by [`RequestId`], so two requests for the same kind are tracked
/// separately and each is cleared only by its own response. Every change is pushed to the
/// attached [`ActivitySource`], if any.
#[derive(Default)]
pub struct PendingTracker {
    next_id: u64,
    pending: Vec<PendingRequest>,
    activity: Option<ActivitySource>,
}
impl PendingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(activity: ActivitySource) -> Self {
        Self {
            activity: Some(activity),
            ..Self::default()
        }
    }

    /// Records a newly dispatched request and returns its ID.
    pub fn add(&mut self, kind: GroupingKind) -> RequestId {
        self.add_at(kind, Instant::now())
    }

    pub(crate) fn add_at(&mut self, kind: GroupingKind, dispatched_at: Instant) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingRequest {
            id,
            kind,
            dispatched_at,
        });
        self.publish();
        id
    }

    /// Clears the request with the given ID. Unknown IDs are ignored.
    pub fn remove(&mut self, id: RequestId) -> Option<PendingRequest> {
        let position = self.pending.iter().position(|p| p.id == id)?;
        let removed = self.pending.remove(position);
        self.publish();
        Some(removed)
    }

    /// Clears and returns every request dispatched more than `timeout` before `now`.
    pub fn expire(&mut self, now: Instant, timeout: Duration) -> Vec<PendingRequest> {
        let (expired, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| now.saturating_duration_since(p.dispatched_at) >= timeout);
        self.pending = pending;
        if !expired.is_empty() {
            self.publish();
        }
        expired
    }

    pub fn is_computing(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn is_pending(&self, kind: GroupingKind) -> bool {
        self.pending.iter().any(|p| p.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Labels of the outstanding requests, in dispatch order.
    pub fn pending_labels(&self) -> Vec<&'static str> {
        self.pending.iter().map(|p| p.kind.as_str()).collect()
    }

    /// The time at which the oldest outstanding request will have waited `timeout`.
    ///
    /// Deadlines too far out to represent are treated as never arriving.
    pub fn next_deadline(&self, timeout: Duration) -> Option<Instant> {
        self.pending
            .iter()
            .filter_map(|p| p.dispatched_at.checked_add(timeout))
            .min()
    }

    fn publish(&self) {
        if let Some(activity) = &self.activity {
            activity.set(self.is_computing());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::BackgroundActivity;

    #[test]
    fn test_add_and_remove() {
        let mut tracker = PendingTracker::new();
        assert!(!tracker.is_computing());

        let albums = tracker.add(GroupingKind::AlbumsByArtistName);
        let tracks = tracker.add(GroupingKind::TracksByAlbumId);
        assert!(tracker.is_computing());
        assert_eq!(
            tracker.pending_labels(),
            ["allAlbumsByArtistName", "allTracksByAlbumId"]
        );

        assert_eq!(
            tracker.remove(albums).map(|p| p.kind),
            Some(GroupingKind::AlbumsByArtistName)
        );
        assert!(tracker.is_computing());
        tracker.remove(tracks);
        assert!(!tracker.is_computing());
    }

    #[test]
    fn test_unknown_id_is_a_no_op() {
        let mut tracker = PendingTracker::new();
        tracker.add(GroupingKind::TracksByArtistName);
        assert_eq!(tracker.remove(RequestId(42)), None);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_duplicate_kind_is_tracked_per_request() {
        let mut tracker = PendingTracker::new();
        let first = tracker.add(GroupingKind::TracksByArtistName);
        let second = tracker.add(GroupingKind::TracksByArtistName);
        assert_ne!(first, second);

        tracker.remove(first);
        assert!(tracker.is_pending(GroupingKind::TracksByArtistName));
        tracker.remove(second);
        assert!(!tracker.is_computing());

        // A repeated response for an already-cleared request changes nothing.
        assert_eq!(tracker.remove(second), None);
        assert!(!tracker.is_computing());
    }

    #[test]
    fn test_expire() {
        let mut tracker = PendingTracker::new();
        let start = Instant::now();
        let old = tracker.add_at(GroupingKind::AlbumsByArtistName, start);
        let new = tracker.add_at(GroupingKind::TracksByAlbumId, start + Duration::from_secs(5));

        assert_eq!(
            tracker.next_deadline(Duration::from_secs(10)),
            Some(start + Duration::from_secs(10))
        );

        let expired = tracker.expire(start + Duration::from_secs(12), Duration::from_secs(10));
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, old);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.remove(new).is_some());
    }

    #[test]
    fn test_huge_timeout_never_expires() {
        let mut tracker = PendingTracker::new();
        let start = Instant::now();
        tracker.add_at(GroupingKind::TracksByArtistName, start);

        assert_eq!(tracker.next_deadline(Duration::MAX), None);
        assert!(
            tracker
                .expire(start + Duration::from_secs(3600), Duration::MAX)
                .is_empty()
        );
        assert!(tracker.is_computing());
    }

    #[test]
    fn test_publishes_to_activity() {
        let activity = BackgroundActivity::new();
        let mut tracker = PendingTracker::with_activity(activity.source("groupings"));

        let id = tracker.add(GroupingKind::TracksByAlbumId);
        assert!(activity.is_active());
        tracker.remove(id);
        assert!(!activity.is_active());
    }
}
