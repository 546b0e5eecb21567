use std::time::Instant;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, error::TryRecvError};

use crate::grouping::{GroupingRequest, GroupingResponse, compute_grouped_index};

/// A long-lived background thread that computes grouped indices.
///
/// Requests go in over a std channel and are never waited on. Responses come back over a tokio
/// channel so that the owner can either poll for them from a UI loop or await them.
pub struct GroupingEngine {
    request_tx: std::sync::mpsc::Sender<GroupingRequest>,
    response_rx: UnboundedReceiver<GroupingResponse>,
    _engine_thread_handle: std::thread::JoinHandle<()>,
}
impl Default for GroupingEngine {
    fn default() -> Self {
        Self::new()
    }
}
impl GroupingEngine {
    pub fn new() -> Self {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<GroupingRequest>();
        let (response_tx, response_rx) = tokio::sync::mpsc::unbounded_channel();

        let engine_thread_handle = std::thread::spawn(move || {
            Self::run(request_rx, response_tx);
        });

        Self {
            request_tx,
            response_rx,
            _engine_thread_handle: engine_thread_handle,
        }
    }

    /// Queues a request. Never blocks.
    pub fn send(&self, request: GroupingRequest) {
        let (id, kind) = (request.id, request.payload.kind());
        if self.request_tx.send(request).is_err() {
            tracing::warn!("grouping engine is gone; dropping request {id} ({kind})");
        }
    }

    /// Returns the next finished response, if one is ready.
    pub fn try_recv(&mut self) -> Option<GroupingResponse> {
        match self.response_rx.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("grouping engine stopped unexpectedly");
                None
            }
        }
    }

    /// Waits for the next response. Returns `None` if the engine has stopped.
    pub async fn recv(&mut self) -> Option<GroupingResponse> {
        self.response_rx.recv().await
    }

    fn run(
        request_rx: std::sync::mpsc::Receiver<GroupingRequest>,
        response_tx: UnboundedSender<GroupingResponse>,
    ) {
        // Ends once the owning engine drops its sender.
        while let Ok(request) = request_rx.recv() {
            let start = Instant::now();
            let response = compute_grouped_index(&request);
            tracing::debug!(
                "computed {} for request {}: {} items into {} groups in {:?}",
                request.payload.kind(),
                request.id,
                request.payload.item_count(),
                response.result.group_count(),
                start.elapsed()
            );
            // Drop the payload before handing the result over.
            drop(request);

            if response_tx.send(response).is_err() {
                break;
            }
        }
        tracing::debug!("grouping engine stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        grouping::{GroupingKind, GroupingPayload, tests::example_tracks},
        tracker::RequestId,
    };

    #[tokio::test]
    async fn test_engine_answers_every_request() {
        let mut engine = GroupingEngine::new();
        let tracks: Arc<[_]> = example_tracks().into();

        engine.send(GroupingRequest {
            id: RequestId(0),
            payload: GroupingPayload::TracksByArtistName(tracks.clone()),
        });
        engine.send(GroupingRequest {
            id: RequestId(1),
            payload: GroupingPayload::TracksByAlbumId(tracks),
        });

        let mut answered = vec![];
        for _ in 0..2 {
            let response = engine.recv().await.unwrap();
            answered.push((response.id, response.kind()));
        }
        answered.sort();
        assert_eq!(
            answered,
            [
                (RequestId(0), GroupingKind::TracksByArtistName),
                (RequestId(1), GroupingKind::TracksByAlbumId),
            ]
        );
    }

    #[test]
    fn test_try_recv_without_requests() {
        let mut engine = GroupingEngine::new();
        assert!(engine.try_recv().is_none());
    }
}
