//! Worker lifecycle over real sockets.

use appserver::lifecycle::signals::ReloadEvent;
use appserver::lifecycle::state::WorkerState;
use appserver::worker::{Worker, WorkerError};

mod common;

use common::{client, site_profile, start_worker, wait_for_state, ProbeKernel};

#[tokio::test]
async fn worker_starts_serves_and_stops() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let root = tempfile::tempdir().unwrap();
            let server = start_worker(site_profile(root.path()), Box::new(ProbeKernel)).await;
            assert_eq!(server.worker.state(), WorkerState::Running);

            let response = client().get(server.url("/")).send().await.unwrap();
            assert_eq!(response.status(), 200);

            server.stop().await;
            assert_eq!(server.worker.state(), WorkerState::Stopped);
        })
        .await;
}

#[tokio::test]
async fn bootstrap_failure_aborts_startup() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let root = tempfile::tempdir().unwrap();
            let mut profile = site_profile(root.path());
            profile
                .bootstrap_file
                .push(root.path().join("missing-bootstrap.env"));

            let worker = Worker::new(profile, Box::new(ProbeKernel));
            let shutdown = appserver::lifecycle::Shutdown::new();
            let (_reload_tx, reload_rx) = tokio::sync::mpsc::unbounded_channel();

            let result = worker.run(shutdown.subscribe(), reload_rx).await;
            assert!(matches!(result, Err(WorkerError::Bootstrap(_))));
            assert_eq!(worker.state(), WorkerState::Stopped);
        })
        .await;
}

#[tokio::test]
async fn reload_is_rejected_and_serving_continues() {
    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let root = tempfile::tempdir().unwrap();
            let server = start_worker(site_profile(root.path()), Box::new(ProbeKernel)).await;

            server.reload.send(ReloadEvent).unwrap();
            // The worker passes through Reloading and settles back into
            // Running without dropping its prototype.
            wait_for_state(&server.worker, WorkerState::Running).await;

            let response = client().get(server.url("/")).send().await.unwrap();
            assert_eq!(response.status(), 200);

            server.stop().await;
        })
        .await;
}
