//! Shared utilities for integration testing.
//!
//! Workers are driven over real sockets: each test builds a temp document
//! root, starts a worker on an ephemeral port inside a `LocalSet`, and
//! talks to it with reqwest.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use appserver::app::IsolatedApp;
use appserver::config::schema::ServerProfile;
use appserver::kernel::{AppKernel, DispatchError};
use appserver::lifecycle::signals::ReloadEvent;
use appserver::lifecycle::state::WorkerState;
use appserver::lifecycle::Shutdown;
use appserver::worker::Worker;
use tokio::sync::mpsc::UnboundedSender;

/// A worker profile rooted at a temp directory, bound to an ephemeral port.
#[allow(dead_code)]
pub fn site_profile(root: &Path) -> ServerProfile {
    ServerProfile {
        host: "127.0.0.1".into(),
        port: 0,
        root: root.to_path_buf(),
        ..ServerProfile::default()
    }
}

/// A running worker under test.
#[allow(dead_code)]
pub struct TestWorker {
    pub worker: Worker,
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub reload: UnboundedSender<ReloadEvent>,
}

#[allow(dead_code)]
impl TestWorker {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(&self) {
        self.shutdown.trigger();
        wait_for_state(&self.worker, WorkerState::Stopped).await;
    }
}

/// Spawn a worker on the current `LocalSet` and wait until it is Running.
#[allow(dead_code)]
pub async fn start_worker(profile: ServerProfile, kernel: Box<dyn AppKernel>) -> TestWorker {
    let worker = Worker::new(profile, kernel);
    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let (reload_tx, reload_rx) = tokio::sync::mpsc::unbounded_channel();

    let runner = worker.clone();
    tokio::task::spawn_local(async move {
        let _ = runner.run(shutdown_rx, reload_rx).await;
    });

    wait_for_state(&worker, WorkerState::Running).await;
    let addr = worker.local_addr().expect("worker did not bind");

    TestWorker {
        worker,
        addr,
        shutdown,
        reload: reload_tx,
    }
}

#[allow(dead_code)]
pub async fn wait_for_state(worker: &Worker, state: WorkerState) {
    for _ in 0..200 {
        if worker.state() == state {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("worker never reached state {}", state);
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    // Non-pooled: idle keep-alive connections would otherwise hold the
    // worker's drain open at shutdown.
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("client")
}

/// Test kernel with path-keyed behaviors.
///
/// On a normal path it records what it inherited from previous cycles,
/// then deliberately taints every request-scoped component; a later request
/// observing any of it is an isolation failure.
///
/// - `/fail`      → lifecycle returns a fault
/// - `/panic`     → lifecycle panics
/// - `/hookfail`  → lifecycle succeeds, the post-lifecycle hook panics
#[derive(Debug, Default)]
pub struct ProbeKernel;

impl AppKernel for ProbeKernel {
    fn run(&self, app: &mut IsolatedApp) -> Result<(), DispatchError> {
        let path = app.request().path().to_string();
        match path.as_str() {
            "/fail" => return Err(DispatchError::App("injected lifecycle failure".into())),
            "/panic" => panic!("injected lifecycle panic"),
            _ => {}
        }

        let inherited_session = app
            .session()
            .get("marker")
            .and_then(|v| v.as_str())
            .unwrap_or("none")
            .to_string();
        let inherited_user = app.identity().user_id().unwrap_or("none").to_string();
        let inherited_view = if app.view().buffer().is_empty() {
            "none".to_string()
        } else {
            app.view().buffer().to_string()
        };

        let id = app.id().to_string();
        app.session_mut().open(None);
        app.session_mut().set("marker", serde_json::json!(id));
        app.identity_mut().login(&id);
        app.view_mut().write(&id);

        let script = app
            .request()
            .script()
            .map(|s| s.script_name.clone())
            .unwrap_or_default();

        let body = format!(
            "instance={id}\nscript={script}\ninherited_session={inherited_session}\ninherited_user={inherited_user}\ninherited_view={inherited_view}\n"
        );
        let response = app.response_mut();
        response.set_content_type("text/plain; charset=UTF-8");
        response.write(body.as_bytes());
        Ok(())
    }

    fn after_run(&self, app: &mut IsolatedApp) {
        if app.request().path() == "/hookfail" {
            panic!("injected hook failure");
        }
    }
}

/// Pull a `key=value` line out of a ProbeKernel response body.
#[allow(dead_code)]
pub fn body_field<'a>(body: &'a str, key: &str) -> &'a str {
    body.lines()
        .find_map(|line| line.strip_prefix(&format!("{key}=")))
        .unwrap_or_else(|| panic!("field {key} missing in body: {body}"))
}
