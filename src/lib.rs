//! Persistent application worker.
//!
//! Hosts a traditionally per-request web application inside one long-lived
//! worker process. The application is bootstrapped once into a prototype
//! instance; every inbound request is served by a short-lived isolated
//! instance derived from that prototype.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────┐
//!                 │                      WORKER                       │
//!                 │                                                   │
//!  HTTP Request   │  ┌─────────┐   ┌──────────┐   ┌─────────────────┐│
//!  ───────────────┼─▶│   net   │──▶│  assets  │──▶│ app::context    ││
//!                 │  │listener │   │ resolver │   │ (isolate clone) ││
//!                 │  └─────────┘   └────┬─────┘   └────────┬────────┘│
//!                 │                     │ static           │         │
//!                 │                     ▼                  ▼         │
//!  HTTP Response  │              ┌──────────┐   ┌─────────────────┐  │
//!  ◀──────────────┼──────────────│  served  │   │   dispatch +    │  │
//!                 │              │   file   │   │ error boundary  │  │
//!                 │              └──────────┘   └─────────────────┘  │
//!                 │                                                  │
//!                 │  ┌──────────────────────────────────────────────┐│
//!                 │  │ bootstrap (once) → prototype app + registry  ││
//!                 │  │ lifecycle: Stopped → Starting → Running →    ││
//!                 │  │            {Reloading → Running | Stopping}  ││
//!                 │  └──────────────────────────────────────────────┘│
//!                 └───────────────────────────────────────────────────┘
//! ```
//!
//! Dispatch is strictly sequential: the worker runs on a current-thread
//! runtime and the request lifecycle is a synchronous call, so one request
//! completes before the next begins. Parallelism comes from running several
//! worker processes (see the `reusePort` transport option).

// Core subsystems
pub mod app;
pub mod assets;
pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod kernel;
pub mod net;
pub mod routing;
pub mod worker;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerProfile;
pub use kernel::{AppKernel, DispatchError};
pub use lifecycle::shutdown::Shutdown;
pub use worker::Worker;
