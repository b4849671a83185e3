//! Riskguard - risk-control and coordination core for an algorithmic
//! trading backend.
//!
//! Three logically independent services cooperate over an asynchronous
//! in-process message bus: the trader orchestrator sequences risk checks,
//! funding and order execution; the risk service scores strategies and
//! manages alerts; the finance service allocates capital from a budget
//! pool. A timer-driven monitor re-evaluates limits across all active
//! strategies and raises alerts, up to a system-wide emergency stop.
//!
//! # Architecture
//!
//! - [`domain`] - entities, state machines and the typed message envelope
//! - [`bus`] - topic pub/sub plus correlated request/reply with timeouts
//! - [`port`] - trait contracts for persistence, cache, metrics and the
//!   execution gateway
//! - [`adapter`] - in-process implementations of those contracts
//! - [`application`] - scoring engine, assessment workflow, alert service,
//!   trader orchestrator, funding service and the real-time monitor
//! - [`app`] - dependency wiring for the whole process
//!
//! # Example
//!
//! ```no_run
//! use riskguard::app::{App, Collaborators};
//! use riskguard::config::Config;
//!
//! let app = App::build(&Config::default(), Collaborators::in_memory());
//! app.spawn_monitor();
//! ```

pub mod adapter;
pub mod app;
pub mod application;
pub mod bus;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;
