//! # Workpulse Core Library
//!
//! This library implements the evaluation pass behind workpulse: a
//! once-per-minute sweep over every enrolled worker that decides, from
//! location pings and attendance records, whether each phone is still
//! reporting when it should be and silent when it should not.
//!
//! ## Architecture
//!
//! - **Sweep Engine**: One stateless pass per scheduler tick; all state
//!   lives in the store, so a crashed run loses nothing
//! - **Storage**: SQLite-backed workforce data and TOML-based configuration
//! - **Notify**: Multicast push gateway for worker reminders and the
//!   administrator digests
//! - **Report**: Per-run JSON artifact with a note trail per worker
//!
//! ## Key Components
//!
//! - [`SweepEngine`]: Orchestrates one evaluation pass
//! - [`SqliteStore`]: Workforce reader/writer over SQLite
//! - [`HttpPushGateway`]: Legacy-FCM-style multicast sender
//! - [`Config`]: Application configuration management

pub mod error;
pub mod geo;
pub mod model;
pub mod notify;
pub mod policy;
pub mod report;
pub mod store;
pub mod sweep;

pub use error::{ConfigError, GeoError, NotifyError, Result, StoreError, SweepError};
pub use geo::GeoPoint;
pub use model::{LocalDay, Milestone, PushCommand, WorkdayState, Worker, WorkerId};
pub use notify::{DeliveryReport, HttpPushGateway, PushGateway, PushMessage};
pub use policy::SweepPolicy;
pub use report::{RunReport, Stage, WorkerReport};
pub use store::{Config, SqliteStore, WorkforceReader, WorkforceWriter};
pub use sweep::SweepEngine;
