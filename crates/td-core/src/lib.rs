//! Collaborators the td monitor talks to: the issue database, small UI
//! config persistence, the current session, and logging setup.

pub mod config;
pub mod db;
pub mod logging;
pub mod paths;
pub mod session;

pub use config::{ConfigStore, FileConfig};
pub use db::{Database, FileDb, ListOptions, RankedIssue, SortField};
pub use session::{Session, SessionStore};
