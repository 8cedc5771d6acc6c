//! arbor: editor core for ordered, labeled trees
//!
//! Documents are kept as an arena of nodes, persisted as XML either in local
//! files or in a remote document service.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
