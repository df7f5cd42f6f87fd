//! apiguard: a pre-merge gate over the public API surface of source packages.
//!
//! The gate resolves which directories a branch touched, extracts their
//! current exported-symbol surface with an external tool, compares it
//! against the `.api` baseline recorded next to the sources, and either
//! reports the differences (check) or rewrites the baselines (fix).

pub mod baseline;
pub mod commands;
pub mod config;
pub mod engine;
pub mod extractor;
pub mod gitutil;
pub mod resolver;
pub mod surface;
