//! Core parley library (segments, highlighting, responder, session, config).

pub mod config;
pub mod copy;
pub mod highlight;
pub mod logging;
pub mod render;
pub mod responder;
pub mod segments;
pub mod session;
