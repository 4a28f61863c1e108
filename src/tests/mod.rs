//! Testing module
//!
//! Shared fixtures plus end-to-end job scenarios:
//! - Progress reporting while samples flow
//! - Terminal event delivery (completion, errors, no tracks)
//! - Release and restart
//! - Track routing to pipeline kinds
//! - Offline planning of mixed inputs

mod classification;
