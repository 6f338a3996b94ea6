//! Integration tests for putqueue-worker
//!
//! Drives the upload worker and service against a scripted process runner
//! and recording sinks, plus (on unix) a real shell script standing in for
//! the upload program.


mod test_process;
mod test_service;
