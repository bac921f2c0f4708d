//! Library side of the `fuzzmatch` command: logging, run settings, and
//! the load-match-write pipeline.

pub mod logging;
pub mod pipeline;
pub mod settings;
