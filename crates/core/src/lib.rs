//! Real-time control agent core: wire codec, framed TCP channels, the
//! hierarchical behavior engine and the decide/act runtime loop.

pub mod channel;
pub mod codec;
pub mod config;
pub mod decision;
pub mod io;
pub mod model;
pub mod runtime;
pub mod types;
