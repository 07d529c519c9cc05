//! An embedded multicast DNS engine for OPC UA server discovery on the
//! local link (RFC 1035 wire format, RFC 6762 behaviour).
//!
//! The engine is single-threaded and cooperative: a host feeds it
//! received datagrams via [`engine::Engine::feed`], drains outbound
//! datagrams via [`engine::Engine::drain`], and sleeps no longer than
//! [`engine::Engine::next_deadline`] allows. It reads no clock of its
//! own — every operation takes a host-supplied [`std::time::Instant`].

pub mod cache;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod header;
pub mod logging;
pub mod message;
pub mod namecache;
pub mod published;
pub mod query;
pub mod rdata;
pub mod scheduler;

pub use engine::Engine;
pub use error::MdnsError;
