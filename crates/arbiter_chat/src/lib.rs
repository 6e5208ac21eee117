//! # arbiter_chat
//!
//! Routes free-form chat messages to the agents that know about them.
//!
//! Each [`ChatType`] targets a set of categories. Within those, agents whose
//! name contains a technology from the [`KeywordTable`] are picked when the
//! message mentions one of that technology's keywords. When nothing matches,
//! the first agent of every target category answers instead.
//!
//! Answers are collected concurrently and merged into one [`ChatResponse`].

pub mod error;
pub mod keywords;
pub mod router;

pub use error::{ChatError, ChatResult};
pub use keywords::KeywordTable;
pub use router::{ChatResponse, ChatRouter, ChatType, DEFAULT_CHAT_TIMEOUT};
