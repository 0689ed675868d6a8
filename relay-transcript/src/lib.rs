//! Chat transcript scraping for the relay.
//!
//! The pipeline lives in five small modules:
//!
//! - [`html`]: the selector capability the page walk is written against
//! - [`page`]: walks monologue blocks into [`page::TranscriptEntry`] values,
//!   carrying the sticky per-block timestamp forward
//! - [`message`]: normalizes raw fragments into [`Message`] values
//! - [`transcript`]: fetches the page and any partial messages
//! - [`filter`]: keeps the messages from the last hour
pub mod filter;
pub mod html;
pub mod message;
pub mod page;
pub mod transcript;

pub use filter::last_hour;
pub use message::Message;
pub use transcript::TranscriptScraper;
