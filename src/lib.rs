//! Extracts the history of a single WhatsApp Web conversation into CSV.
//!
//! The browser backend is isolated behind the [`dom::Dom`] trait so the two
//! core algorithms (the history loader and the message extractor) run the
//! same against live Chrome and against the scripted fakes in `tests/`.

pub mod chrome;
pub mod dom;
pub mod extract;
pub mod loader;
pub mod output;
pub mod record;
pub mod selectors;
