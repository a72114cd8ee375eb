//! Protocol encoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`: byte offsets, ranges and constants (source of truth)
//! - `layers`/`packet`: pure encoders, no I/O
//! - `reader`/`verify`: safe byte access for checking encoded output
//! - `error`: explicit, actionable errors
//!
//! Sockets live in `transport`; nothing here touches the network.

pub(crate) mod common;
pub mod sacn;
