//! The per-request decision core.
//!
//! ```text
//!             ┌──────────────── POST verify_path ──► HandleSubmission
//! request ────┤
//!             └── trust cookie? ── yes ──► Forward
//!                               └─ no ───► Challenge { original_path }
//! ```

mod client;
mod cookie;
mod decision;

pub use client::ClientContext;
pub use cookie::TrustCookieCodec;
pub use decision::{Gate, GateDecision};
