//! Anti-detection session layer
//!
//! Per-navigation disguise (user agent rotation, realistic headers, stealth
//! init script), randomized inter-request pacing, and session-cookie
//! normalization. Each concern is independent and individually skippable on
//! failure.

pub mod cookies;
pub mod disguise;

pub use cookies::{parse_cookie_payload, SameSite, SessionCookie};
pub use disguise::{DelayPolicy, Disguise};
