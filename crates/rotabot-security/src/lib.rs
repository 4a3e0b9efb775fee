//! # RotaBot Security
//! Static admin allow-list gating the roster and assignment commands.

pub mod allowlist;

pub use allowlist::Allowlist;
