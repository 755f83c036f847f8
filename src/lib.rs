//! cyberlearn - progress & gamification engine
//!
//! Tracks what learners on the cyberlearn tutoring platform have done: XP per
//! guidance track, daily activity streaks, one-time lesson and daily-challenge
//! completions, and the achievements those earn.
//!
//! ## Guarantees
//!
//! - A lesson or daily challenge is credited at most once per user, even when
//!   the same request arrives several times at once.
//! - XP balances only grow, and concurrent credits never lose each other.
//! - A completion whose credit was interrupted stays visible and is repaired
//!   by [`ProgressEngine::reconcile`](progress::ProgressEngine::reconcile).
//!
//! Identity is passed explicitly on every call; authentication happens
//! upstream.

pub mod config;
pub mod progress;

pub use progress::*;
