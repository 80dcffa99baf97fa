//! # Workflows Module
//!
//! The public, user-facing layer of crossfeed. A workflow ties the `core` data
//! structures and the `engine` tasks together into one complete scientific
//! procedure: [`score::run`] evaluates a community on one growth medium and
//! returns every requested interaction score as an immutable
//! [`score::ScoreResult`].

pub mod score;
