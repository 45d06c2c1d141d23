// Scoring core for the junior-tournament hockey pool: name matching,
// per-position scoring, roster aggregation and the ranked leaderboard.
//
// Nothing in this crate performs I/O. The app crate feeds it submission rows
// and provider records and persists what comes out.

pub mod aggregate;
pub mod leaderboard;
pub mod normalize;
pub mod roster;
pub mod scoring;
