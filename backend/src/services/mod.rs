// src/services/mod.rs

pub mod attempts;
pub mod completion;
pub mod leaderboard;
pub mod rewards;
pub mod scorer;
pub mod submission;
