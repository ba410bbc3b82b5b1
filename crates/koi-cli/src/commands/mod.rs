pub mod clean;
pub mod compose;
pub mod run;
pub mod setup;
