pub mod datasets;
pub mod evaluations;
pub mod health;
