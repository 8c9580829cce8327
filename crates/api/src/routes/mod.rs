pub mod detect;
pub mod reports;
