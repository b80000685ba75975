pub mod activity;
pub mod application;
pub mod company;
pub mod evaluation;
pub mod job;
pub mod privacy;
pub mod scorecard;
pub mod settings;
pub mod user;
