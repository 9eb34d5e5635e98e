pub mod capture;
pub mod models;
pub mod results;
pub mod submission;
pub mod views;
