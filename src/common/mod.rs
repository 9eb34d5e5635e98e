pub mod auth;
pub mod crud;
pub mod errors;
pub mod models;
pub mod state;
pub mod views;

#[cfg(test)]
mod tests;
