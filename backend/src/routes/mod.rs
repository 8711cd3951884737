pub mod assistant;
pub mod auth;
pub mod budgets;
pub mod goals;
pub mod health;
pub mod members;
pub mod preferences;
pub mod reports;
pub mod transactions;
