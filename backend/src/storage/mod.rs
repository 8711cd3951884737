//! SQLite-backed repositories, one per entity.
//!
//! Repositories own the SQL; the domain services own validation and
//! orchestration. Every query is scoped by household or user id.

pub mod budgets;
pub mod goals;
pub mod members;
pub mod preferences;
pub mod transactions;
pub mod users;

pub use budgets::BudgetRepository;
pub use goals::GoalRepository;
pub use members::MemberRepository;
pub use preferences::PreferenceRepository;
pub use transactions::TransactionRepository;
pub use users::{User, UserRepository};
