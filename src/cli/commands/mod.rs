pub mod accounts;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod dashboard;
pub mod profile;
pub mod route;
pub mod transactions;
