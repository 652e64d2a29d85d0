pub mod dashboard;
pub mod error;
pub mod governance;
pub mod incident;
pub mod profile;
pub mod record;
pub mod rules;

// Convenient re-exports to simplify imports elsewhere
pub use error::DomainError;
