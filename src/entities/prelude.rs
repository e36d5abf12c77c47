pub use super::cases::Entity as Cases;
pub use super::queries::Entity as Queries;
