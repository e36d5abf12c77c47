pub mod case;
pub mod query;
