mod advance;
mod cases;
mod extract;
mod import;
mod init;
mod mark;
mod queries;

pub use advance::cmd_advance;
pub use cases::cmd_list_cases;
pub use extract::cmd_extract;
pub use import::cmd_import_cases;
pub use init::cmd_init;
pub use mark::cmd_mark;
pub use queries::cmd_list_queries;
