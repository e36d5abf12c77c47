use sea_orm_migration::prelude::*;

mod m20250101_create_queries_and_cases;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_create_queries_and_cases::Migration)]
    }
}
