pub use sea_orm_migration::prelude::*;

mod m20230620_000001_create_users;
mod m20230620_000002_create_tokens;
mod m20230621_000001_create_operations;
mod m20230621_000002_create_records;
mod m20230624_000001_seed_operations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230620_000001_create_users::Migration),
            Box::new(m20230620_000002_create_tokens::Migration),
            Box::new(m20230621_000001_create_operations::Migration),
            Box::new(m20230621_000002_create_records::Migration),
            Box::new(m20230624_000001_seed_operations::Migration),
        ]
    }
}
