pub use sea_orm_migration::prelude::*;

mod m20240101_000001_init;
mod m20240102_000002_attachments;
mod m20240103_000003_password_reset_codes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_init::Migration),
            Box::new(m20240102_000002_attachments::Migration),
            Box::new(m20240103_000003_password_reset_codes::Migration),
        ]
    }
}
