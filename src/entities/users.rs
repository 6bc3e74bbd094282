//! `SeaORM` Entity for users table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Email address identifying the user
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2id PHC string, never the raw password
    pub password: String,
    /// `active` or `inactive`
    pub status: String,
    /// Running balance, always stored rounded to cents
    pub balance: f64,
    pub last_login: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::records::Entity")]
    Records,
    #[sea_orm(has_many = "super::tokens::Entity")]
    Tokens,
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
