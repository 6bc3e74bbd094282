pub use super::operations::Entity as Operations;
pub use super::records::Entity as Records;
pub use super::tokens::Entity as Tokens;
pub use super::users::Entity as Users;
