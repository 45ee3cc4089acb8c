pub use super::encastes::Entity as Encastes;
pub use super::gallos::Entity as Gallos;
pub use super::profiles::Entity as Profiles;
pub use super::users::Entity as Users;
