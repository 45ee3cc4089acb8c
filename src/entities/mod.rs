pub mod prelude;

pub mod encastes;
pub mod gallos;
pub mod profiles;
pub mod users;
