mod error_page;
mod health_check;
mod home;
mod login;
mod logout;
mod register;
mod subscriptions;
mod users;

pub use error_page::*;
pub use health_check::*;
pub use home::*;
pub use login::*;
pub use logout::*;
pub use register::*;
pub use subscriptions::*;
pub use users::*;
