mod application_base_url;
mod birthday;
mod contact;
mod days_alert;
mod new_user;
mod user_email;
mod username;

pub use application_base_url::ApplicationBaseUrl;
pub use birthday::Birthday;
pub use contact::Contact;
pub use days_alert::DaysAlert;
pub use new_user::NewUser;
pub use user_email::UserEmail;
pub use username::Username;
