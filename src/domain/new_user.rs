use secrecy::{ExposeSecret, Secret};

use crate::routes::RegisterFormData;

use super::{Birthday, UserEmail, Username};

pub struct NewUser {
    pub username: Username,
    pub password: Secret<String>,
    pub email: UserEmail,
    pub birthday: Birthday,
}

impl TryFrom<RegisterFormData> for NewUser {
    type Error = String;

    fn try_from(value: RegisterFormData) -> Result<Self, Self::Error> {
        let username = Username::parse(value.username)?;
        if value.password.expose_secret().is_empty() {
            return Err("The password must not be empty.".into());
        }
        let email = UserEmail::parse(value.email)?;
        let birthday = Birthday::parse(&value.birth)?;
        Ok(Self {
            username,
            password: value.password,
            email,
            birthday,
        })
    }
}
