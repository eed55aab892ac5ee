use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use diesel::prelude::*;

use crate::{
    Error,
    models::{Backend, Signup, Users},
    schema,
};

impl Backend {
    pub fn check_username_exists(&self, username: &str) -> Result<bool, Error> {
        let mut conn = self.get_connection()?;
        let exists = diesel::select(diesel::dsl::exists(
            schema::users::table.filter(schema::users::username.eq(username)),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(exists)
    }

    pub fn check_email_exists(&self, email: &str) -> Result<bool, Error> {
        let mut conn = self.get_connection()?;
        let exists = diesel::select(diesel::dsl::exists(
            schema::users::table.filter(schema::users::email.eq(email)),
        ))
        .get_result::<bool>(&mut conn)?;
        Ok(exists)
    }

    pub fn create_user(&self, signup: Signup) -> Result<Users, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(signup.password.as_bytes(), &salt)?
            .to_string();

        let mut conn = self.get_connection()?;
        let user = diesel::insert_into(schema::users::table)
            .values((
                schema::users::username.eq(&signup.username),
                schema::users::email.eq(&signup.email),
                schema::users::password.eq(&password_hash),
            ))
            .get_result::<Users>(&mut conn)?;
        Ok(user)
    }
}
