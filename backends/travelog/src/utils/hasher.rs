use password_hash::{PasswordHash, SaltString};

use crate::error::{AppError, AppResult};

pub fn hash_password(password: impl AsRef<[u8]>) -> AppResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    let hash = PasswordHash::generate(argon2::Argon2::default(), password.as_ref(), &salt)
        .map_err(|err| anyhow::anyhow!(err))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(hash: &str, password: impl AsRef<[u8]>) -> AppResult<()> {
    let hash = PasswordHash::new(hash).map_err(|err| anyhow::anyhow!(err))?;

    hash.verify_password(&[&argon2::Argon2::default()], password)
        .map_err(|err| match err {
            password_hash::Error::Password => AppError::Unauthorized("Invalid credentials"),
            err => anyhow::anyhow!(err).into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("correct horse").unwrap();
        let second = hash_password("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("$argon2"));
    }

    #[test]
    fn verifies_only_the_original_password() {
        let hash = hash_password("correct horse").unwrap();

        assert!(verify_password(&hash, "correct horse").is_ok());
        assert!(matches!(
            verify_password(&hash, "battery staple"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
