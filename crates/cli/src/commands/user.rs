//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bz-cli user set-role -e admin@example.com -r admin
//! ```

use bazaar_core::{Email, UserRole};
use bazaar_storefront::db::UserRepository;

use super::{CliError, connect};

/// Change the role of the user registered with `email`.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), CliError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    if user.role == role {
        tracing::info!(user_id = %user.id, "User already has role {role}");
        return Ok(());
    }

    let updated = users.set_role(user.id, role).await?;
    tracing::info!(
        user_id = %updated.id,
        email = %updated.email,
        "Role changed from {} to {}",
        user.role,
        updated.role
    );
    Ok(())
}
