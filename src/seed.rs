//! Startup data: the fixed role set and a bootstrap admin account, without
//! which a fresh database has no way to mint an admin token.

use tracing::info;

use crate::auth::password::hash_password;
use crate::roles::Role;
use crate::state::AppState;
use crate::users::repo::{self, NewUser};
use crate::users::service::random_avatar;

pub async fn run(state: &AppState) -> anyhow::Result<()> {
    for role in Role::ALL {
        sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(role.as_str())
            .execute(&state.db)
            .await?;
    }

    let admin_email = &state.config.admin_email;
    if repo::find_by_email(&state.db, admin_email).await?.is_none() {
        let password_hash = hash_password(&state.config.default_password)?;
        let image_uri = random_avatar();
        let admin = repo::create(
            &state.db,
            NewUser {
                first_name: "School",
                last_name: "Admin",
                email: admin_email,
                user_name: admin_email,
                image_uri: &image_uri,
                password_hash: &password_hash,
            },
        )
        .await?;
        repo::add_to_role(&state.db, admin.id, Role::Admin).await?;
        info!(email = %admin_email, "bootstrap admin created");
    }

    Ok(())
}
