//! Identity facade: the bulk-listing, creation and deletion operations the
//! admin handlers delegate to, on top of the raw queries in [`super::repo`].

use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::roles::Role;
use crate::users::dto::{UserForm, UserView};
use crate::users::repo::{self, NewUser, User};

/// Number of stock avatar images; a new account gets one of `1.jpg`..`6.jpg`.
const AVATAR_COUNT: u32 = 6;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("This email is already registered.")]
    EmailTaken,
    #[error("Unexpected error occurred deleting user with ID '{0}'.")]
    DeleteFailed(Uuid),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn random_avatar() -> String {
    format!("{}.jpg", rand::thread_rng().gen_range(1..=AVATAR_COUNT))
}

/// Linear scan for an email collision, optionally excluding one user id
/// (the account being edited). Matches the admin panel's behavior of scanning
/// the full user list; the unique index on `users.email` backstops races.
pub(crate) fn email_taken(users: &[User], email: &str, exclude: Option<Uuid>) -> bool {
    users
        .iter()
        .any(|u| u.email == email && Some(u.id) != exclude)
}

/// What the edit flow must do to the role store.
#[derive(Debug, PartialEq, Eq)]
pub enum RoleChange {
    Keep,
    Add(Role),
    Swap { remove: Role, add: Role },
}

pub(crate) fn plan_role_change(old: Option<Role>, new: Role) -> RoleChange {
    match old {
        Some(current) if current == new => RoleChange::Keep,
        Some(current) => RoleChange::Swap {
            remove: current,
            add: new,
        },
        None => RoleChange::Add(new),
    }
}

pub async fn list_user_views(db: &PgPool) -> anyhow::Result<Vec<UserView>> {
    let rows = repo::list_views(db).await?;
    Ok(rows.into_iter().map(UserView::from).collect())
}

/// Loads one user as a view model, role resolved. `None` when the id is
/// unknown.
pub async fn get_user_view(db: &PgPool, id: Uuid) -> anyhow::Result<Option<UserView>> {
    let Some(user) = repo::find_by_id(db, id).await? else {
        return Ok(None);
    };
    let role = repo::role_of(db, id).await?;
    Ok(Some(UserView::from_user(user, role)))
}

/// Creates an account from the submitted form with the fixed initial password
/// and a random stock avatar, then assigns the chosen role.
pub async fn create_user(
    db: &PgPool,
    form: &UserForm,
    role: Role,
    default_password: &str,
) -> Result<User, IdentityError> {
    let existing = repo::list_all(db).await?;
    if email_taken(&existing, &form.email, None) {
        return Err(IdentityError::EmailTaken);
    }

    let password_hash = hash_password(default_password)?;
    let image_uri = random_avatar();
    let user = repo::create(
        db,
        NewUser {
            first_name: &form.first_name,
            last_name: &form.last_name,
            email: &form.email,
            user_name: &form.email,
            image_uri: &image_uri,
            password_hash: &password_hash,
        },
    )
    .await?;
    repo::add_to_role(db, user.id, role).await?;

    info!(user_id = %user.id, email = %user.email, role = %role, "user created");
    Ok(user)
}

/// Deletes the account. Zero rows affected means the backend is in an
/// unexpected state and is escalated, never swallowed.
pub async fn delete_user(db: &PgPool, id: Uuid) -> Result<(), IdentityError> {
    let rows = repo::delete(db, id).await?;
    if rows == 0 {
        return Err(IdentityError::DeleteFailed(id));
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(id: Uuid, email: &str) -> User {
        User {
            id,
            first_name: "Test".into(),
            last_name: "Person".into(),
            email: email.into(),
            user_name: email.into(),
            image_uri: "1.jpg".into(),
            password_hash: "x".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn email_taken_finds_collision() {
        let users = vec![
            user(Uuid::new_v4(), "a@example.com"),
            user(Uuid::new_v4(), "b@example.com"),
        ];
        assert!(email_taken(&users, "b@example.com", None));
        assert!(!email_taken(&users, "c@example.com", None));
    }

    #[test]
    fn email_taken_excludes_the_edited_account() {
        let id = Uuid::new_v4();
        let users = vec![user(id, "a@example.com"), user(Uuid::new_v4(), "b@example.com")];
        // keeping your own email is not a collision
        assert!(!email_taken(&users, "a@example.com", Some(id)));
        // taking someone else's is
        assert!(email_taken(&users, "b@example.com", Some(id)));
    }

    #[test]
    fn role_change_keeps_matching_role() {
        assert_eq!(
            plan_role_change(Some(Role::Student), Role::Student),
            RoleChange::Keep
        );
    }

    #[test]
    fn role_change_swaps_differing_role() {
        assert_eq!(
            plan_role_change(Some(Role::Student), Role::Teacher),
            RoleChange::Swap {
                remove: Role::Student,
                add: Role::Teacher,
            }
        );
    }

    #[test]
    fn role_change_adds_when_no_role_stored() {
        assert_eq!(plan_role_change(None, Role::Admin), RoleChange::Add(Role::Admin));
    }

    #[test]
    fn random_avatar_stays_within_the_stock_set() {
        for _ in 0..200 {
            let avatar = random_avatar();
            let n: u32 = avatar
                .strip_suffix(".jpg")
                .expect("jpg suffix")
                .parse()
                .expect("numeric stem");
            assert!((1..=AVATAR_COUNT).contains(&n), "got {avatar}");
        }
    }

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("anna.svensson@skola.se"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn delete_failed_message_names_the_id() {
        let id = Uuid::new_v4();
        let err = IdentityError::DeleteFailed(id);
        assert_eq!(
            err.to_string(),
            format!("Unexpected error occurred deleting user with ID '{id}'.")
        );
    }
}
