use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AdminUser,
    classes::{self, dto::ClassView},
    roles::{filter_role, Role},
    state::AppState,
};

use super::dto::{ListQuery, UserForm, UserView};
use super::repo;
use super::service::{self, IdentityError, RoleChange};

/// Mutations and the missing-entity details case land back on the list, the
/// way the admin panel always returns to its index.
const USERS_LOCATION: &str = "/api/v1/users";

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(user_details))
        .route("/roles", get(list_roles))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", put(edit_user).delete(delete_user))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<UserView>>, (StatusCode, String)> {
    let views = service::list_user_views(&state.db).await.map_err(internal)?;
    Ok(Json(apply_filter(views, q.filter.as_deref())))
}

#[instrument(skip(state))]
pub async fn user_details(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    let Some(mut view) = service::get_user_view(&state.db, id).await.map_err(internal)? else {
        return Ok(Redirect::to(USERS_LOCATION).into_response());
    };

    match view.role {
        Some(Role::Student) => {
            // single enrollment assumed; empty list when the student has none
            let class = classes::repo::for_student(&state.db, id)
                .await
                .map_err(internal)?;
            view.school_classes = Some(class.into_iter().map(ClassView::from).collect());
        }
        Some(Role::Teacher) => {
            let taught = classes::repo::by_teacher(&state.db, id)
                .await
                .map_err(internal)?;
            view.school_classes = Some(taught.into_iter().map(ClassView::from).collect());
        }
        _ => {}
    }

    Ok(Json(view).into_response())
}

#[instrument(skip(state))]
pub async fn list_roles(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    let roles = repo::list_roles(&state.db).await.map_err(internal)?;
    Ok(Json(roles))
}

#[instrument(skip(state, form))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Json(mut form): Json<UserForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let role = validate_form(&mut form)?;

    match service::create_user(&state.db, &form, role, &state.config.default_password).await {
        Ok(_) => Ok(Redirect::to(USERS_LOCATION)),
        Err(IdentityError::EmailTaken) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            IdentityError::EmailTaken.to_string(),
        )),
        Err(e) => {
            error!(error = %e, email = %form.email, "create user failed");
            Err(internal(e))
        }
    }
}

#[instrument(skip(state, form))]
pub async fn edit_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(mut form): Json<UserForm>,
) -> Result<Redirect, (StatusCode, String)> {
    let new_role = validate_form(&mut form)?;

    let users = repo::list_all(&state.db).await.map_err(internal)?;
    if service::email_taken(&users, &form.email, Some(id)) {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            IdentityError::EmailTaken.to_string(),
        ));
    }

    let Some(user) = repo::find_by_id(&state.db, id).await.map_err(internal)? else {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    };

    let old_role = repo::role_of(&state.db, user.id).await.map_err(internal)?;
    match service::plan_role_change(old_role, new_role) {
        RoleChange::Keep => {}
        RoleChange::Add(add) => {
            repo::add_to_role(&state.db, user.id, add)
                .await
                .map_err(internal)?;
        }
        RoleChange::Swap { remove, add } => {
            repo::remove_from_role(&state.db, user.id, remove)
                .await
                .map_err(internal)?;
            repo::add_to_role(&state.db, user.id, add)
                .await
                .map_err(internal)?;
        }
    }

    repo::update_profile(
        &state.db,
        user.id,
        &form.first_name,
        &form.last_name,
        &form.email,
        &form.email,
    )
    .await
    .map_err(internal)?;

    Ok(Redirect::to(USERS_LOCATION))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, (StatusCode, String)> {
    if let Err(e) = service::delete_user(&state.db, id).await {
        // a failed store delete is a backend inconsistency, not a user error
        error!(error = %e, user_id = %id, "delete user failed");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
    }

    classes::repo::remove_student_membership(&state.db, id)
        .await
        .map_err(internal)?;

    Ok(Redirect::to(USERS_LOCATION))
}

/// Normalizes and checks the submitted form; returns the parsed role.
fn validate_form(form: &mut UserForm) -> Result<Role, (StatusCode, String)> {
    form.email = form.email.trim().to_lowercase();
    form.first_name = form.first_name.trim().to_string();
    form.last_name = form.last_name.trim().to_string();

    if form.first_name.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "First name is required.".into(),
        ));
    }
    if form.last_name.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Last name is required.".into(),
        ));
    }
    if !service::is_valid_email(&form.email) {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "Invalid email".into()));
    }
    form.role
        .parse::<Role>()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e))
}

fn apply_filter(views: Vec<UserView>, filter: Option<&str>) -> Vec<UserView> {
    match filter_role(filter) {
        Some(role) => views.into_iter().filter(|v| v.role == Some(role)).collect(),
        None => views,
    }
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(email: &str, role: Option<Role>) -> UserView {
        UserView {
            id: Uuid::new_v4(),
            first_name: "Test".into(),
            last_name: "Person".into(),
            email: email.into(),
            image_uri: "1.jpg".into(),
            role,
            school_classes: None,
        }
    }

    fn sample_views() -> Vec<UserView> {
        vec![
            view("t1@example.com", Some(Role::Teacher)),
            view("s1@example.com", Some(Role::Student)),
            view("s2@example.com", Some(Role::Student)),
            view("a1@example.com", Some(Role::Admin)),
            view("none@example.com", None),
        ]
    }

    #[test]
    fn no_filter_returns_everyone() {
        assert_eq!(apply_filter(sample_views(), None).len(), 5);
    }

    #[test]
    fn teachers_filter_returns_only_teachers() {
        let out = apply_filter(sample_views(), Some("teachers"));
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|v| v.role == Some(Role::Teacher)));
    }

    #[test]
    fn students_filter_is_case_insensitive() {
        let out = apply_filter(sample_views(), Some("StUdEnTs"));
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|v| v.role == Some(Role::Student)));
    }

    #[test]
    fn unrecognized_filter_returns_everyone() {
        assert_eq!(apply_filter(sample_views(), Some("wizards")).len(), 5);
    }

    #[test]
    fn validate_form_normalizes_and_parses_role() {
        let mut form = UserForm {
            first_name: "  Anna ".into(),
            last_name: " Svensson ".into(),
            email: " Anna.Svensson@Skola.SE ".into(),
            role: "student".into(),
        };
        let role = validate_form(&mut form).expect("valid form");
        assert_eq!(role, Role::Student);
        assert_eq!(form.email, "anna.svensson@skola.se");
        assert_eq!(form.first_name, "Anna");
    }

    #[test]
    fn validate_form_rejects_blank_names_and_bad_email() {
        let mut blank = UserForm {
            first_name: "  ".into(),
            last_name: "Svensson".into(),
            email: "a@b.se".into(),
            role: "Student".into(),
        };
        assert_eq!(
            validate_form(&mut blank).unwrap_err().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let mut bad_email = UserForm {
            first_name: "Anna".into(),
            last_name: "Svensson".into(),
            email: "not-an-email".into(),
            role: "Student".into(),
        };
        assert_eq!(
            validate_form(&mut bad_email).unwrap_err().0,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn validate_form_rejects_unknown_role() {
        let mut form = UserForm {
            first_name: "Anna".into(),
            last_name: "Svensson".into(),
            email: "a@b.se".into(),
            role: "Principal".into(),
        };
        let (status, msg) = validate_form(&mut form).unwrap_err();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(msg.contains("principal"));
    }
}
