//! Admin customer profile list.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use super::search_term;
use crate::db::UserRepository;
use crate::db::users::ProfileListRow;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireStaff};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProfileSearch {
    pub q: Option<String>,
}

/// Profile list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/profiles/index.html")]
pub struct ProfilesIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub profiles: Vec<ProfileListRow>,
    pub query: String,
}

/// Profiles, searchable by username, phone or city.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Query(search): Query<ProfileSearch>,
) -> Result<impl IntoResponse> {
    let query = search_term(search.q.as_ref());
    let profiles = UserRepository::new(state.pool())
        .list_profiles(query.as_deref())
        .await?;

    Ok(ProfilesIndexTemplate {
        ctx,
        current_path: "/admin/profiles",
        profiles,
        query: query.unwrap_or_default(),
    })
}
