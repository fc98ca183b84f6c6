//! Admin category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use greenshop_core::{CategoryId, slugify};

use super::search_term;
use crate::db::catalog::CategoryInput;
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormErrors, clean, optional};
use crate::middleware::{PageContext, RequireStaff};
use crate::models::{Category, Flash, FlashLevel};
use crate::state::AppState;

const DUPLICATE: &str = "A category with this name or slug already exists.";

/// `?q=` search on the category list.
#[derive(Debug, Default, Deserialize)]
pub struct CategorySearch {
    pub q: Option<String>,
}

/// Category create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(length(max = 120, message = "Ensure this value has at most 120 characters."))]
    #[serde(default)]
    pub name: String,
    #[validate(length(max = 140, message = "Ensure this value has at most 140 characters."))]
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    #[serde(default)]
    pub image: String,
}

impl CategoryForm {
    /// Trimmed copy; a blank slug is derived from the name.
    #[must_use]
    pub fn cleaned(&self) -> Self {
        let name = clean(&self.name);
        let slug = match optional(&self.slug) {
            Some(slug) => slug,
            None => slugify(&name),
        };
        Self {
            name,
            slug,
            description: clean(&self.description),
            image: clean(&self.image),
        }
    }

    #[must_use]
    pub fn errors(&self) -> FormErrors {
        let mut errors = FormErrors::validate(self);
        errors.require("name", &self.name);
        errors.require("slug", &self.slug);
        errors
    }

    fn to_input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone(),
            image: optional(&self.image),
        }
    }
}

impl From<Category> for CategoryForm {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
            description: category.description,
            image: category.image.unwrap_or_default(),
        }
    }
}

/// Category list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub categories: Vec<Category>,
    pub query: String,
}

/// Category form template; `category_id` is `None` when creating.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories/form.html")]
pub struct CategoryFormTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub category_id: Option<CategoryId>,
    pub form: CategoryForm,
    pub errors: FormErrors,
}

impl CategoryFormTemplate {
    fn new(ctx: PageContext, category_id: Option<CategoryId>, form: CategoryForm, errors: FormErrors) -> Self {
        Self {
            ctx,
            current_path: "/admin/categories",
            category_id,
            form,
            errors,
        }
    }

    #[must_use]
    pub fn action(&self) -> String {
        self.category_id.map_or_else(
            || "/admin/categories/new".to_owned(),
            |id| format!("/admin/categories/{id}/edit"),
        )
    }
}

/// Category list with name search.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Query(search): Query<CategorySearch>,
) -> Result<impl IntoResponse> {
    let query = search_term(search.q.as_ref());
    let categories = CatalogRepository::new(state.pool())
        .search_categories(query.as_deref())
        .await?;

    Ok(CategoriesIndexTemplate {
        ctx,
        current_path: "/admin/categories",
        categories,
        query: query.unwrap_or_default(),
    })
}

/// Empty category form.
#[instrument(skip(staff, ctx), fields(user_id = %staff.id))]
pub async fn new_page(RequireStaff(staff): RequireStaff, ctx: PageContext) -> impl IntoResponse {
    CategoryFormTemplate::new(ctx, None, CategoryForm::default(), FormErrors::new())
}

/// Create a category.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(&state, &session, None, form).await
}

/// Edit form for an existing category.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse> {
    let category = CatalogRepository::new(state.pool())
        .get_category(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(CategoryFormTemplate::new(
        ctx,
        Some(id),
        category.into(),
        FormErrors::new(),
    ))
}

/// Update a category.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    save(&state, &session, Some(id), form).await
}

/// Shared create/update flow: validate, write, flash, redirect.
async fn save(
    state: &AppState,
    session: &Session,
    id: Option<CategoryId>,
    form: CategoryForm,
) -> Result<Response> {
    let form = form.cleaned();
    let mut errors = form.errors();

    if errors.is_empty() {
        let catalog = CatalogRepository::new(state.pool());
        let input = form.to_input();
        let saved = match id {
            Some(id) => catalog.update_category(id, &input).await,
            None => catalog.create_category(&input).await,
        };

        match saved {
            Ok(category) => {
                state.invalidate_categories().await;
                tracing::info!(category_id = %category.id, slug = %category.slug, "Category saved");
                let verb = if id.is_some() { "changed" } else { "added" };
                Flash::push(
                    session,
                    FlashLevel::Success,
                    format!("The category \"{}\" was {verb}.", category.name),
                )
                .await?;
                return Ok(Redirect::to("/admin/categories").into_response());
            }
            Err(RepositoryError::Conflict(_)) => errors.add_non_field(DUPLICATE),
            Err(e) => return Err(e.into()),
        }
    }

    Ok(CategoryFormTemplate::new(PageContext::from_session(session).await, id, form, errors)
        .into_response())
}

/// Delete a category together with its products.
#[instrument(skip(state, staff, session), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<CategoryId>,
) -> Result<Response> {
    match CatalogRepository::new(state.pool()).delete_category(id).await {
        Ok(()) => {
            state.invalidate_categories().await;
            tracing::info!(category_id = %id, "Category deleted");
            Flash::push(&session, FlashLevel::Success, "The category was deleted.").await?;
        }
        Err(RepositoryError::Protected(_)) => {
            tracing::warn!(category_id = %id, "Category delete blocked by order history");
            Flash::push(
                &session,
                FlashLevel::Error,
                "This category cannot be deleted: some of its products appear in orders.",
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/admin/categories").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_slug_is_derived_from_name() {
        let form = CategoryForm {
            name: "  Комнатные растения ".to_owned(),
            ..CategoryForm::default()
        }
        .cleaned();
        assert_eq!(form.name, "Комнатные растения");
        assert_eq!(form.slug, "komnatnye-rasteniya");
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_explicit_slug_is_kept() {
        let form = CategoryForm {
            name: "Seeds".to_owned(),
            slug: " seeds-2024 ".to_owned(),
            ..CategoryForm::default()
        }
        .cleaned();
        assert_eq!(form.slug, "seeds-2024");
    }

    #[test]
    fn test_name_is_required() {
        let errors = CategoryForm::default().cleaned().errors();
        assert!(errors.has("name"));
        assert!(errors.has("slug"));
    }

    #[test]
    fn test_name_length() {
        let form = CategoryForm {
            name: "x".repeat(121),
            slug: "x".to_owned(),
            ..CategoryForm::default()
        };
        assert_eq!(
            form.errors().get("name"),
            ["Ensure this value has at most 120 characters."]
        );
    }

    #[test]
    fn test_form_action() {
        let template = CategoryFormTemplate::new(
            PageContext::default(),
            Some(CategoryId::new(3)),
            CategoryForm::default(),
            FormErrors::new(),
        );
        assert_eq!(template.action(), "/admin/categories/3/edit");
    }
}
