//! Admin product management: list with quick edit, full form, gallery.

use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use greenshop_core::{CategoryId, ProductId, ProductImageId, slugify};

use super::{search_term, yes_no};
use crate::db::catalog::{AdminProductFilter, NewProductImage, ProductInput, ProductQuickEdit};
use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::forms::{FormErrors, REQUIRED, checkbox, clean, optional, parse_count, parse_money};
use crate::middleware::{PageContext, RequireStaff};
use crate::models::{Category, Flash, FlashLevel, Product, ProductImage, ProductSummary};
use crate::state::AppState;

/// Directory under the media root that receives gallery uploads.
pub const GALLERY_DIR: &str = "products/gallery";

/// Accepted upload extensions.
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const DUPLICATE_SLUG: &str = "Product with this slug already exists.";

// =============================================================================
// Form Types
// =============================================================================

/// List filters: `?category=<id>&is_active=1&is_featured=0&q=`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub is_active: Option<String>,
    pub is_featured: Option<String>,
    pub q: Option<String>,
}

impl ProductListQuery {
    #[must_use]
    pub fn filter(&self) -> AdminProductFilter {
        AdminProductFilter {
            category_id: self.category_id(),
            is_active: yes_no(self.is_active.as_ref()),
            is_featured: yes_no(self.is_featured.as_ref()),
            query: search_term(self.q.as_ref()),
        }
    }

    fn category_id(&self) -> Option<CategoryId> {
        self.category
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .map(CategoryId::new)
    }
}

/// One row of the list's inline editor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuickEditForm {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    pub is_active: Option<String>,
    pub is_featured: Option<String>,
}

impl QuickEditForm {
    /// Parse the row.
    ///
    /// # Errors
    ///
    /// Returns the first user-facing problem with the submitted values.
    pub fn parse(&self) -> std::result::Result<ProductQuickEdit, String> {
        let price = parse_money(&self.price).map_err(|e| format!("Price: {e}"))?;
        let stock = parse_count(&self.stock).map_err(|e| format!("Stock: {e}"))?;
        Ok(ProductQuickEdit {
            price,
            stock,
            is_active: checkbox(self.is_active.as_ref()),
            is_featured: checkbox(self.is_featured.as_ref()),
        })
    }
}

/// Full product create/edit form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProductForm {
    #[serde(default)]
    pub category: String,
    #[validate(length(max = 200, message = "Ensure this value has at most 200 characters."))]
    #[serde(default)]
    pub name: String,
    #[validate(length(max = 220, message = "Ensure this value has at most 220 characters."))]
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[validate(length(max = 100, message = "Ensure this value has at most 100 characters."))]
    #[serde(default)]
    pub main_image: String,
    pub is_active: Option<String>,
    pub is_featured: Option<String>,
    #[serde(default)]
    pub rating: String,
}

impl ProductForm {
    /// Defaults for a new product: active, no stock, unrated.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            stock: "0".to_owned(),
            rating: "0.00".to_owned(),
            is_active: Some("on".to_owned()),
            ..Self::default()
        }
    }

    /// Trimmed copy; a blank slug is derived from the name.
    #[must_use]
    pub fn cleaned(&self) -> Self {
        let name = clean(&self.name);
        let slug = optional(&self.slug).unwrap_or_else(|| slugify(&name));
        Self {
            category: clean(&self.category),
            name,
            slug,
            description: clean(&self.description),
            price: clean(&self.price),
            stock: clean(&self.stock),
            main_image: clean(&self.main_image),
            is_active: self.is_active.clone(),
            is_featured: self.is_featured.clone(),
            rating: clean(&self.rating),
        }
    }

    /// Validate and convert into repository input.
    ///
    /// # Errors
    ///
    /// Returns the field messages when any value is missing or malformed.
    pub fn parse(&self) -> std::result::Result<ProductInput, FormErrors> {
        let mut errors = FormErrors::validate(self);
        for (field, value) in [
            ("name", &self.name),
            ("slug", &self.slug),
            ("description", &self.description),
        ] {
            errors.require(field, value);
        }

        let category_id = match self.category.parse::<i32>() {
            Ok(id) => Some(CategoryId::new(id)),
            Err(_) if self.category.is_empty() => {
                errors.add("category", REQUIRED);
                None
            }
            Err(_) => {
                errors.add("category", "Select a valid choice.");
                None
            }
        };
        let price = required_value(&mut errors, "price", &self.price, parse_money);
        let stock = required_value(&mut errors, "stock", &self.stock, parse_count);
        let rating = if self.rating.is_empty() {
            Some(Decimal::ZERO)
        } else {
            match parse_rating(&self.rating) {
                Ok(rating) => Some(rating),
                Err(e) => {
                    errors.add("rating", e);
                    None
                }
            }
        };

        match (category_id, price, stock, rating) {
            (Some(category_id), Some(price), Some(stock), Some(rating)) if errors.is_empty() => {
                Ok(ProductInput {
                    category_id,
                    name: self.name.clone(),
                    slug: self.slug.clone(),
                    description: self.description.clone(),
                    price,
                    stock,
                    main_image: optional(&self.main_image),
                    is_active: checkbox(self.is_active.as_ref()),
                    is_featured: checkbox(self.is_featured.as_ref()),
                    rating,
                })
            }
            _ => Err(errors),
        }
    }

    /// Whether `id` is the selected category.
    #[must_use]
    pub fn is_category(&self, id: CategoryId) -> bool {
        self.category == id.to_string()
    }
}

impl From<Product> for ProductForm {
    fn from(product: Product) -> Self {
        Self {
            category: product.category_id.to_string(),
            price: product.price_input(),
            stock: product.stock.to_string(),
            rating: format!("{:.2}", product.rating),
            is_active: product.is_active.then(|| "on".to_owned()),
            is_featured: product.is_featured.then(|| "on".to_owned()),
            name: product.name,
            slug: product.slug,
            description: product.description,
            main_image: product.main_image.unwrap_or_default(),
        }
    }
}

fn required_value<T>(
    errors: &mut FormErrors,
    field: &str,
    value: &str,
    parse: fn(&str) -> std::result::Result<T, &'static str>,
) -> Option<T> {
    if !errors.require(field, value) {
        return None;
    }
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            errors.add(field, e);
            None
        }
    }
}

/// Ratings are `NUMERIC(3, 2)`: 0.00 to 9.99.
fn parse_rating(value: &str) -> std::result::Result<Decimal, &'static str> {
    let rating = parse_money(value)?;
    if rating >= Decimal::TEN {
        return Err("Ensure that there are no more than 3 digits in total.");
    }
    Ok(rating)
}

// =============================================================================
// Templates
// =============================================================================

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/index.html")]
pub struct ProductsIndexTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub products: Vec<ProductSummary>,
    pub categories: Arc<Vec<Category>>,
    pub active_category: Option<CategoryId>,
    pub is_active: String,
    pub is_featured: String,
    pub query: String,
}

impl ProductsIndexTemplate {
    #[must_use]
    pub fn is_selected_category(&self, id: CategoryId) -> bool {
        self.active_category == Some(id)
    }
}

/// Product form template; also hosts the gallery when editing.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products/form.html")]
pub struct ProductFormTemplate {
    pub ctx: PageContext,
    pub current_path: &'static str,
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub errors: FormErrors,
    pub categories: Arc<Vec<Category>>,
    pub gallery: Vec<ProductImage>,
}

impl ProductFormTemplate {
    #[must_use]
    pub fn action(&self) -> String {
        self.product_id.map_or_else(
            || "/admin/products/new".to_owned(),
            |id| format!("/admin/products/{id}/edit"),
        )
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product list with filters and search.
#[instrument(skip(state, staff, ctx, query), fields(user_id = %staff.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse> {
    let filter = query.filter();
    let products = CatalogRepository::new(state.pool())
        .admin_products(&filter)
        .await?;

    Ok(ProductsIndexTemplate {
        ctx,
        current_path: "/admin/products",
        products,
        categories: state.categories().await?,
        active_category: filter.category_id,
        is_active: query.is_active.unwrap_or_default(),
        is_featured: query.is_featured.unwrap_or_default(),
        query: filter.query.unwrap_or_default(),
    })
}

/// Save one row of the list's inline editor.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn quick_edit(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<QuickEditForm>,
) -> Result<Response> {
    match form.parse() {
        Ok(edit) => {
            CatalogRepository::new(state.pool())
                .quick_edit_product(id, edit)
                .await?;
            tracing::info!(product_id = %id, price = %edit.price, stock = edit.stock, "Product quick edit");
            Flash::push(&session, FlashLevel::Success, "The product was changed.").await?;
        }
        Err(message) => {
            Flash::push(&session, FlashLevel::Error, message).await?;
        }
    }
    Ok(Redirect::to("/admin/products").into_response())
}

/// Empty product form.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn new_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    Ok(ProductFormTemplate {
        ctx,
        current_path: "/admin/products",
        product_id: None,
        form: ProductForm::blank(),
        errors: FormErrors::new(),
        categories: state.categories().await?,
        gallery: Vec::new(),
    })
}

/// Create a product.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, None, form).await
}

/// Edit form and gallery for an existing product.
#[instrument(skip(state, staff, ctx), fields(user_id = %staff.id))]
pub async fn edit_page(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ctx: PageContext,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductFormTemplate {
        ctx,
        current_path: "/admin/products",
        product_id: Some(id),
        form: product.into(),
        errors: FormErrors::new(),
        categories: state.categories().await?,
        gallery: catalog.product_images(id).await?,
    })
}

/// Update a product.
#[instrument(skip(state, staff, session, form), fields(user_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    save(&state, &session, Some(id), form).await
}

async fn save(
    state: &AppState,
    session: &Session,
    id: Option<ProductId>,
    form: ProductForm,
) -> Result<Response> {
    let form = form.cleaned();
    let catalog = CatalogRepository::new(state.pool());

    let errors = match form.parse() {
        Ok(input) => {
            let saved = match id {
                Some(id) => catalog.update_product(id, &input).await,
                None => catalog.create_product(&input).await,
            };
            match saved {
                Ok(product) => {
                    tracing::info!(product_id = %product.id, slug = %product.slug, "Product saved");
                    let verb = if id.is_some() { "changed" } else { "added" };
                    Flash::push(
                        session,
                        FlashLevel::Success,
                        format!("The product \"{}\" was {verb}.", product.name),
                    )
                    .await?;
                    return Ok(
                        Redirect::to(&format!("/admin/products/{}/edit", product.id)).into_response()
                    );
                }
                Err(RepositoryError::Conflict(_)) => {
                    let mut errors = FormErrors::new();
                    errors.add("slug", DUPLICATE_SLUG);
                    errors
                }
                // Foreign key violation: the chosen category is gone.
                Err(RepositoryError::Protected(_)) => {
                    let mut errors = FormErrors::new();
                    errors.add("category", "Select a valid choice.");
                    errors
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(errors) => errors,
    };

    let gallery = match id {
        Some(id) => catalog.product_images(id).await?,
        None => Vec::new(),
    };
    Ok(ProductFormTemplate {
        ctx: PageContext::from_session(session).await,
        current_path: "/admin/products",
        product_id: id,
        form,
        errors,
        categories: state.categories().await?,
        gallery,
    }
    .into_response())
}

/// Delete a product unless order history references it.
#[instrument(skip(state, staff, session), fields(user_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let catalog = CatalogRepository::new(state.pool());
    let product = catalog
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    match catalog.delete_product(id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, "Product deleted");
            Flash::push(
                &session,
                FlashLevel::Success,
                format!("The product \"{}\" was deleted.", product.name),
            )
            .await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(RepositoryError::Protected(_)) => {
            tracing::warn!(product_id = %id, "Product delete blocked by order history");
            Flash::push(
                &session,
                FlashLevel::Error,
                format!(
                    "Cannot delete the product \"{}\" because it appears in existing orders.",
                    product.name
                ),
            )
            .await?;
            Ok(Redirect::to(&format!("/admin/products/{id}/edit")).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Gallery
// =============================================================================

/// A parsed gallery upload form.
#[derive(Debug, Default)]
struct ImageUpload {
    file_name: Option<String>,
    data: Bytes,
    alt_text: String,
    is_main: bool,
    display_order: String,
}

impl ImageUpload {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut upload = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "image" => {
                    upload.file_name = field.file_name().map(ToOwned::to_owned);
                    upload.data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                }
                "alt_text" | "display_order" | "is_main" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?;
                    match name.as_str() {
                        "alt_text" => upload.alt_text = clean(&value),
                        "display_order" => upload.display_order = clean(&value),
                        _ => upload.is_main = true,
                    }
                }
                _ => {}
            }
        }
        Ok(upload)
    }

    /// Extension to store the file under, or the message to show.
    fn validate(&self) -> std::result::Result<(&'static str, i32), &'static str> {
        if self.data.is_empty() {
            return Err("Choose an image to upload.");
        }
        let extension = self
            .file_name
            .as_deref()
            .and_then(image_extension)
            .ok_or(INVALID_IMAGE)?;
        if self.alt_text.chars().count() > 255 {
            return Err("Alt text: ensure this value has at most 255 characters.");
        }
        let display_order = if self.display_order.is_empty() {
            0
        } else {
            parse_count(&self.display_order)?
        };
        Ok((extension, display_order))
    }
}

/// Normalized extension of an accepted image file name.
#[must_use]
pub fn image_extension(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .into_iter()
        .find(|candidate| *candidate == extension)
}

/// Resolve a stored media path under `root`, refusing anything that could
/// escape it.
#[must_use]
pub fn media_path(root: &FsPath, relative: &str) -> Option<PathBuf> {
    let relative = FsPath::new(relative);
    relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
        .then(|| root.join(relative))
}

/// Upload a gallery image (multipart form).
#[instrument(skip(state, staff, session, multipart), fields(user_id = %staff.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let edit_url = format!("/admin/products/{id}/edit");
    let catalog = CatalogRepository::new(state.pool());
    if catalog.get_product(id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let upload = ImageUpload::read(multipart).await?;
    let (extension, display_order) = match upload.validate() {
        Ok(valid) => valid,
        Err(message) => {
            Flash::push(&session, FlashLevel::Error, message).await?;
            return Ok(Redirect::to(&edit_url).into_response());
        }
    };

    let relative = format!("{GALLERY_DIR}/{}.{extension}", uuid::Uuid::new_v4());
    let path = state.config().media_dir.join(&relative);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("create media dir: {e}")))?;
    }
    tokio::fs::write(&path, &upload.data)
        .await
        .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

    let image = NewProductImage {
        product_id: id,
        image: relative,
        alt_text: upload.alt_text,
        is_main: upload.is_main,
        display_order,
    };
    let saved = match catalog.add_image(&image).await {
        Ok(saved) => saved,
        Err(e) => {
            remove_media_file(&path).await;
            return Err(e.into());
        }
    };

    let product_id = id.to_string();
    add_breadcrumb(
        "admin",
        "Gallery image uploaded",
        Some(&[("product_id", product_id.as_str())]),
    );
    tracing::info!(product_id = %id, image_id = %saved.id, bytes = upload.data.len(), "Gallery image uploaded");
    Flash::push(&session, FlashLevel::Success, "The image was uploaded.").await?;
    Ok(Redirect::to(&edit_url).into_response())
}

/// Delete a gallery image and its file.
#[instrument(skip(state, staff, session), fields(user_id = %staff.id))]
pub async fn delete_image(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    session: Session,
    Path((id, image_id)): Path<(ProductId, ProductImageId)>,
) -> Result<Response> {
    let image = CatalogRepository::new(state.pool())
        .delete_image(id, image_id)
        .await?;

    match media_path(&state.config().media_dir, &image.image) {
        Some(path) => remove_media_file(&path).await,
        None => tracing::warn!(image_id = %image_id, path = %image.image, "Not removing file outside media root"),
    }

    tracing::info!(product_id = %id, image_id = %image_id, "Gallery image deleted");
    Flash::push(&session, FlashLevel::Success, "The image was deleted.").await?;
    Ok(Redirect::to(&format!("/admin/products/{id}/edit")).into_response())
}

async fn remove_media_file(path: &FsPath) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove media file"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> ProductForm {
        ProductForm {
            category: "2".to_owned(),
            name: "Bamboo Toothbrush".to_owned(),
            description: "Biodegradable handle.".to_owned(),
            price: "249.90".to_owned(),
            stock: "50".to_owned(),
            rating: "4.50".to_owned(),
            is_active: Some("on".to_owned()),
            ..ProductForm::default()
        }
        .cleaned()
    }

    #[test]
    fn test_product_form_parses() {
        let input = valid_form().parse().unwrap();
        assert_eq!(input.category_id, CategoryId::new(2));
        assert_eq!(input.slug, "bamboo-toothbrush");
        assert_eq!(input.price, Decimal::new(24990, 2));
        assert_eq!(input.stock, 50);
        assert!(input.is_active);
        assert!(!input.is_featured);
        assert_eq!(input.main_image, None);
    }

    #[test]
    fn test_product_form_reports_each_field() {
        let form = ProductForm {
            category: "abc".to_owned(),
            price: "-5".to_owned(),
            stock: "many".to_owned(),
            rating: "10".to_owned(),
            ..ProductForm::default()
        }
        .cleaned();
        let errors = form.parse().unwrap_err();
        assert_eq!(errors.get("name"), [REQUIRED]);
        assert_eq!(errors.get("description"), [REQUIRED]);
        assert_eq!(errors.get("category"), ["Select a valid choice."]);
        assert!(errors.has("price"));
        assert_eq!(errors.get("stock"), ["Enter a whole number."]);
        assert!(errors.has("rating"));
    }

    #[test]
    fn test_blank_rating_is_zero() {
        let form = ProductForm {
            rating: String::new(),
            ..valid_form()
        };
        assert_eq!(form.parse().unwrap().rating, Decimal::ZERO);
    }

    #[test]
    fn test_blank_form_defaults() {
        let form = ProductForm::blank();
        assert!(checkbox(form.is_active.as_ref()));
        assert_eq!(form.stock, "0");
    }

    #[test]
    fn test_quick_edit_parse() {
        let edit = QuickEditForm {
            price: "19,90".to_owned(),
            stock: "3".to_owned(),
            is_active: None,
            is_featured: Some("on".to_owned()),
        }
        .parse()
        .unwrap();
        assert_eq!(edit.price, Decimal::new(1990, 2));
        assert!(!edit.is_active);
        assert!(edit.is_featured);

        let bad = QuickEditForm {
            price: "1".to_owned(),
            stock: "-1".to_owned(),
            ..QuickEditForm::default()
        };
        assert!(bad.parse().unwrap_err().starts_with("Stock:"));
    }

    #[test]
    fn test_list_query_filter() {
        let query = ProductListQuery {
            category: Some("4".to_owned()),
            is_active: Some("0".to_owned()),
            is_featured: Some(String::new()),
            q: Some(" bag ".to_owned()),
        };
        let filter = query.filter();
        assert_eq!(filter.category_id, Some(CategoryId::new(4)));
        assert_eq!(filter.is_active, Some(false));
        assert_eq!(filter.is_featured, None);
        assert_eq!(filter.query.as_deref(), Some("bag"));

        let junk = ProductListQuery {
            category: Some("x".to_owned()),
            ..ProductListQuery::default()
        };
        assert_eq!(junk.filter().category_id, None);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("photo.JPG"), Some("jpg"));
        assert_eq!(image_extension("leaf.webp"), Some("webp"));
        assert_eq!(image_extension("script.svg"), None);
        assert_eq!(image_extension("noext"), None);
    }

    #[test]
    fn test_upload_validation() {
        let upload = ImageUpload {
            file_name: Some("a.png".to_owned()),
            data: Bytes::from_static(b"\x89PNG"),
            display_order: "2".to_owned(),
            ..ImageUpload::default()
        };
        assert_eq!(upload.validate(), Ok(("png", 2)));

        let empty = ImageUpload::default();
        assert_eq!(empty.validate(), Err("Choose an image to upload."));

        let wrong = ImageUpload {
            file_name: Some("a.exe".to_owned()),
            data: Bytes::from_static(b"MZ"),
            ..ImageUpload::default()
        };
        assert_eq!(wrong.validate(), Err(INVALID_IMAGE));
    }

    #[test]
    fn test_media_path_stays_under_root() {
        let root = FsPath::new("/srv/media");
        assert_eq!(
            media_path(root, "products/gallery/a.jpg"),
            Some(PathBuf::from("/srv/media/products/gallery/a.jpg"))
        );
        assert_eq!(media_path(root, "../etc/passwd"), None);
        assert_eq!(media_path(root, "/etc/passwd"), None);
    }

    #[test]
    fn test_is_category() {
        let form = ProductForm {
            is_featured: Some("on".to_owned()),
            ..valid_form()
        };
        assert!(form.is_category(CategoryId::new(2)));
        assert!(!form.is_category(CategoryId::new(3)));
    }
}
