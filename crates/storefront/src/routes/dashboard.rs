//! Seller dashboard route handlers.
//!
//! Every handler requires an entrepreneur. Venture and product operations
//! first load the venture and check it belongs to the logged-in user, so a
//! seller never reaches the backend with someone else's IDs.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use venture_market_core::validation::{validate_product, validate_venture};
use venture_market_core::{Category, Product, ProductId, ValidationErrors, Venture, VentureId};

use crate::backend::{BackendError, ProductFilter};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{CspNonce, RequireEntrepreneur};
use crate::models::AuthState;
use crate::routes::views::{
    CategoryOption, FormErrors, NavView, ProductView, VentureView, flash_message, form_value,
    form_values, selected_ids,
};
use crate::state::AppState;

// =============================================================================
// Query and Form Types
// =============================================================================

/// Flash message query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct FlashQuery {
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Raw form pairs; repeated `categories` keys are kept.
type RawForm = Vec<(String, String)>;

/// Submitted venture form values.
struct VentureInput {
    name: String,
    description: String,
    categories: Vec<String>,
}

impl VentureInput {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            name: form_value(pairs, "name"),
            description: form_value(pairs, "description"),
            categories: form_values(pairs, "categories"),
        }
    }

    fn from_venture(venture: &Venture) -> Self {
        Self {
            name: venture.name.clone(),
            description: venture.description.clone().unwrap_or_default(),
            categories: selected_ids(&venture.category_ids()),
        }
    }
}

/// Submitted product form values.
struct ProductInput {
    name: String,
    description: String,
    price: String,
    stock: String,
    categories: Vec<String>,
}

impl ProductInput {
    fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            name: form_value(pairs, "name"),
            description: form_value(pairs, "description"),
            price: form_value(pairs, "price"),
            stock: form_value(pairs, "stock"),
            categories: form_values(pairs, "categories"),
        }
    }

    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.plain(),
            stock: product.stock.to_string(),
            categories: selected_ids(&product.category_ids()),
        }
    }

    const fn empty() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            price: String::new(),
            stock: String::new(),
            categories: Vec::new(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Dashboard overview template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/index.html")]
pub struct DashboardTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub ventures: Vec<VentureView>,
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

/// One owned venture with its products.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/venture.html")]
pub struct DashboardVentureTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub venture: VentureView,
    pub products: Vec<ProductView>,
    pub success: Option<&'static str>,
    pub error: Option<&'static str>,
}

/// Venture create/edit form.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/venture_form.html")]
pub struct VentureFormTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub heading: String,
    pub action: String,
    pub cancel_url: String,
    pub name: String,
    pub description: String,
    pub categories: Vec<CategoryOption>,
    pub errors: FormErrors,
}

/// Product create/edit form.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard/product_form.html")]
pub struct ProductFormTemplate {
    pub nav: NavView,
    pub nonce: String,
    pub heading: String,
    pub action: String,
    pub cancel_url: String,
    pub venture_name: String,
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub categories: Vec<CategoryOption>,
    pub errors: FormErrors,
}

// =============================================================================
// Helpers
// =============================================================================

/// Load a venture and check the logged-in user owns it.
async fn owned_venture(
    state: &AppState,
    auth: &AuthState,
    id: VentureId,
) -> Result<Venture, AppError> {
    let venture = state.backend().get_venture(id).await?;
    if venture.is_owned_by(auth.user.external_id) {
        Ok(venture)
    } else {
        tracing::warn!(
            venture = %id,
            user = %auth.user.external_id,
            "Dashboard access to a venture owned by someone else"
        );
        Err(AppError::Forbidden("You do not own this venture".to_string()))
    }
}

/// Load a product and the owned venture it belongs to.
async fn owned_product(
    state: &AppState,
    auth: &AuthState,
    id: ProductId,
) -> Result<(Product, Venture), AppError> {
    let product = state.backend().get_product(id).await?;
    let venture = owned_venture(state, auth, product.venture.external_id).await?;
    Ok((product, venture))
}

/// Form messages for a backend rejection, or the error to propagate.
fn rejected_form(err: BackendError) -> Result<(StatusCode, FormErrors), AppError> {
    match err {
        BackendError::Conflict(_) | BackendError::Rejected(_) => {
            let status = if matches!(err, BackendError::Conflict(_)) {
                StatusCode::CONFLICT
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            let message = err
                .user_message()
                .unwrap_or("The backend rejected these details")
                .to_string();
            Ok((status, FormErrors::form(message)))
        }
        other => Err(other.into()),
    }
}

fn invalid_form(errors: &ValidationErrors) -> (StatusCode, FormErrors) {
    (StatusCode::UNPROCESSABLE_ENTITY, FormErrors::from(errors))
}

fn venture_form(
    auth: &AuthState,
    nonce: String,
    target: Option<&Venture>,
    input: VentureInput,
    categories: &[Category],
    errors: FormErrors,
) -> VentureFormTemplate {
    let (heading, action, cancel_url) = match target {
        Some(venture) => (
            format!("Edit {}", venture.name),
            format!("/dashboard/ventures/{}", venture.external_id),
            format!("/dashboard/ventures/{}", venture.external_id),
        ),
        None => (
            "New venture".to_string(),
            "/dashboard/ventures".to_string(),
            "/dashboard".to_string(),
        ),
    };

    VentureFormTemplate {
        nav: NavView::new(Some(auth)),
        nonce,
        heading,
        action,
        cancel_url,
        categories: CategoryOption::list(categories, &input.categories),
        name: input.name,
        description: input.description,
        errors,
    }
}

fn product_form(
    auth: &AuthState,
    nonce: String,
    venture: &Venture,
    target: Option<&Product>,
    input: ProductInput,
    categories: &[Category],
    errors: FormErrors,
) -> ProductFormTemplate {
    let (heading, action) = match target {
        Some(product) => (
            format!("Edit {}", product.name),
            format!("/dashboard/products/{}", product.external_id),
        ),
        None => (
            "New product".to_string(),
            format!("/dashboard/ventures/{}/products", venture.external_id),
        ),
    };

    ProductFormTemplate {
        nav: NavView::new(Some(auth)),
        nonce,
        heading,
        action,
        cancel_url: format!("/dashboard/ventures/{}", venture.external_id),
        venture_name: venture.name.clone(),
        categories: CategoryOption::list(categories, &input.categories),
        name: input.name,
        description: input.description,
        price: input.price,
        stock: input.stock,
        errors,
    }
}

// =============================================================================
// Overview
// =============================================================================

/// Display the seller's own ventures.
#[instrument(skip(state, auth, nonce))]
pub async fn index(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Query(flash): Query<FlashQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ventures = state
        .backend()
        .list_ventures_by_owner(auth.user.external_id)
        .await?;

    Ok(DashboardTemplate {
        nav: NavView::new(Some(&auth)),
        nonce,
        ventures: ventures.iter().map(VentureView::from).collect(),
        success: flash.success.as_deref().and_then(flash_message),
        error: flash.error.as_deref().and_then(flash_message),
    })
}

// =============================================================================
// Ventures
// =============================================================================

/// Display the new-venture form.
#[instrument(skip(state, auth, nonce))]
pub async fn new_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.backend().list_categories().await?;
    let input = VentureInput {
        name: String::new(),
        description: String::new(),
        categories: Vec::new(),
    };

    Ok(venture_form(
        &auth,
        nonce,
        None,
        input,
        &categories,
        FormErrors::default(),
    ))
}

/// Handle the new-venture form.
#[instrument(skip(state, auth, nonce, form))]
pub async fn create_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Form(form): Form<RawForm>,
) -> Result<Response, AppError> {
    let input = VentureInput::from_pairs(&form);

    let failure = match validate_venture(&input.name, &input.description, &input.categories) {
        Ok(draft) => match state.backend().create_venture(&auth.token, &draft).await {
            Ok(venture) => {
                tracing::info!(venture = %venture.external_id, "Venture created");
                let target = format!(
                    "/dashboard/ventures/{}?success=venture_created",
                    venture.external_id
                );
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => rejected_form(e)?,
        },
        Err(errors) => invalid_form(&errors),
    };

    let categories = state.backend().list_categories().await?;
    let (status, errors) = failure;
    Ok((
        status,
        venture_form(&auth, nonce, None, input, &categories, errors),
    )
        .into_response())
}

/// Display one owned venture with its products.
#[instrument(skip(state, auth, nonce))]
pub async fn show_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(id): Path<VentureId>,
    Query(flash): Query<FlashQuery>,
) -> Result<impl IntoResponse, AppError> {
    let venture = owned_venture(&state, &auth, id).await?;
    let products = state
        .backend()
        .list_products(ProductFilter::venture(id))
        .await?;

    Ok(DashboardVentureTemplate {
        nav: NavView::new(Some(&auth)),
        nonce,
        venture: VentureView::from(&venture),
        products: products.iter().map(ProductView::from).collect(),
        success: flash.success.as_deref().and_then(flash_message),
        error: flash.error.as_deref().and_then(flash_message),
    })
}

/// Display the edit-venture form.
#[instrument(skip(state, auth, nonce))]
pub async fn edit_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(id): Path<VentureId>,
) -> Result<impl IntoResponse, AppError> {
    let venture = owned_venture(&state, &auth, id).await?;
    let categories = state.backend().list_categories().await?;
    let input = VentureInput::from_venture(&venture);

    Ok(venture_form(
        &auth,
        nonce,
        Some(&venture),
        input,
        &categories,
        FormErrors::default(),
    ))
}

/// Handle the edit-venture form.
#[instrument(skip(state, auth, nonce, form))]
pub async fn update_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(id): Path<VentureId>,
    Form(form): Form<RawForm>,
) -> Result<Response, AppError> {
    let venture = owned_venture(&state, &auth, id).await?;
    let input = VentureInput::from_pairs(&form);

    let failure = match validate_venture(&input.name, &input.description, &input.categories) {
        Ok(draft) => match state.backend().update_venture(&auth.token, id, &draft).await {
            Ok(_) => {
                let target = format!("/dashboard/ventures/{id}?success=venture_updated");
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => rejected_form(e)?,
        },
        Err(errors) => invalid_form(&errors),
    };

    let categories = state.backend().list_categories().await?;
    let (status, errors) = failure;
    Ok((
        status,
        venture_form(&auth, nonce, Some(&venture), input, &categories, errors),
    )
        .into_response())
}

/// Send a failed delete back to `page` with a flash code.
///
/// Auth, ownership and missing-resource failures keep their error page.
fn delete_failed(err: BackendError, page: &str) -> Result<Response, AppError> {
    let code = match err {
        BackendError::Unauthorized | BackendError::Forbidden | BackendError::NotFound(_) => {
            return Err(err.into());
        }
        BackendError::Conflict(_) | BackendError::Rejected(_) => "delete_rejected",
        other => {
            tracing::warn!("Delete failed: {other}");
            "backend"
        }
    };
    Ok(Redirect::to(&format!("{page}?error={code}")).into_response())
}

/// Delete an owned venture.
#[instrument(skip(state, auth))]
pub async fn delete_venture(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    Path(id): Path<VentureId>,
) -> Result<Response, AppError> {
    owned_venture(&state, &auth, id).await?;
    if let Err(e) = state.backend().delete_venture(&auth.token, id).await {
        return delete_failed(e, &format!("/dashboard/ventures/{id}"));
    }
    tracing::info!(venture = %id, "Venture deleted");

    Ok(Redirect::to("/dashboard?success=venture_deleted").into_response())
}

// =============================================================================
// Products
// =============================================================================

/// Display the new-product form for an owned venture.
#[instrument(skip(state, auth, nonce))]
pub async fn new_product(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(venture_id): Path<VentureId>,
) -> Result<impl IntoResponse, AppError> {
    let venture = owned_venture(&state, &auth, venture_id).await?;
    let categories = state.backend().list_categories().await?;

    Ok(product_form(
        &auth,
        nonce,
        &venture,
        None,
        ProductInput::empty(),
        &categories,
        FormErrors::default(),
    ))
}

/// Handle the new-product form.
#[instrument(skip(state, auth, nonce, form))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(venture_id): Path<VentureId>,
    Form(form): Form<RawForm>,
) -> Result<Response, AppError> {
    let venture = owned_venture(&state, &auth, venture_id).await?;
    let input = ProductInput::from_pairs(&form);

    let failure = match validate_product(
        &input.name,
        &input.description,
        &input.price,
        &input.stock,
        &input.categories,
    ) {
        Ok(draft) => match state
            .backend()
            .create_product(&auth.token, venture_id, &draft)
            .await
        {
            Ok(product) => {
                tracing::info!(product = %product.external_id, "Product created");
                let target =
                    format!("/dashboard/ventures/{venture_id}?success=product_created");
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => rejected_form(e)?,
        },
        Err(errors) => invalid_form(&errors),
    };

    let categories = state.backend().list_categories().await?;
    let (status, errors) = failure;
    Ok((
        status,
        product_form(&auth, nonce, &venture, None, input, &categories, errors),
    )
        .into_response())
}

/// Display the edit-product form.
#[instrument(skip(state, auth, nonce))]
pub async fn edit_product(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse, AppError> {
    let (product, venture) = owned_product(&state, &auth, id).await?;
    let categories = state.backend().list_categories().await?;
    let input = ProductInput::from_product(&product);

    Ok(product_form(
        &auth,
        nonce,
        &venture,
        Some(&product),
        input,
        &categories,
        FormErrors::default(),
    ))
}

/// Handle the edit-product form.
#[instrument(skip(state, auth, nonce, form))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    CspNonce(nonce): CspNonce,
    Path(id): Path<ProductId>,
    Form(form): Form<RawForm>,
) -> Result<Response, AppError> {
    let (product, venture) = owned_product(&state, &auth, id).await?;
    let input = ProductInput::from_pairs(&form);

    let failure = match validate_product(
        &input.name,
        &input.description,
        &input.price,
        &input.stock,
        &input.categories,
    ) {
        Ok(draft) => match state
            .backend()
            .update_product(&auth.token, id, venture.external_id, &draft)
            .await
        {
            Ok(_) => {
                let target = format!(
                    "/dashboard/ventures/{}?success=product_updated",
                    venture.external_id
                );
                return Ok(Redirect::to(&target).into_response());
            }
            Err(e) => rejected_form(e)?,
        },
        Err(errors) => invalid_form(&errors),
    };

    let categories = state.backend().list_categories().await?;
    let (status, errors) = failure;
    Ok((
        status,
        product_form(
            &auth,
            nonce,
            &venture,
            Some(&product),
            input,
            &categories,
            errors,
        ),
    )
        .into_response())
}

/// Delete an owned product.
#[instrument(skip(state, auth))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireEntrepreneur(auth): RequireEntrepreneur,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let (_, venture) = owned_product(&state, &auth, id).await?;
    let page = format!("/dashboard/ventures/{}", venture.external_id);
    if let Err(e) = state.backend().delete_product(&auth.token, id).await {
        return delete_failed(e, &page);
    }
    tracing::info!(product = %id, "Product deleted");

    Ok(Redirect::to(&format!("{page}?success=product_deleted")).into_response())
}
