//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, genres, health, home, instances, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "OpenShelf API",
        version = "1.0.0",
        description = "Library Catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        home::index,
        // Auth
        auth::login,
        auth::me,
        // Users
        users::create_user,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::create_genre,
        // Instances
        instances::list_instances,
        instances::get_instance,
        instances::create_instance,
        instances::update_instance,
        instances::delete_instance,
        instances::renewal_proposal,
        instances::renew_instance,
        instances::my_borrowed,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::AccountTypeSlug,
            crate::models::user::UserPermissions,
            // Books
            crate::models::book::Book,
            crate::models::book::BookShort,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Authors
            crate::models::author::Author,
            crate::models::author::AuthorQuery,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            // Genres
            crate::models::genre::Genre,
            crate::models::genre::CreateGenre,
            // Instances
            crate::models::instance::BookInstance,
            crate::models::instance::LoanStatus,
            crate::models::instance::InstanceQuery,
            crate::models::instance::CreateInstance,
            crate::models::instance::UpdateInstance,
            instances::BorrowedInstance,
            instances::RenewalProposalResponse,
            instances::RenewRequest,
            instances::MyLoansQuery,
            // Home
            home::CatalogCounts,
            home::HomeResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "home", description = "Home page summary"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management"),
        (name = "books", description = "Book catalog"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "instances", description = "Physical copies and renewal")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
