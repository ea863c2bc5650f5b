use super::handlers::{
    auth, dashboard, health, purchase_orders, records, reports, sales, users,
};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Handlers sharing a path go into the same `routes!` call so they end up on
/// one method router. `OPTIONS /health`, Swagger UI and the frontend fallback
/// are attached in `api::new` and stay undocumented.
pub(crate) fn api_router() -> OpenApiRouter {
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::login))
        .routes(routes!(auth::logout))
        .routes(routes!(auth::current_session))
        .routes(routes!(users::list_users, users::create_user))
        .routes(routes!(users::update_user, users::delete_user))
        .routes(routes!(records::products::list, records::products::create))
        .routes(routes!(
            records::products::fetch,
            records::products::update,
            records::products::remove
        ))
        .routes(routes!(dashboard::product_details))
        .routes(routes!(records::categories::list, records::categories::create))
        .routes(routes!(
            records::categories::fetch,
            records::categories::update,
            records::categories::remove
        ))
        .routes(routes!(records::customers::list, records::customers::create))
        .routes(routes!(
            records::customers::fetch,
            records::customers::update,
            records::customers::remove
        ))
        .routes(routes!(records::suppliers::list, records::suppliers::create))
        .routes(routes!(
            records::suppliers::fetch,
            records::suppliers::update,
            records::suppliers::remove
        ))
        .routes(routes!(
            purchase_orders::list_orders,
            purchase_orders::create_order
        ))
        .routes(routes!(purchase_orders::get_order))
        .routes(routes!(purchase_orders::receive_order))
        .routes(routes!(purchase_orders::cancel_order))
        .routes(routes!(sales::list_sales, sales::checkout))
        .routes(routes!(dashboard::dashboard))
        .routes(routes!(reports::report))
        .routes(routes!(reports::export))
}

fn tags() -> Vec<Tag> {
    [
        ("depozit", "Point of sale and inventory API"),
        ("health", "Service and hosted backend status"),
        ("auth", "Sign in, sign out and the current session"),
        ("users", "Account management, admin only"),
        ("catalog", "Products, categories, customers and suppliers"),
        ("purchase-orders", "Supplier orders and stock receipt"),
        ("sales", "Checkout and sales history"),
        ("dashboard", "Daily counters and low stock"),
        ("reports", "Aggregated sales and purchase reports, admin only"),
    ]
    .into_iter()
    .map(|(name, description)| tag(name, description))
    .collect()
}

fn tag(name: &str, description: &str) -> Tag {
    let mut tag = Tag::new(name);
    tag.description = Some(description.to_string());
    tag
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Title, version, contact and license come from Cargo.toml.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).tags(Some(tags())).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    Some(value.trim()).filter(|trimmed| !trimmed.is_empty())
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|value| !value.is_empty())
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => (non_empty(name), non_empty(email.trim_end_matches('>'))),
        None => (non_empty(author), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, "depozit");
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some("Point of sale and inventory administration")
        );

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Depozit"));
            assert_eq!(contact.email.as_deref(), Some("team@depozit.ro"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        for name in ["depozit", "auth", "users", "catalog", "reports"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/health",
            "/api/auth/login",
            "/api/users/{user_id}",
            "/api/products/{id}",
            "/api/products/{id}/details",
            "/api/suppliers",
            "/api/purchase-orders/{id}/receive",
            "/api/sales",
            "/api/reports/export",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn shared_paths_keep_every_method() {
        let spec = openapi();
        let item = spec.paths.paths.get("/api/categories/{id}");
        assert!(item.is_some());
        if let Some(item) = item {
            assert!(item.get.is_some());
            assert!(item.patch.is_some());
            assert!(item.delete.is_some());
        }
    }

    #[test]
    fn author_parsing() {
        assert_eq!(
            parse_author("Team Depozit <team@depozit.ro>"),
            (Some("Team Depozit"), Some("team@depozit.ro"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<only@mail>"), (None, Some("only@mail")));
    }
}
