//! Descriptor construction tests

use api_requests::models::{header, query, HttpVerb};
use api_requests::{
    ApiClient, ApiError, ApiFailure, ApiMethodProperties, ApiResponse, ApiResult, ClientConfig,
    ClientDescriptor, ErrorHandlerSpec, HeaderPart, Page, PaginatorSpec, QueryPart,
};

fn passthrough(_: &ApiClient, failure: ApiFailure) -> ApiResult<ApiResponse> {
    Ok(failure.response)
}

fn single_page(_: &ApiClient, response: &ApiResponse) -> ApiResult<Page> {
    Ok(Page::last(response.json()?))
}

fn assert_config_error<T: std::fmt::Debug>(result: ApiResult<T>) {
    match result {
        Err(ApiError::Configuration(_)) => {}
        other => panic!("Expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_method_properties_defaults() {
    let props = ApiMethodProperties::get("users");

    assert_eq!(props.http_verb, HttpVerb::Get);
    assert_eq!(props.api_method, "users");
    assert!(props.is_ok(200));
    assert!(!props.is_ok(201));
    assert!(props.error_codes.is_none());
    assert!(!props.pagination);
    assert!(props.extra.is_empty());
}

#[test]
fn test_verb_constructors() {
    let verbs = [
        (ApiMethodProperties::options("x").http_verb, "OPTIONS"),
        (ApiMethodProperties::head("x").http_verb, "HEAD"),
        (ApiMethodProperties::post("x").http_verb, "POST"),
        (ApiMethodProperties::put("x").http_verb, "PUT"),
        (ApiMethodProperties::patch("x").http_verb, "PATCH"),
        (ApiMethodProperties::delete("x").http_verb, "DELETE"),
    ];
    for (verb, name) in verbs {
        assert_eq!(verb.as_str(), name);
    }
}

#[test]
fn test_descriptor_registry() {
    let descriptor = ClientDescriptor::builder("Github")
        .config(ClientConfig::default().suffix("api/v3"))
        .headers(header(["Authorization"]))
        .header(HeaderPart::with_default("Accept", "application/json"))
        .queries(query([("per_page", "100")]))
        .method("get_user", ApiMethodProperties::get("user"))
        .method(
            "create_repo",
            ApiMethodProperties::post("user/repos")
                .ok_codes([201])
                .error_codes([422])
                .extra("docs", serde_json::json!("https://docs.example.com/repos")),
        )
        .build()
        .unwrap();

    assert_eq!(descriptor.name(), "Github");
    assert_eq!(descriptor.headers().len(), 2);
    assert_eq!(descriptor.queries(), &[QueryPart::with_default("per_page", "100")]);
    assert_eq!(descriptor.operations().collect::<Vec<_>>(), vec!["create_repo", "get_user"]);

    let create = descriptor.method("create_repo").unwrap();
    assert!(create.is_ok(201));
    assert!(create.is_expected_error(422));
    assert_eq!(create.extra["docs"], "https://docs.example.com/repos");
    assert!(descriptor.method("delete_repo").is_none());
}

#[test]
fn test_ok_and_error_codes_must_not_overlap() {
    let result = ClientDescriptor::builder("Overlap")
        .method("get", ApiMethodProperties::get("x").ok_codes([200, 204]).error_codes([204, 404]))
        .build();
    assert_config_error(result);
}

#[test]
fn test_empty_ok_codes_rejected() {
    let result = ClientDescriptor::builder("NoOk")
        .method("get", ApiMethodProperties::get("x").ok_codes(Vec::<u16>::new()))
        .build();
    assert_config_error(result);
}

#[test]
fn test_duplicate_operation_rejected() {
    let result = ClientDescriptor::builder("Dupes")
        .method("get", ApiMethodProperties::get("x"))
        .method("get", ApiMethodProperties::get("y"))
        .build();
    assert_config_error(result);
}

#[test]
fn test_reserved_template_keys_rejected() {
    let result = ClientDescriptor::builder("Reserved")
        .query(QueryPart::required("url"))
        .build();
    assert_config_error(result);

    let result = ClientDescriptor::builder("Reserved")
        .header(HeaderPart::required("suffix"))
        .build();
    assert_config_error(result);

    // A renamed base field frees the default name
    let result = ClientDescriptor::builder("Renamed")
        .config(ClientConfig::default().rename_base_field("host"))
        .query(QueryPart::required("url"))
        .build();
    assert!(result.is_ok());
}

#[test]
fn test_handler_for_unknown_operation_rejected() {
    let result = ClientDescriptor::builder("Handlers")
        .method("get", ApiMethodProperties::get("x"))
        .error_handler(ErrorHandlerSpec::new(passthrough).for_methods(["list"]))
        .build();
    assert_config_error(result);
}

#[test]
fn test_invalid_config_rejected() {
    let result = ClientDescriptor::builder("Timeout")
        .config(ClientConfig::default().request_timeout_sec(0.0))
        .build();
    assert_config_error(result);
}

#[test]
fn test_two_wildcard_paginators_rejected() {
    let result = ClientDescriptor::builder("Ambiguous")
        .method("list", ApiMethodProperties::get("items").paginated())
        .paginator(PaginatorSpec::new(single_page).named("first"))
        .paginator(PaginatorSpec::new(single_page).named("second"))
        .build();
    assert_config_error(result);
}

#[test]
fn test_paginated_operation_without_paginator_rejected() {
    let result = ClientDescriptor::builder("Missing")
        .method("list", ApiMethodProperties::get("items").paginated())
        .build();
    assert_config_error(result);
}

#[test]
fn test_paginator_resolution() {
    let descriptor = ClientDescriptor::builder("Resolved")
        .method("list", ApiMethodProperties::get("items").paginated())
        .method("search", ApiMethodProperties::get("search").paginated())
        .method("get", ApiMethodProperties::get("item"))
        .paginator(PaginatorSpec::new(single_page).named("wildcard"))
        .paginator(PaginatorSpec::new(single_page).named("search-only").for_methods(["search"]))
        .build()
        .unwrap();

    let name = |op: &str| descriptor.paginator_for(op).and_then(|spec| spec.name.clone());
    assert_eq!(name("list").as_deref(), Some("wildcard"));
    assert_eq!(name("search").as_deref(), Some("search-only"));
    assert_eq!(name("get"), None);
}

#[test]
fn test_unpaginated_operations_ignore_paginators() {
    // Ambiguity only matters for operations that paginate
    let result = ClientDescriptor::builder("Unused")
        .method("get", ApiMethodProperties::get("x"))
        .paginator(PaginatorSpec::new(single_page))
        .paginator(PaginatorSpec::new(single_page))
        .build();
    assert!(result.is_ok());
}
