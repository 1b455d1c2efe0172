//! Property tests for request matching.

use hermes_router::{EndpointDeclaration, Router, ServiceDescriptor};
use http::Method;
use proptest::prelude::*;

fn router_with(paths: &[(&str, &str)]) -> Router {
    let mut router = Router::new();
    let service = ServiceDescriptor::new("props", "/");
    for (name, path) in paths {
        let decl = EndpointDeclaration {
            name: (*name).into(),
            method: "GET".into(),
            path: (*path).into(),
            ..Default::default()
        };
        router.register(&service, &decl).expect("declaration is valid");
    }
    router
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,11}"
}

proptest! {
    #[test]
    fn int_values_bind_to_int_placeholders(id in any::<i64>()) {
        let router = router_with(&[("byId", "/users/{id:int}")]);
        let found = router.match_route(&Method::GET, &format!("/users/{id}")).unwrap();
        let expected = id.to_string();
        prop_assert_eq!(found.params.get("id"), Some(expected.as_str()));
    }

    #[test]
    fn string_values_bind_even_when_they_collide(value in segment()) {
        // Every generated value is also a literal somewhere else.
        let decoy = format!("/decoys/{value}");
        let router = router_with(&[("byName", "/users/{name:string}"), ("decoy", decoy.as_str())]);
        let found = router.match_route(&Method::GET, &format!("/users/{value}")).unwrap();
        prop_assert_eq!(found.descriptor.name.as_str(), "byName");
        prop_assert_eq!(found.params.get("name"), Some(value.as_str()));
    }

    #[test]
    fn bool_values_bind_to_bool_placeholders(flag in any::<bool>(), upper in any::<bool>()) {
        let router = router_with(&[("flag", "/flags/{on:bool}")]);
        let raw = if upper { flag.to_string().to_uppercase() } else { flag.to_string() };
        let found = router.match_route(&Method::GET, &format!("/flags/{raw}")).unwrap();
        prop_assert_eq!(found.params.get("on"), Some(raw.as_str()));
    }

    #[test]
    fn trailing_segments_are_captured_in_order(parts in prop::collection::vec(segment(), 1..6)) {
        let router = router_with(&[("files", "/files/{...:string}")]);
        let found = router
            .match_route(&Method::GET, &format!("/files/{}", parts.join("/")))
            .unwrap();
        prop_assert_eq!(found.trailing, parts);
    }

    #[test]
    fn non_integers_still_match_int_placeholders(value in segment()) {
        // conversion, not matching, rejects the value
        let router = router_with(&[("byId", "/users/{id:int}")]);
        let found = router.match_route(&Method::GET, &format!("/users/{value}")).unwrap();
        prop_assert_eq!(found.descriptor.name.as_str(), "byId");
        prop_assert_eq!(found.params.get("id"), Some(value.as_str()));
    }

    #[test]
    fn foreign_roots_never_match(value in segment()) {
        let router = router_with(&[("byId", "/users/{id:int}")]);
        let path = format!("/accounts/{value}");
        prop_assert!(router.match_route(&Method::GET, &path).is_none());
    }
}
