/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use listings_proxy::cache::cache_key;
use listings_proxy::field_mapper::ToUpstreamForm;
use listings_proxy::models::{AgentSearchBody, LeadBody, RentalSearchBody};
use listings_proxy::normalizer::{normalize, xml_to_value};
use listings_proxy::validation::{is_valid_email, parse_body, Validate};
use proptest::prelude::*;
use serde_json::json;

// Property: normalization never panics, and anything unparseable comes back raw
proptest! {
    #[test]
    fn normalize_never_panics(body in "\\PC*") {
        let _ = normalize(Some("text/xml"), &body);
        let _ = normalize(None, &body);
    }

    #[test]
    fn unparseable_xml_is_returned_raw(body in "\\PC*") {
        if xml_to_value(&body).is_err() {
            prop_assert_eq!(normalize(Some("application/xml"), &body), json!({ "raw": body }));
        }
    }

    #[test]
    fn simple_elements_round_to_text(name in "[a-zA-Z][a-zA-Z0-9]{0,10}", text in "[a-zA-Z0-9 ]{0,30}") {
        let xml = format!("<{0}>{1}</{0}>", name, text);
        let value = xml_to_value(&xml).unwrap();
        prop_assert_eq!(value, json!({ name: text.trim() }));
    }
}

// Property: validation never panics on arbitrary bytes
proptest! {
    #[test]
    fn rental_validation_never_panics(body in proptest::collection::vec(any::<u8>(), 0..256)) {
        if let Ok(parsed) = parse_body::<RentalSearchBody>(&body) {
            let _ = parsed.validate();
        }
    }

    #[test]
    fn email_validation_never_panics(email in "\\PC*") {
        let _ = is_valid_email(&email);
    }
}

// Property: paging bounds
proptest! {
    #[test]
    fn page_size_in_range_accepted(page in 1i64..10_000, page_size in 1i64..=200) {
        let body = json!({"page": page, "page_size": page_size}).to_string();
        let search = parse_body::<AgentSearchBody>(body.as_bytes()).unwrap().validate().unwrap();
        prop_assert_eq!(search.paging.page as i64, page);
        prop_assert_eq!(search.paging.page_size as i64, page_size);
    }

    #[test]
    fn page_size_out_of_range_rejected(page_size in prop_oneof![i64::MIN..1i64, 201i64..i64::MAX]) {
        let body = json!({"page_size": page_size}).to_string();
        let result = parse_body::<AgentSearchBody>(body.as_bytes()).unwrap().validate();
        prop_assert!(result.is_err());
    }

    #[test]
    fn negative_counts_rejected(beds in i64::MIN..0i64) {
        let body = json!({"beds_min": beds}).to_string();
        let result = parse_body::<RentalSearchBody>(body.as_bytes()).unwrap().validate();
        prop_assert!(result.is_err());
    }
}

// Property: mapping and cache keys
proptest! {
    #[test]
    fn form_always_starts_with_api_key(key in "[a-zA-Z0-9]{0,40}", name in "[a-zA-Z ]{0,20}") {
        let body = json!({"name": name}).to_string();
        let search = parse_body::<AgentSearchBody>(body.as_bytes()).unwrap().validate().unwrap();
        let form = search.to_form(&key);
        prop_assert_eq!(form.pairs()[0].0, "api_key");
        prop_assert_eq!(form.pairs()[0].1.as_str(), key.as_str());
        // blank names are omitted, never sent empty
        prop_assert!(form.pairs().iter().all(|(_, v)| !v.is_empty() || v == &key));
    }

    #[test]
    fn lead_form_never_contains_empty_values(
        first in "[a-zA-Z]{1,10}",
        phone in proptest::option::of("[0-9 -]{0,12}"),
    ) {
        let body = json!({
            "first_name": first,
            "email": "lead@example.com",
            "phone": phone,
        })
        .to_string();
        let lead = parse_body::<LeadBody>(body.as_bytes()).unwrap().validate().unwrap();
        let form = lead.to_form("k");
        prop_assert!(form.pairs().iter().all(|(_, v)| !v.is_empty()));
    }

    #[test]
    fn equal_requests_share_a_cache_key(beds in 0i64..10, rent in 0i64..10_000) {
        let a = json!({"beds_min": beds, "rent_max": rent}).to_string();
        let b = format!(r#"{{"rent_max": {}, "beds_min": {}}}"#, rent, beds);
        let a = parse_body::<RentalSearchBody>(a.as_bytes()).unwrap().validate().unwrap();
        let b = parse_body::<RentalSearchBody>(b.as_bytes()).unwrap().validate().unwrap();
        prop_assert_eq!(
            cache_key("/api/rentals/search", &a).unwrap(),
            cache_key("/api/rentals/search", &b).unwrap()
        );
    }
}
