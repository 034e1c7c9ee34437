use super::{slugify, CategorySource, Categorizer, Priority};
use crate::config::default_config;
use crate::endpoint::{Endpoint, HttpMethod};

fn endpoint(method: HttpMethod, path: &str) -> Endpoint {
    Endpoint::new(method, path)
}

#[test]
fn slugify_collapses_separators() {
    assert_eq!(slugify("Edge Applications"), "edge_applications");
    assert_eq!(slugify("/edge_applications/{param}/rules"), "edge_applications_param_rules");
    assert_eq!(slugify("  --Intelligent-DNS--  "), "intelligent_dns");
    assert_eq!(slugify("///"), "");
}

#[test]
fn every_default_keyword_maps_to_its_category() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);
    for rule in &config.category_rules {
        for keyword in &rule.keywords {
            let path = format!("/{keyword}/{{id}}");
            let categorization = categorizer.categorize(&endpoint(HttpMethod::Get, &path));
            assert_eq!(
                categorization.category, rule.category,
                "keyword {keyword:?} should map to {:?}",
                rule.category
            );
            assert_eq!(categorization.source, CategorySource::PathKeyword);
        }
    }
}

#[test]
fn rule_order_is_tag_then_parent_then_path_then_default() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);

    let mut tagged = endpoint(HttpMethod::Get, "/edge_applications/{id}");
    tagged.source_category = Some("Domains".to_string());
    tagged.tags = vec!["Intelligent DNS".to_string()];
    let result = categorizer.categorize(&tagged);
    assert_eq!(result.category, "dns");
    assert_eq!(result.source, CategorySource::Tag);

    let mut foldered = endpoint(HttpMethod::Get, "/edge_applications/{id}");
    foldered.source_category = Some("Domains".to_string());
    let result = categorizer.categorize(&foldered);
    assert_eq!(result.category, "domains");
    assert_eq!(result.source, CategorySource::ParentName);

    // A parent name with no known keyword falls through to the path.
    let mut plain_folder = endpoint(HttpMethod::Get, "/edge_applications/{id}");
    plain_folder.source_category = Some("Smoke".to_string());
    let result = categorizer.categorize(&plain_folder);
    assert_eq!(result.category, "edge_application");
    assert_eq!(result.source, CategorySource::PathKeyword);

    let result = categorizer.categorize(&endpoint(HttpMethod::Get, "/healthcheck"));
    assert_eq!(result.category, config.default_category);
    assert_eq!(result.source, CategorySource::Default);
}

#[test]
fn longest_keyword_wins_on_multi_keyword_paths() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);
    let result = categorizer.categorize(&endpoint(
        HttpMethod::Get,
        "/edge_applications/{id}/origins",
    ));
    assert_eq!(result.category, "edge_application");
    let result =
        categorizer.categorize(&endpoint(HttpMethod::Get, "/intelligent_dns/{id}/records"));
    assert_eq!(result.category, "dns");
}

#[test]
fn unknown_tag_becomes_its_own_category() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);
    let mut billing = endpoint(HttpMethod::Get, "/domains");
    billing.tags = vec![String::new(), "Billing Reports".to_string()];
    assert_eq!(categorizer.categorize(&billing).category, "billing_reports");
}

#[test]
fn readable_tag_joins_the_path_category() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);
    let mut tagged = endpoint(HttpMethod::Get, "/edge_applications");
    tagged.tags = vec!["Edge Applications".to_string()];
    let untagged = endpoint(HttpMethod::Get, "/edge_applications");

    let result = categorizer.categorize(&tagged);
    assert_eq!(result.category, "edge_application");
    assert_eq!(result.source, CategorySource::Tag);
    assert_eq!(
        categorizer.categorize_path(&untagged.normalized_path).category,
        result.category
    );
    assert_eq!(
        categorizer.apply(tagged).priority_score,
        categorizer.apply(untagged).priority_score
    );
}

#[test]
fn categorization_is_stable_across_runs() {
    let config = default_config();
    let mut sample = endpoint(HttpMethod::Put, "/network_lists/{id}");
    sample.source_category = Some("Firewall".to_string());
    let first = Categorizer::new(&config).categorize(&sample);
    for _ in 0..5 {
        assert_eq!(Categorizer::new(&config).categorize(&sample), first);
    }
}

#[test]
fn priority_combines_method_category_and_keywords() {
    let config = default_config();
    let categorizer = Categorizer::new(&config);

    let mut list = endpoint(HttpMethod::Get, "/edge_applications");
    list.name = Some("List edge applications".to_string());
    let scored = categorizer.apply(list);
    assert_eq!(scored.priority_score, 6);
    assert_eq!(scored.priority, Priority::High);

    let mut create = endpoint(HttpMethod::Post, "/domains");
    create.name = Some("Create domain".to_string());
    let scored = categorizer.apply(create);
    assert_eq!(scored.priority_score, 4);
    assert_eq!(scored.priority, Priority::Medium);

    let scored = categorizer.apply(endpoint(HttpMethod::Delete, "/users/{id}"));
    assert_eq!(scored.category, "iam");
    assert_eq!(scored.priority_score, 0);
    assert_eq!(scored.priority, Priority::Low);
}

#[test]
fn priority_thresholds() {
    assert_eq!(Priority::from_score(6), Priority::High);
    assert_eq!(Priority::from_score(5), Priority::Medium);
    assert_eq!(Priority::from_score(3), Priority::Medium);
    assert_eq!(Priority::from_score(2), Priority::Low);
}
