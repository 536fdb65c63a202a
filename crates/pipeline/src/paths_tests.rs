use super::*;

fn path(p: &str) -> FilePath {
    FilePath::new(p).unwrap()
}

#[test]
fn test_single_star_stays_within_one_segment() {
    let filter = PathFilter::parse(["repositories/*.yml"]).unwrap();

    assert!(filter.selects(&path("repositories/sample-svc.yml")));
    assert!(!filter.selects(&path("repositories/nested/sample-svc.yml")));
    assert!(!filter.selects(&path("repositories/sample-svc.yaml")));
    assert!(!filter.selects(&path("other/repositories/sample-svc.yml")));
    assert!(!filter.selects(&path("README.md")));
}

#[test]
fn test_double_star_crosses_segments() {
    let filter = PathFilter::parse(["docs/**"]).unwrap();
    assert!(filter.selects(&path("docs/a/b/c.md")));
    assert!(!filter.selects(&path("src/docs/a.md")));

    let any_depth = PathFilter::parse(["**/*.yml"]).unwrap();
    assert!(any_depth.selects(&path("a.yml")));
    assert!(any_depth.selects(&path("x/y/a.yml")));
}

#[test]
fn test_question_mark_matches_one_character() {
    let filter = PathFilter::parse(["v?.txt"]).unwrap();
    assert!(filter.selects(&path("v1.txt")));
    assert!(!filter.selects(&path("v10.txt")));
}

#[test]
fn test_regex_metacharacters_are_literal() {
    let filter = PathFilter::parse(["a+b.(c).yml"]).unwrap();
    assert!(filter.selects(&path("a+b.(c).yml")));
    assert!(!filter.selects(&path("aab.(c).yml")));
}

#[test]
fn test_last_matching_pattern_wins() {
    let filter = PathFilter::parse([
        "repositories/*.yml",
        "!repositories/template.yml",
    ])
    .unwrap();
    assert!(filter.selects(&path("repositories/a.yml")));
    assert!(!filter.selects(&path("repositories/template.yml")));

    let reincluded = PathFilter::parse([
        "repositories/*.yml",
        "!repositories/t*.yml",
        "repositories/template.yml",
    ])
    .unwrap();
    assert!(reincluded.selects(&path("repositories/template.yml")));
    assert!(!reincluded.selects(&path("repositories/tools.yml")));
}

#[test]
fn test_selects_any() {
    let filter = PathFilter::parse(["repositories/*.yml"]).unwrap();
    let files = [path("README.md"), path("repositories/svc.yml")];
    assert!(filter.selects_any(&files));
    assert!(!filter.selects_any(&files[..1]));
    let none: [FilePath; 0] = [];
    assert!(!filter.selects_any(&none));
}

#[test]
fn test_empty_pattern_is_rejected() {
    assert!(PathPattern::parse("").is_err());
    assert!(PathPattern::parse("!").is_err());
}

#[test]
fn test_pattern_round_trips_through_serde() {
    let filter: PathFilter = serde_json::from_str(r#"["repositories/*.yml", "!x"]"#).unwrap();
    assert_eq!(filter.patterns().len(), 2);
    assert!(filter.patterns()[1].is_negated());
    assert_eq!(
        serde_json::to_string(&filter).unwrap(),
        r#"["repositories/*.yml","!x"]"#
    );
}
