use osm2geojson::{AreaKeys, ConfigError, PolygonRules, RuleMode, Tags, is_area};
use std::io::Write;
use tempfile::NamedTempFile;

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn rules() -> PolygonRules {
    PolygonRules::new()
        .with_rule("building", RuleMode::All, Vec::<String>::new())
        .with_rule("indoor", RuleMode::All, Vec::<String>::new())
        .with_rule("natural", RuleMode::Whitelist, ["coastline", "tree_row"])
        .with_rule("highway", RuleMode::Blacklist, ["rest_area", "services"])
        .with_rule("barrier", RuleMode::Blacklist, ["hedge"])
}

#[test]
fn test_no_tags_is_not_area() {
    assert!(!is_area(&Tags::new(), &rules()));
}

#[test]
fn test_area_no_has_highest_precedence() {
    let t = tags(&[("area", "no"), ("type", "multipolygon"), ("building", "yes")]);
    assert!(!is_area(&t, &rules()));
}

#[test]
fn test_area_yes_overrides_line_rules() {
    let t = tags(&[("area", "yes"), ("highway", "steps")]);
    assert!(is_area(&t, &rules()));
    assert!(is_area(&tags(&[("area", "yes"), ("name", "x")]), &rules()));
}

#[test]
fn test_relation_type_makes_area() {
    assert!(is_area(&tags(&[("type", "multipolygon")]), &rules()));
    assert!(is_area(&tags(&[("type", "boundary")]), &rules()));
    assert!(is_area(
        &tags(&[("type", "multipolygon"), ("highway", "steps")]),
        &rules()
    ));
    assert!(!is_area(&tags(&[("type", "route")]), &rules()));
}

#[test]
fn test_area_other_value_falls_through() {
    let t = tags(&[("area", "unknown"), ("highway", "steps")]);
    assert!(!is_area(&t, &rules()));
}

#[test]
fn test_all_rule() {
    assert!(is_area(&tags(&[("building", "yes")]), &rules()));
}

#[test]
fn test_whitelist_rule_with_exceptions() {
    assert!(is_area(&tags(&[("natural", "wood")]), &rules()));
    assert!(!is_area(&tags(&[("natural", "coastline")]), &rules()));
}

#[test]
fn test_blacklist_rule_with_exceptions() {
    assert!(!is_area(&tags(&[("highway", "trunk")]), &rules()));
    assert!(!is_area(&tags(&[("highway", "service")]), &rules()));
    assert!(is_area(&tags(&[("highway", "rest_area")]), &rules()));
}

#[test]
fn test_line_vote_beats_area_vote() {
    let t = tags(&[("indoor", "yes"), ("highway", "steps")]);
    assert!(!is_area(&t, &rules()));

    let t = tags(&[("building", "yes"), ("natural", "coastline")]);
    assert!(!is_area(&t, &rules()));
}

#[test]
fn test_several_area_votes_agree() {
    let t = tags(&[("building", "yes"), ("indoor", "room"), ("natural", "scrub")]);
    assert!(is_area(&t, &rules()));
}

#[test]
fn test_unknown_keys_are_lines() {
    assert!(!is_area(&tags(&[("name", "Something Random")]), &rules()));
    assert!(!is_area(&tags(&[("building", "yes")]), &PolygonRules::new()));
}

#[test]
fn test_bundled_rules() {
    let bundled = PolygonRules::bundled().expect("bundled table parses");
    assert!(!bundled.is_empty());

    assert!(is_area(&tags(&[("building", "yes")]), &bundled));
    assert!(is_area(&tags(&[("highway", "rest_area")]), &bundled));
    assert!(!is_area(&tags(&[("highway", "service")]), &bundled));
    assert!(!is_area(&tags(&[("natural", "coastline")]), &bundled));
    assert!(is_area(&tags(&[("natural", "water")]), &bundled));
    assert!(!is_area(&tags(&[("barrier", "wall")]), &bundled));
}

#[test]
fn test_rules_from_json() {
    let json = r#"[
        {"key": "building", "mode": "all"},
        {"key": "highway", "mode": "blacklist", "values": ["services"]}
    ]"#;
    let parsed = PolygonRules::from_json_str(json).expect("Should parse rules");

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.get("building").map(|r| r.mode), Some(RuleMode::All));
    assert!(is_area(&tags(&[("highway", "services")]), &parsed));
}

#[test]
fn test_duplicate_rule_is_config_error() {
    let json = r#"[
        {"key": "building", "mode": "all"},
        {"key": "building", "mode": "whitelist", "values": ["no"]}
    ]"#;
    match PolygonRules::from_json_str(json) {
        Err(ConfigError::DuplicateRule(key)) => assert_eq!(key, "building"),
        other => panic!("expected duplicate rule error, got {:?}", other),
    }
}

#[test]
fn test_bad_mode_is_config_error() {
    let json = r#"[{"key": "building", "mode": "sometimes"}]"#;
    assert!(matches!(
        PolygonRules::from_json_str(json),
        Err(ConfigError::Json(_))
    ));
}

#[test]
fn test_rules_from_file() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"[{{"key": "leisure", "mode": "all"}}]"#).unwrap();

    let parsed = PolygonRules::from_path(file.path()).expect("Should load rules");
    assert!(is_area(&tags(&[("leisure", "park")]), &parsed));

    let missing = PolygonRules::from_path(std::path::Path::new("tests/does-not-exist.json"));
    assert!(matches!(missing, Err(ConfigError::Io { .. })));
}

#[test]
fn test_area_keys() {
    let keys = AreaKeys::from_json_str(
        r#"{"areaKeys": {"landuse": {}, "natural": {"coastline": true}}}"#,
    )
    .expect("Should parse area keys");

    assert!(keys.contains("landuse"));
    assert!(keys.contains("natural"));
    assert!(!keys.contains("name"));

    let kept = keys.retain(&tags(&[("landuse", "forest"), ("name", "Wood")]));
    assert_eq!(kept, tags(&[("landuse", "forest")]));
}
