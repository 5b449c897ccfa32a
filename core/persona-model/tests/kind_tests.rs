use persona_model::ProfileKind;
use pretty_assertions::assert_eq;

#[test]
fn new_kind_defaults() {
    let kind = ProfileKind::new("contact", "Contact");
    assert_eq!(kind.id, "contact");
    assert_eq!(kind.label, "Contact");
    assert_eq!(kind.weight, 0);
    assert!(!kind.locked);
}

#[test]
fn builder_sets_weight_and_lock() {
    let kind = ProfileKind::new("billing", "Billing").with_weight(5).locked();
    assert_eq!(kind.weight, 5);
    assert!(kind.locked);
}

#[test]
fn serde_roundtrip() {
    let kind = ProfileKind::new("contact", "Contact").with_weight(-3);
    let json = serde_json::to_string(&kind).unwrap();
    let parsed: ProfileKind = serde_json::from_str(&json).unwrap();
    assert_eq!(kind, parsed);
}

#[test]
fn weight_and_locked_default_when_absent() {
    let parsed: ProfileKind =
        serde_json::from_str(r#"{"id": "contact", "label": "Contact"}"#).unwrap();
    assert_eq!(parsed.weight, 0);
    assert!(!parsed.locked);
}
