use persona_types::{SubjectEvent, SubjectId};

#[test]
fn removed_event_exposes_subject() {
    let subject = SubjectId::new();
    let event = SubjectEvent::Removed { subject };
    assert_eq!(event.subject(), subject);
}

#[test]
fn removed_event_serde_roundtrip() {
    let event = SubjectEvent::Removed {
        subject: SubjectId::new(),
    };
    let json = serde_json::to_string(&event).unwrap();
    let parsed: SubjectEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(event, parsed);
}

#[test]
fn removed_event_json_shape() {
    let subject = SubjectId::new();
    let event = SubjectEvent::Removed { subject };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["op"], "removed");
    assert_eq!(json["subject"], subject.to_string());
}
