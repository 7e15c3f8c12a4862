use dcim_core::{
    Arch, Component, ComponentInput, ComponentValidationError, Flag, HardwareClass, NetType, Role,
    WireEnum,
};
use serde_json::json;
use uuid::Uuid;

fn scenario_body() -> serde_json::Value {
    json!({
        "xname": "x3000b7n3",
        "role": "compute",
        "class": "river",
        "arch": "x86_64",
        "net_type": "ethernet",
        "flag": "ok"
    })
}

#[test]
fn new_component_is_unsaved_and_valid() {
    let component = Component::new(
        "x3000b7n3",
        HardwareClass::River,
        Arch::X86_64,
        NetType::Ethernet,
        Role::Compute,
        Flag::Ok,
    );

    assert_eq!(component.uid, None);
    assert_eq!(component.validate(), Ok(()));
    assert_eq!(
        component.validate_for_update(),
        Err(ComponentValidationError::MissingUid)
    );
}

fn decode(body: serde_json::Value) -> Result<Component, ComponentValidationError> {
    serde_json::from_value::<ComponentInput>(body)
        .unwrap()
        .into_component()
}

#[test]
fn serialization_uses_wire_field_names() {
    let uid = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let mut component = decode(scenario_body()).unwrap();
    component.uid = Some(uid);
    component.arch = Arch::Aarch64;

    let value = serde_json::to_value(&component).unwrap();
    assert_eq!(value["uid"], uid.to_string());
    assert_eq!(value["xname"], "x3000b7n3");
    assert_eq!(value["class"], "river");
    assert_eq!(value["arch"], "aarch64");
    assert_eq!(value["net_type"], "ethernet");
    assert_eq!(value["role"], "compute");
    assert_eq!(value["flag"], "ok");
}

#[test]
fn unsaved_component_omits_uid_on_the_wire() {
    let component = decode(scenario_body()).unwrap();
    let value = serde_json::to_value(&component).unwrap();
    assert!(value.get("uid").is_none());
}

#[test]
fn input_decoding_drops_uid() {
    let mut body = scenario_body();
    body["uid"] = json!("11111111-2222-4333-8444-555555555555");

    let component = decode(body).unwrap();
    assert_eq!(component.uid, None);
}

#[test]
fn saved_component_output_decodes_back_as_input_without_uid() {
    let mut stored = decode(scenario_body()).unwrap();
    stored.uid = Some(Uuid::new_v4());

    let output = serde_json::to_value(&stored).unwrap();
    let reparsed = decode(output).unwrap();
    assert_eq!(reparsed, stored.without_uid());
}

#[test]
fn input_decoding_rejects_illegal_enum_value() {
    let mut body = scenario_body();
    body["net_type"] = json!("token ring");

    let err = decode(body).unwrap_err();
    assert_eq!(
        err.to_string(),
        "net_type `token ring` is not one of ethernet|infiniband|sling"
    );
}

#[test]
fn every_enum_field_reports_itself_when_empty() {
    for field in ["class", "arch", "net_type", "role", "flag"] {
        let mut body = scenario_body();
        body[field] = json!("");
        let input: ComponentInput = serde_json::from_value(body).unwrap();
        assert_eq!(
            input.into_component(),
            Err(ComponentValidationError::EmptyField(field)),
            "field {field}"
        );
    }
}

#[test]
fn missing_xname_is_rejected() {
    let mut body = scenario_body();
    body.as_object_mut().unwrap().remove("xname");
    let input: ComponentInput = serde_json::from_value(body).unwrap();

    let err = input.into_component().unwrap_err();
    assert_eq!(err, ComponentValidationError::EmptyField("xname"));
    assert_eq!(err.field(), "xname");
}

#[test]
fn legal_sets_round_trip_through_their_wire_names() {
    fn check<T: WireEnum + PartialEq + std::fmt::Debug>() {
        for value in T::ALL {
            assert_eq!(T::parse(value.as_str()), Some(*value));
        }
    }
    check::<HardwareClass>();
    check::<Arch>();
    check::<NetType>();
    check::<Role>();
    check::<Flag>();
}
