use chrono::Utc;
use invest_portal::models::{
    CreateEngagementRequest, EngagementRequest, EngagementStatus, EngagementType, ListingFilter,
    ListingStatus, MetricValue, Role, UpdateListingRequest,
};
use uuid::Uuid;

#[test]
fn test_role_wire_values() {
    assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""ADMIN""#);
    assert_eq!(
        serde_json::to_string(&Role::Contributor).unwrap(),
        r#""CONTRIBUTOR""#
    );
    assert_eq!(
        serde_json::to_string(&Role::Investor).unwrap(),
        r#""INVESTOR""#
    );
}

#[test]
fn test_listing_status_wire_values_and_review_order() {
    assert_eq!(
        serde_json::to_string(&ListingStatus::Pending).unwrap(),
        r#""PENDING""#
    );
    assert_eq!(
        serde_json::from_str::<ListingStatus>(r#""ARCHIVED""#).unwrap(),
        ListingStatus::Archived
    );
    // "status ascending" must sort review work before live rows.
    assert!(ListingStatus::Draft < ListingStatus::Pending);
    assert!(ListingStatus::Pending < ListingStatus::Active);
    assert!(ListingStatus::Active < ListingStatus::Archived);
}

#[test]
fn test_engagement_type_self_wire_value() {
    // The SELF variant carries an explicit rename; the others follow UPPERCASE.
    assert_eq!(
        serde_json::to_string(&EngagementType::SelfDirected).unwrap(),
        r#""SELF""#
    );
    assert_eq!(
        serde_json::from_str::<EngagementType>(r#""SELF""#).unwrap(),
        EngagementType::SelfDirected
    );
    assert_eq!(
        serde_json::to_string(&EngagementType::Managed).unwrap(),
        r#""MANAGED""#
    );
    assert_eq!(
        serde_json::to_string(&EngagementType::Fund).unwrap(),
        r#""FUND""#
    );
}

#[test]
fn test_engagement_request_serializes_type_key() {
    let engagement = EngagementRequest {
        id: Uuid::new_v4(),
        engagement_type: EngagementType::Fund,
        amount: 1_000.0,
        status: EngagementStatus::Pending,
        details: None,
        user_id: Uuid::new_v4(),
        listing_id: Uuid::new_v4(),
        created_at: Utc::now(),
    };

    let json_output = serde_json::to_string(&engagement).unwrap();

    // The JSON key must be "type", not "engagement_type".
    assert!(json_output.contains(r#""type":"FUND""#));
    assert!(!json_output.contains("engagement_type"));
}

#[test]
fn test_update_listing_request_omits_unset_fields() {
    let partial_update = UpdateListingRequest {
        title: Some("New Title Only".to_string()),
        ..UpdateListingRequest::default()
    };

    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    // None fields are omitted entirely.
    assert!(!json_output.contains("description"));
    assert!(!json_output.contains("status"));
}

#[test]
fn test_metric_values_deserialize_untagged() {
    let parsed: std::collections::BTreeMap<String, MetricValue> = serde_json::from_str(
        r#"{ "homesServed": 50000, "co2Reduced": 15000.5, "note": "phase one" }"#,
    )
    .unwrap();

    assert_eq!(parsed["homesServed"], MetricValue::Number(50000.0));
    assert_eq!(parsed["co2Reduced"], MetricValue::Number(15000.5));
    assert_eq!(parsed["note"], MetricValue::Text("phase one".to_string()));

    // Round trip preserves the shape.
    let json_output = serde_json::to_string(&parsed).unwrap();
    assert!(json_output.contains(r#""note":"phase one""#));
    assert!(json_output.contains(r#""homesServed":50000"#));
}

#[test]
fn test_listing_filter_uses_camel_case_parameter_names() {
    let filter: ListingFilter = serde_json::from_value(serde_json::json!({
        "country": "KE",
        "minSize": 1000.0,
        "maxSize": 50000.0,
        "minReturn": 10.0,
        "q": "solar"
    }))
    .unwrap();

    assert_eq!(filter.country.as_deref(), Some("KE"));
    assert_eq!(filter.min_size, Some(1000.0));
    assert_eq!(filter.max_size, Some(50000.0));
    assert_eq!(filter.min_return, Some(10.0));
    assert_eq!(filter.q.as_deref(), Some("solar"));
    assert!(filter.sector.is_none());
}

#[test]
fn test_create_engagement_request_has_no_identity_field() {
    // A payload smuggling a user id still deserializes, and the struct simply
    // has nowhere to put it: identity comes from the session only.
    let parsed: CreateEngagementRequest = serde_json::from_value(serde_json::json!({
        "listing_id": Uuid::new_v4(),
        "type": "SELF",
        "amount": 250.0,
        "user_id": Uuid::new_v4()
    }))
    .unwrap();

    assert_eq!(parsed.engagement_type, Some(EngagementType::SelfDirected));
    assert_eq!(parsed.amount, Some(250.0));
}
