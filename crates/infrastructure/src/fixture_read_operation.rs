use async_trait::async_trait;
use dishpatch_application::{CapabilityDefinition, ReadOperation};
use dishpatch_core::AppResult;
use dishpatch_domain::IntentParameters;
use serde_json::{Map, Value, json};

/// In-memory read operation serving seeded records.
///
/// Scalar parameters whose key appears in a record act as case-insensitive
/// equality filters; `limit` caps the record count. Other parameters are ignored.
pub struct FixtureReadOperation {
    payload: FixturePayload,
}

enum FixturePayload {
    Records {
        records: Vec<Value>,
        envelope_field: Option<String>,
    },
    Single(Value),
}

impl FixtureReadOperation {
    /// Creates an operation returning records, wrapped in `envelope_field` when given.
    #[must_use]
    pub fn records(records: Vec<Value>, envelope_field: Option<&str>) -> Self {
        Self {
            payload: FixturePayload::Records {
                records,
                envelope_field: envelope_field.map(ToOwned::to_owned),
            },
        }
    }

    /// Creates an operation that always returns one record.
    #[must_use]
    pub fn single(record: Value) -> Self {
        Self {
            payload: FixturePayload::Single(record),
        }
    }

    /// Creates the development seed for a platform capability.
    #[must_use]
    pub fn seeded(definition: &CapabilityDefinition) -> Self {
        match definition.name {
            "analytics" => Self::single(json!({
                "period": "last_7_days",
                "orders": 4120,
                "revenue": 98214.75,
                "average_delivery_minutes": 31.4,
                "active_restaurants": 286,
                "active_delivery_partners": 913
            })),
            name => Self::records(seed_records(name), definition.envelope_field),
        }
    }
}

fn seed_records(capability: &str) -> Vec<Value> {
    match capability {
        "support-tickets" => vec![
            json!({"ticket_id": "TCK-1042", "status": "open", "priority": "high", "subject": "Order arrived cold", "order_id": "ORD-88121"}),
            json!({"ticket_id": "TCK-1039", "status": "open", "priority": "normal", "subject": "Refund not received", "order_id": "ORD-88017"}),
            json!({"ticket_id": "TCK-1031", "status": "resolved", "priority": "low", "subject": "Update phone number"}),
        ],
        "delivery-partners" => vec![
            json!({"partner_id": "DP-301", "name": "Arjun Mehta", "status": "online", "city": "Pune", "rating": 4.8}),
            json!({"partner_id": "DP-287", "name": "Sara Khan", "status": "offline", "city": "Delhi", "rating": 4.6}),
            json!({"partner_id": "DP-342", "name": "Lee Wong", "status": "pending_verification", "city": "Pune", "rating": null}),
        ],
        "restaurants" => vec![
            json!({"restaurant_id": "R-77", "name": "Spice Route", "status": "active", "city": "Pune", "cuisine": "Indian"}),
            json!({"restaurant_id": "R-91", "name": "Noodle Bar", "status": "pending_approval", "city": "Delhi", "cuisine": "Asian"}),
        ],
        "payments" => vec![
            json!({"payment_id": "PAY-5510", "status": "refunded", "amount": 18.5, "order_id": "ORD-88017"}),
            json!({"payment_id": "PAY-5512", "status": "captured", "amount": 42.0, "order_id": "ORD-88121"}),
        ],
        "reviews" => vec![
            json!({"review_id": "RV-220", "rating": 1, "status": "flagged", "restaurant_id": "R-77"}),
            json!({"review_id": "RV-221", "rating": 5, "status": "published", "restaurant_id": "R-91"}),
        ],
        "customers" => vec![
            json!({"customer_id": "C-1001", "name": "Priya Nair", "status": "active", "orders_count": 37}),
            json!({"customer_id": "C-1002", "name": "Tom Baker", "status": "suspended", "orders_count": 4}),
        ],
        "orders" => vec![
            json!({"order_id": "ORD-88121", "status": "pending", "restaurant_id": "R-77", "total": 42.0}),
            json!({"order_id": "ORD-88120", "status": "delivered", "restaurant_id": "R-91", "total": 23.4}),
            json!({"order_id": "ORD-88017", "status": "cancelled", "restaurant_id": "R-77", "total": 18.5}),
        ],
        _ => Vec::new(),
    }
}

fn matches_filters(record: &Value, filters: &[(&String, &Value)]) -> bool {
    filters.iter().all(|(key, expected)| {
        match (record.get(key.as_str()), expected) {
            (None, _) => true,
            (Some(Value::String(actual)), Value::String(expected)) => {
                actual.eq_ignore_ascii_case(expected)
            }
            (Some(actual), expected) => actual == *expected,
        }
    })
}

#[async_trait]
impl ReadOperation for FixtureReadOperation {
    async fn fetch(&self, parameters: &IntentParameters) -> AppResult<Value> {
        let (records, envelope_field) = match &self.payload {
            FixturePayload::Single(record) => return Ok(record.clone()),
            FixturePayload::Records {
                records,
                envelope_field,
            } => (records, envelope_field),
        };

        let filters: Vec<(&String, &Value)> = parameters
            .iter()
            .filter(|(key, value)| {
                key.as_str() != "limit" && (value.is_string() || value.is_number() || value.is_boolean())
            })
            .collect();
        let limit = parameters
            .get("limit")
            .and_then(Value::as_u64)
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);

        let matched: Vec<Value> = records
            .iter()
            .filter(|record| matches_filters(record, &filters))
            .take(limit)
            .cloned()
            .collect();

        Ok(match envelope_field {
            Some(field) => {
                let mut envelope = Map::new();
                envelope.insert("total".to_owned(), Value::from(matched.len()));
                envelope.insert(field.clone(), Value::Array(matched));
                Value::Object(envelope)
            }
            None => Value::Array(matched),
        })
    }
}

#[cfg(test)]
mod tests {
    use dishpatch_application::{CapabilityTableEntry, PLATFORM_CAPABILITIES, ReadOperation};
    use dishpatch_core::AppResult;
    use serde_json::{Map, Value, json};

    use super::FixtureReadOperation;

    fn parameters(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), value.clone()))
            .collect()
    }

    #[tokio::test]
    async fn every_platform_capability_has_seed_data() -> AppResult<()> {
        for entry in PLATFORM_CAPABILITIES {
            let CapabilityTableEntry::Capability(definition) = entry else {
                continue;
            };
            let payload = FixtureReadOperation::seeded(definition)
                .fetch(&Map::new())
                .await?;
            let populated = match definition.envelope_field {
                Some(field) => payload
                    .get(field)
                    .and_then(Value::as_array)
                    .is_some_and(|records| !records.is_empty()),
                None => payload.is_object(),
            };
            assert!(populated, "no seed data for {}", definition.name);
        }
        Ok(())
    }

    #[tokio::test]
    async fn scalar_parameters_filter_records() -> AppResult<()> {
        let operation = FixtureReadOperation::records(
            vec![
                json!({"ticket_id": "t-1", "status": "open"}),
                json!({"ticket_id": "t-2", "status": "resolved"}),
                json!({"ticket_id": "t-3", "status": "Open"}),
            ],
            Some("tickets"),
        );

        let payload = operation
            .fetch(&parameters(&[("status", json!("open")), ("since", json!("yesterday"))]))
            .await?;

        assert_eq!(payload.get("total"), Some(&json!(2)));
        assert_eq!(
            payload.get("tickets"),
            Some(&json!([
                {"ticket_id": "t-1", "status": "open"},
                {"ticket_id": "t-3", "status": "Open"}
            ]))
        );
        Ok(())
    }

    #[tokio::test]
    async fn limit_caps_records() -> AppResult<()> {
        let operation = FixtureReadOperation::records(
            vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})],
            None,
        );

        let payload = operation.fetch(&parameters(&[("limit", json!(2))])).await?;
        assert_eq!(payload, json!([{"id": 1}, {"id": 2}]));
        Ok(())
    }
}
