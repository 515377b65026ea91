use serde::{Deserialize, Serialize};

/// Where a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadSource {
    Homepage,
    GymPage,
    WellnessClubPage,
    CorporateWellness,
    EventPage,
}

/// What the lead asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeadInterest {
    Membership,
    PersonalTraining,
    GroupClasses,
    CorporateWellness,
}

/// Payload for `POST /leads`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadPayload {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub source: LeadSource,
    pub interest: LeadInterest,
    #[serde(rename = "gymId", default, skip_serializing_if = "Option::is_none")]
    pub gym_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
}

/// Payload for `POST /events/:id/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPayload {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationResponse {
    pub message: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lead_payload_wire_shape() {
        let lead = LeadPayload {
            name: "Asha Rao".into(),
            phone: "9880012345".into(),
            email: None,
            location: Some("HSR Layout".into()),
            source: LeadSource::CorporateWellness,
            interest: LeadInterest::CorporateWellness,
            gym_id: Some(3),
        };

        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "Asha Rao",
                "phone": "9880012345",
                "location": "HSR Layout",
                "source": "corporateWellness",
                "interest": "corporateWellness",
                "gymId": 3
            })
        );
    }

    #[test]
    fn test_optional_fields_omitted() {
        let lead = LeadPayload {
            name: "Dev".into(),
            phone: "9000000000".into(),
            email: None,
            location: None,
            source: LeadSource::Homepage,
            interest: LeadInterest::Membership,
            gym_id: None,
        };
        let value = serde_json::to_value(&lead).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("email"));
        assert!(!obj.contains_key("gymId"));
    }

    #[test]
    fn test_registration_round_trip() {
        let payload = RegistrationPayload {
            name: "Asha Rao".into(),
            phone: "9880012345".into(),
            email: "asha@example.com".into(),
        };
        let back: RegistrationPayload =
            serde_json::from_value(serde_json::to_value(&payload).unwrap()).unwrap();
        assert_eq!(back, payload);
    }
}
