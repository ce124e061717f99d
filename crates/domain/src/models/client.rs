//! Client (CRM) domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::inquiry::Inquiry;

/// Pipeline stage of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Lead,
    Active,
    Completed,
    Archived,
}

impl ClientStatus {
    pub const ALL: [ClientStatus; 4] = [
        ClientStatus::Lead,
        ClientStatus::Active,
        ClientStatus::Completed,
        ClientStatus::Archived,
    ];

    /// Converts to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Lead => "lead",
            ClientStatus::Active => "active",
            ClientStatus::Completed => "completed",
            ClientStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lead" => Ok(ClientStatus::Lead),
            "active" => Ok(ClientStatus::Active),
            "completed" => Ok(ClientStatus::Completed),
            "archived" => Ok(ClientStatus::Archived),
            _ => Err(format!("Invalid client status: {}", s)),
        }
    }
}

/// Represents a client record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: ClientStatus,
    pub budget: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A client together with the inquiries linked to it.
#[derive(Debug, Clone, Serialize)]
pub struct ClientDetail {
    #[serde(flatten)]
    pub client: Client,
    pub inquiries: Vec<Inquiry>,
}

/// Request payload for creating a client.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateClientRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name is required (max 200 characters)"),
        custom(function = "shared::validation::validate_not_blank", message = "Name is required")
    )]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_email_format"))]
    pub email: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<String>,

    #[serde(default)]
    pub status: ClientStatus,

    #[validate(length(max = 100, message = "Budget must be at most 100 characters"))]
    pub budget: Option<String>,

    pub deadline: Option<NaiveDate>,

    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<f64>,

    pub notes: Option<String>,
}

/// Request payload for a partial client update.
///
/// An absent field is left unchanged. For the optional columns an explicit
/// `null` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateClientRequest {
    #[validate(
        length(min = 1, max = 200, message = "Name is required (max 200 characters)"),
        custom(function = "shared::validation::validate_not_blank", message = "Name is required")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "patch_field")]
    #[validate(custom(function = "shared::validation::validate_email_format"))]
    pub email: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<Option<String>>,

    pub status: Option<ClientStatus>,

    #[serde(default, deserialize_with = "patch_field")]
    #[validate(length(max = 100, message = "Budget must be at most 100 characters"))]
    pub budget: Option<Option<String>>,

    #[serde(default, deserialize_with = "patch_field")]
    pub deadline: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "patch_field")]
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<Option<f64>>,

    #[serde(default, deserialize_with = "patch_field")]
    pub notes: Option<Option<String>>,
}

/// Keeps a present `null` distinct from an absent field.
fn patch_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateClientRequest {
    /// Returns true if the request carries no changes.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.company.is_none()
            && self.status.is_none()
            && self.budget.is_none()
            && self.deadline.is_none()
            && self.cost.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in ClientStatus::ALL {
            assert_eq!(status.as_str().parse::<ClientStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("Active".parse::<ClientStatus>().unwrap(), ClientStatus::Active);
        assert!("prospect".parse::<ClientStatus>().is_err());
    }

    #[test]
    fn test_status_defaults_to_lead() {
        assert_eq!(ClientStatus::default(), ClientStatus::Lead);
        let req: CreateClientRequest = serde_json::from_str(r#"{"name":"Acme"}"#).unwrap();
        assert_eq!(req.status, ClientStatus::Lead);
    }

    #[test]
    fn test_unknown_status_rejected_by_serde() {
        let result: Result<CreateClientRequest, _> =
            serde_json::from_str(r#"{"name":"Acme","status":"vip"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreateClientRequest =
            serde_json::from_str(r#"{"name":"","email":"nope"}"#).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));

        let ok: CreateClientRequest = serde_json::from_str(
            r#"{"name":"Acme","email":"hi@acme.io","cost":1200.5,"deadline":"2025-03-01"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let req: CreateClientRequest =
            serde_json::from_str(r#"{"name":"Acme","cost":-1}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateClientRequest::default().is_empty());
        let req: UpdateClientRequest = serde_json::from_str(r#"{"status":"archived"}"#).unwrap();
        assert!(!req.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let req: UpdateClientRequest =
            serde_json::from_str(r#"{"notes":null,"cost":250.0,"deadline":null}"#).unwrap();
        assert_eq!(req.notes, Some(None));
        assert_eq!(req.cost, Some(Some(250.0)));
        assert_eq!(req.deadline, Some(None));
        assert_eq!(req.email, None);
        assert_eq!(req.name, None);
        assert!(!req.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_validates_set_values_only() {
        let cleared: UpdateClientRequest =
            serde_json::from_str(r#"{"email":null,"cost":null}"#).unwrap();
        assert!(cleared.validate().is_ok());

        let invalid: UpdateClientRequest =
            serde_json::from_str(r#"{"email":"nope","cost":-5}"#).unwrap();
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("cost"));
    }

    #[test]
    fn test_blank_names_rejected() {
        let create: CreateClientRequest = serde_json::from_str(r#"{"name":"   "}"#).unwrap();
        let errors = create.validate().unwrap_err();
        assert_eq!(errors.field_errors()["name"][0].code, "blank");

        let update: UpdateClientRequest = serde_json::from_str(r#"{"name":" \t"}"#).unwrap();
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_client_detail_flattens_client() {
        let now = Utc::now();
        let detail = ClientDetail {
            client: Client {
                id: 7,
                name: "Acme".into(),
                email: None,
                phone: None,
                company: None,
                status: ClientStatus::Active,
                budget: None,
                deadline: None,
                cost: None,
                notes: None,
                created_at: now,
                updated_at: now,
            },
            inquiries: vec![],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "active");
        assert!(json["inquiries"].as_array().unwrap().is_empty());
    }
}
