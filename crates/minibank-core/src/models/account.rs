use std::fmt;

use serde::{Deserialize, Serialize};

/// Currency/asset type of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    #[serde(rename = "TRY")]
    TurkishLira,
    #[serde(rename = "USD")]
    UsDollar,
    #[serde(rename = "GOLD")]
    Gold,
}

impl AccountType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRY" => Some(AccountType::TurkishLira),
            "USD" => Some(AccountType::UsDollar),
            "GOLD" => Some(AccountType::Gold),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AccountType::TurkishLira => "TRY",
            AccountType::UsDollar => "USD",
            AccountType::Gold => "GOLD",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "accountType", default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub balance: f64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

impl Account {
    pub fn display_name(&self) -> String {
        match (&self.name, &self.number) {
            (Some(name), Some(number)) => format!("{} ({})", name, number),
            (Some(name), None) => name.clone(),
            (None, Some(number)) => number.clone(),
            (None, None) => self.id.clone(),
        }
    }
}

/// Account search filter. An empty filter serializes as `{}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountCreateRequest {
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: AccountType,
    #[serde(rename = "initialBalance")]
    pub initial_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountUpdateRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountBalance {
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub balance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_serializes_to_empty_object() {
        let body = serde_json::to_value(AccountSearch::default()).expect("serialize search");
        assert_eq!(body, serde_json::json!({}));

        let body = serde_json::to_value(AccountSearch {
            number: Some("ACC123456".to_string()),
            name: None,
        })
        .expect("serialize search");
        assert_eq!(body, serde_json::json!({"number": "ACC123456"}));
    }

    #[test]
    fn test_parse_account() {
        let json = r#"{"id":"550e8400-e29b-41d4-a716-446655440000","number":"ACC123456","name":"My Savings Account","accountType":"TRY","balance":1500.50,"createdAt":"2024-05-01T10:00:00"}"#;
        let account: Account = serde_json::from_str(json).expect("parse account");
        assert_eq!(account.balance, 1500.50);
        assert_eq!(account.display_name(), "My Savings Account (ACC123456)");
        assert!(account.updated_at.is_none());
    }

    #[test]
    fn test_account_type_parse() {
        assert_eq!(AccountType::parse("try"), Some(AccountType::TurkishLira));
        assert_eq!(AccountType::parse(" GOLD "), Some(AccountType::Gold));
        assert_eq!(AccountType::parse("EUR"), None);

        let req = AccountCreateRequest {
            name: "Dollars".to_string(),
            account_type: AccountType::UsDollar,
            initial_balance: 0.0,
        };
        let body = serde_json::to_value(req).expect("serialize create request");
        assert_eq!(body["accountType"], "USD");
        assert_eq!(body["initialBalance"], 0.0);
    }
}
