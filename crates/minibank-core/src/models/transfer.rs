use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    #[serde(rename = "fromAccountId")]
    pub from_account_id: String,
    #[serde(rename = "toAccountId")]
    pub to_account_id: String,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferResponse {
    #[serde(rename = "transactionId", default)]
    pub transaction_id: Option<i64>,
    #[serde(rename = "fromAccountId", default)]
    pub from_account_id: Option<String>,
    #[serde(rename = "toAccountId", default)]
    pub to_account_id: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "transactionDate", default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One entry of an account's transaction history, seen from that account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "fromAccountId", default)]
    pub from_account_id: Option<String>,
    #[serde(rename = "toAccountId", default)]
    pub to_account_id: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "transactionDate", default)]
    pub transaction_date: Option<String>,
    /// `INCOMING` or `OUTGOING`
    #[serde(rename = "transactionType", default)]
    pub transaction_type: Option<String>,
    #[serde(rename = "otherAccountId", default)]
    pub other_account_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    pub fn is_incoming(&self) -> bool {
        self.transaction_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("INCOMING"))
            .unwrap_or(false)
    }

    /// Amount signed from the account's perspective.
    pub fn signed_amount(&self) -> f64 {
        if self.is_incoming() {
            self.amount
        } else {
            -self.amount
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(rename = "currentPage")]
    pub current_page: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
    #[serde(rename = "hasNext")]
    pub has_next: bool,
    #[serde(rename = "hasPrevious")]
    pub has_previous: bool,
}

/// Optional filters for the unpaged transaction history endpoint.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub transaction_type: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl TransactionFilter {
    /// Query parameters for the set filters, in a stable order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(ref start) = self.start_date {
            pairs.push(("startDate".to_string(), start.clone()));
        }
        if let Some(ref end) = self.end_date {
            pairs.push(("endDate".to_string(), end.clone()));
        }
        if let Some(ref kind) = self.transaction_type {
            pairs.push(("type".to_string(), kind.clone()));
        }
        if let Some(min) = self.min_amount {
            pairs.push(("minAmount".to_string(), min.to_string()));
        }
        if let Some(max) = self.max_amount {
            pairs.push(("maxAmount".to_string(), max.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_page() {
        let json = r#"{
            "transactions": [
                {"id": 1, "fromAccountId": "a", "toAccountId": "b", "amount": 100.5, "status": "SUCCESS",
                 "transactionDate": "2024-05-01T10:00:00", "transactionType": "OUTGOING", "otherAccountId": "b"},
                {"id": 2, "fromAccountId": "b", "toAccountId": "a", "amount": 20, "status": "SUCCESS",
                 "transactionDate": "2024-05-02T10:00:00", "transactionType": "INCOMING", "otherAccountId": "b"}
            ],
            "currentPage": 0, "totalPages": 3, "totalElements": 12, "pageSize": 5,
            "hasNext": true, "hasPrevious": false
        }"#;
        let page: TransactionPage = serde_json::from_str(json).expect("parse transaction page");

        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.total_elements, 12);
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.transactions[0].signed_amount(), -100.5);
        assert!(page.transactions[1].is_incoming());
        assert_eq!(page.transactions[1].signed_amount(), 20.0);
    }

    #[test]
    fn test_filter_query_pairs() {
        assert!(TransactionFilter::default().query_pairs().is_empty());

        let filter = TransactionFilter {
            start_date: Some("2024-01-01".to_string()),
            transaction_type: Some("INCOMING".to_string()),
            min_amount: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("startDate".to_string(), "2024-01-01".to_string()),
                ("type".to_string(), "INCOMING".to_string()),
                ("minAmount".to_string(), "10".to_string()),
            ]
        );
    }
}
