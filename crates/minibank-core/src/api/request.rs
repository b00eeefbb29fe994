use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::ApiError;

/// A single logical outbound request.
///
/// `refresh_exempt` requests bypass the refresh coordinator entirely (the
/// refresh exchange itself). `retried` is set at most once, when the
/// coordinator replays the request after a refresh.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub payload: Option<Value>,
    refresh_exempt: bool,
    retried: bool,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: None,
            refresh_exempt: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.payload = Some(value);
        Ok(self)
    }

    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn refresh_exempt(mut self) -> Self {
        self.refresh_exempt = true;
        self
    }

    pub fn is_refresh_exempt(&self) -> bool {
        self.refresh_exempt
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Set the retried marker. Returns false if it was already set.
    pub fn mark_retried(&mut self) -> bool {
        !std::mem::replace(&mut self.retried, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retried_marker_is_set_once() {
        let mut req = RequestDescriptor::get("/api/accounts/1");
        assert!(!req.is_retried());
        assert!(req.mark_retried());
        assert!(req.is_retried());
        assert!(!req.mark_retried());
        assert!(req.is_retried());
    }

    #[test]
    fn test_builders() {
        let req = RequestDescriptor::post("/api/users/refresh")
            .with_json(&json!({"refreshToken": "r-1"}))
            .expect("encode refresh body")
            .refresh_exempt();

        assert_eq!(req.method, Method::POST);
        assert_eq!(req.path, "/api/users/refresh");
        assert!(req.is_refresh_exempt());
        assert_eq!(req.payload, Some(json!({"refreshToken": "r-1"})));

        let plain = RequestDescriptor::delete("/api/accounts/9");
        assert_eq!(plain.method, Method::DELETE);
        assert!(!plain.is_refresh_exempt());
        assert!(plain.payload.is_none());
        assert!(plain.query.is_empty());
    }

    #[test]
    fn test_query_pairs_accumulate() {
        let req = RequestDescriptor::get("/api/transfers/transactions/account/7/paginated")
            .with_query([("page", "0")])
            .with_query([("size".to_string(), "10".to_string())]);
        assert_eq!(
            req.query,
            vec![
                ("page".to_string(), "0".to_string()),
                ("size".to_string(), "10".to_string()),
            ]
        );
    }
}
