//! Request description passed through the interceptor chain

use std::{collections::BTreeMap, time::Duration};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HttpError, Result};

/// One part of a multipart form
#[derive(Debug, Clone)]
pub enum FormPart {
    Text(String),
    Bytes {
        data: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

/// Binary form payload
///
/// Never contributes to URL template lookups.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Add a file field
    pub fn file(
        mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::Bytes {
                data: data.into(),
                file_name: Some(file_name.into()),
                mime: None,
            },
        ));
        self
    }

    /// Add a raw part
    pub fn part(mut self, name: impl Into<String>, part: FormPart) -> Self {
        self.parts.push((name.into(), part));
        self
    }

    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    pub(crate) fn into_reqwest(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for (name, part) in self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name, value),
                FormPart::Bytes {
                    data,
                    file_name,
                    mime,
                } => {
                    let mut part = reqwest::multipart::Part::bytes(data);
                    if let Some(file_name) = file_name {
                        part = part.file_name(file_name);
                    }
                    if let Some(mime) = mime {
                        part = part.mime_str(&mime)?;
                    }
                    form.part(name, part)
                }
            };
        }
        Ok(form)
    }
}

/// Request body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestBody {
    Json(Value),
    #[serde(skip)]
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Fields usable for URL template lookups
    pub fn lookup_fields(&self) -> Option<&Map<String, Value>> {
        match self {
            RequestBody::Json(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}

/// Request configuration
///
/// Hooks receive and return this value; the URL rewrite hook mutates `url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(with = "method_serde", default = "default_method")]
    pub method: Method,

    pub url: String,

    /// Query parameters, also visible to URL templates.
    ///
    /// `Some` with an empty map still counts as params being present, so
    /// URL templates are expanded from the environment alone.
    #[serde(default)]
    pub params: Option<Map<String, Value>>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<RequestBody>,

    /// Overrides the client timeout for this request
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: None,
            headers: BTreeMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Replace the query parameters
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a JSON body
    pub fn json(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(RequestBody::Json(body.into()));
        self
    }

    /// Set a multipart body
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Per-call options for the verb helpers
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: Option<Map<String, Value>>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Option<Duration>,
    /// Sent instead of any JSON data when present
    pub form: Option<MultipartForm>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the query parameters; an empty map still enables URL templates
    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.form = Some(form);
        self
    }

    /// Build the full request for a verb helper
    pub fn into_request(self, method: Method, url: &str, data: Option<Value>) -> RequestConfig {
        let body = match (self.form, data) {
            (Some(form), _) => Some(RequestBody::Multipart(form)),
            (None, Some(data)) => Some(RequestBody::Json(data)),
            (None, None) => None,
        };

        RequestConfig {
            method,
            url: url.to_string(),
            params: self.params,
            headers: self.headers,
            body,
            timeout: self.timeout,
        }
    }
}

impl TryFrom<Value> for RequestConfig {
    type Error = HttpError;

    fn try_from(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

fn default_method() -> Method {
    Method::GET
}

mod method_serde {
    use reqwest::Method;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Method, D::Error> {
        let name = String::deserialize(deserializer)?;
        Method::from_bytes(name.to_uppercase().as_bytes()).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let request = RequestConfig::post("/users${id}")
            .param("id", 5)
            .header("X-Trace", "t1")
            .json(json!({"name": "n"}));

        assert_eq!(request.method, Method::POST);
        assert!(request.has_params());
        assert!(request.has_body());
        assert_eq!(request.headers.get("X-Trace"), Some(&"t1".to_string()));
    }

    #[test]
    fn test_multipart_has_no_lookup_fields() {
        let body = RequestBody::Multipart(MultipartForm::new().text("id", "1"));
        assert!(body.lookup_fields().is_none());

        let body = RequestBody::Json(json!([1, 2]));
        assert!(body.lookup_fields().is_none());

        let body = RequestBody::Json(json!({"id": 1}));
        assert_eq!(body.lookup_fields().unwrap().get("id"), Some(&json!(1)));
    }

    #[test]
    fn test_options_prefer_form_over_data() {
        let request = RequestOptions::new()
            .multipart(MultipartForm::new().text("a", "b"))
            .into_request(Method::PUT, "/x", Some(json!({"ignored": true})));

        assert!(matches!(request.body, Some(RequestBody::Multipart(_))));
    }

    #[test]
    fn test_from_json_payload() {
        let request = RequestConfig::try_from(json!({
            "method": "patch",
            "url": "/items",
            "params": {"page": 2},
        }))
        .unwrap();

        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.url, "/items");
        assert_eq!(request.params.unwrap().get("page"), Some(&json!(2)));
        assert!(request.body.is_none());
    }

    #[test]
    fn test_empty_params_count_as_present() {
        let request = RequestConfig::get("/x");
        assert!(!request.has_params());

        let request = request.params(Map::new());
        assert!(request.has_params());

        let request = RequestOptions::new()
            .params(Map::new())
            .into_request(Method::GET, "/x", None);
        assert!(request.has_params());
    }
}
