//! Alert headers for entity responses: `X-{app}-alert`, `X-{app}-error` and `X-{app}-params`.

use crate::error::ConfigError;
use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue},
    response::Response,
};
use std::sync::Arc;

/// Marker left on a 400 response by the error translator; turned into headers by [`attach_failure_alert`].
#[derive(Clone, Debug)]
pub struct FailureAlert {
    pub entity_name: &'static str,
    pub error_key: &'static str,
    pub message: String,
}

/// Builds alert headers for one application name.
#[derive(Clone, Debug)]
pub struct Alerts {
    app_name: String,
    enable_translation: bool,
    alert: HeaderName,
    error: HeaderName,
    params: HeaderName,
}

impl Alerts {
    pub fn new(app_name: &str, enable_translation: bool) -> Result<Self, ConfigError> {
        let header = |suffix: &str| {
            HeaderName::from_bytes(format!("x-{}-{}", app_name.to_ascii_lowercase(), suffix).as_bytes()).map_err(|_| {
                ConfigError::Invalid {
                    key: "APP_NAME",
                    value: app_name.to_string(),
                    reason: "not usable in a header name",
                }
            })
        };
        Ok(Alerts {
            app_name: app_name.to_string(),
            enable_translation,
            alert: header("alert")?,
            error: header("error")?,
            params: header("params")?,
        })
    }

    pub fn entity_created(&self, entity_name: &str, param: &str) -> HeaderMap {
        let message = if self.enable_translation {
            format!("{}.{}.created", self.app_name, entity_name)
        } else {
            format!("A new {} is created with identifier {}", entity_name, param)
        };
        self.alert(&message, param)
    }

    pub fn entity_updated(&self, entity_name: &str, param: &str) -> HeaderMap {
        let message = if self.enable_translation {
            format!("{}.{}.updated", self.app_name, entity_name)
        } else {
            format!("A {} is updated with identifier {}", entity_name, param)
        };
        self.alert(&message, param)
    }

    pub fn entity_deleted(&self, entity_name: &str, param: &str) -> HeaderMap {
        let message = if self.enable_translation {
            format!("{}.{}.deleted", self.app_name, entity_name)
        } else {
            format!("A {} is deleted with identifier {}", entity_name, param)
        };
        self.alert(&message, param)
    }

    pub fn failure(&self, entity_name: &str, error_key: &str, default_message: &str) -> HeaderMap {
        let message = if self.enable_translation {
            format!("error.{}", error_key)
        } else {
            default_message.to_string()
        };
        let mut headers = HeaderMap::new();
        insert(&mut headers, &self.error, &message);
        insert(&mut headers, &self.params, entity_name);
        headers
    }

    fn alert(&self, message: &str, param: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        insert(&mut headers, &self.alert, message);
        insert(&mut headers, &self.params, param);
        headers
    }
}

/// Values come from entity names, ids and fixed messages; anything not header-safe is skipped.
fn insert(headers: &mut HeaderMap, name: &HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name.clone(), v);
        }
        Err(_) => tracing::warn!(header = %name, "dropping alert header with invalid value"),
    }
}

/// Response middleware: adds failure alert headers when the error translator left a [`FailureAlert`].
pub async fn attach_failure_alert(State(alerts): State<Arc<Alerts>>, mut response: Response) -> Response {
    if let Some(alert) = response.extensions_mut().remove::<FailureAlert>() {
        let headers = alerts.failure(alert.entity_name, alert.error_key, &alert.message);
        response.headers_mut().extend(headers);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
        headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or_default()
    }

    #[test]
    fn translated_alerts_use_keys() {
        let alerts = Alerts::new("myApp", true).unwrap();
        let headers = alerts.entity_created("a", "1");
        assert_eq!(header(&headers, "x-myapp-alert"), "myApp.a.created");
        assert_eq!(header(&headers, "x-myapp-params"), "1");

        let headers = alerts.failure("a", "idexists", "A new a cannot already have an ID");
        assert_eq!(header(&headers, "x-myapp-error"), "error.idexists");
        assert_eq!(header(&headers, "x-myapp-params"), "a");
    }

    #[test]
    fn untranslated_alerts_use_messages() {
        let alerts = Alerts::new("shop", false).unwrap();
        let headers = alerts.entity_updated("c", "12");
        assert_eq!(header(&headers, "x-shop-alert"), "A c is updated with identifier 12");
        let headers = alerts.entity_deleted("d", "4");
        assert_eq!(header(&headers, "x-shop-alert"), "A d is deleted with identifier 4");
        let headers = alerts.failure("b", "idnull", "Invalid id");
        assert_eq!(header(&headers, "x-shop-error"), "Invalid id");
    }

    #[test]
    fn rejects_app_name_unusable_in_header() {
        assert!(Alerts::new("my app", true).is_err());
    }
}
