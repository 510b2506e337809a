//! Per-endpoint request functions.
//!
//! Each arm of `dispatch` turns the raw form values into the request shape of
//! one endpoint and sends it through the shared `ApiClient`. Conversions that
//! can fail (JSON long-text fields, numeric ids) happen before anything is
//! sent, so a bad value never reaches the network.

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::EndpointId;
use crate::client::ApiClient;
use crate::endpoint::{EndpointDescriptor, FieldSpec};
use crate::error::ApiError;
use crate::form::{Form, FormState};
use crate::response::{Notification, Notifier, Outcome};
use crate::transport::Transport;
use crate::types::{Credentials, OtpVerification, RegisterCompany, RegisterUser};

pub const TOKEN_SAVED_NOTICE: &str = "JWT token saved!";

/// Submits `form` to the endpoint it was built for.
///
/// Returns `None` if the form already has a submission in flight.
pub async fn submit<T: Transport>(
    form: &Form,
    client: &ApiClient<T>,
    endpoint: EndpointId,
    notifier: &dyn Notifier,
) -> Option<Outcome> {
    form.submit(|state| async move { dispatch(client, endpoint, &state, notifier).await })
        .await
}

pub async fn dispatch<T: Transport>(
    client: &ApiClient<T>,
    endpoint: EndpointId,
    form: &FormState,
    notifier: &dyn Notifier,
) -> Result<Value, ApiError> {
    let descriptor = endpoint.descriptor();
    debug!(%endpoint, "building request");

    match endpoint {
        EndpointId::RegisterUser => {
            let body = RegisterUser {
                email: form.value("email").to_string(),
                password: form.value("password").to_string(),
                name: form.value("name").to_string(),
            };
            client.post_json(descriptor.path, &body).await
        }
        EndpointId::VerifyOtp => {
            let check = OtpVerification {
                email: form.value("email").to_string(),
                otp: form.value("otp").to_string(),
            };
            client.post_query(descriptor.path, &check.query()).await
        }
        EndpointId::Login => {
            let credentials = Credentials {
                email: form.value("email").to_string(),
                password: form.value("password").to_string(),
            };
            let payload = client
                .post_query(descriptor.path, &credentials.query())
                .await?;
            store_token(client, &payload, notifier);
            Ok(payload)
        }
        EndpointId::RegisterCompany => {
            let body = RegisterCompany {
                email: form.value("email").to_string(),
                name: form.value("name").to_string(),
            };
            client.post_json(descriptor.path, &body).await
        }
        EndpointId::CompanyByTrustCode | EndpointId::EmployeeByTrustCode => {
            let path = text_path(descriptor, form);
            client.get(&path).await
        }
        EndpointId::EmployeeById | EndpointId::VerificationById => {
            let path = numeric_path(descriptor, form)?;
            client.get(&path).await
        }
        EndpointId::AllCompanies | EndpointId::AllVerifications => {
            client.get(descriptor.path).await
        }
        EndpointId::CreateEmployee => {
            let body = form.parse_field(spec(descriptor, "employee")?)?;
            client.post_json(descriptor.path, &body).await
        }
        EndpointId::SubmitVerification => {
            let body = form.parse_field(spec(descriptor, "request")?)?;
            client.post_json(descriptor.path, &body).await
        }
    }
}

/// Makes the login payload the session token. The payload is opaque: a JSON
/// string is used as-is, anything else by its JSON text. Surrounding
/// whitespace is dropped so the token matches what storage hands back.
fn store_token<T: Transport>(client: &ApiClient<T>, payload: &Value, notifier: &dyn Notifier) {
    let text = match payload {
        Value::String(token) => token.clone(),
        other => other.to_string(),
    };
    let token = text.trim();
    if token.is_empty() {
        warn!("login succeeded without a token");
        notifier.notify(Notification::failure("Login response carried no token"));
        return;
    }
    // Must survive as an `Authorization` header value.
    if token.chars().any(char::is_control) {
        warn!("login token contains control characters");
        notifier.notify(Notification::failure(
            "Login response carried a token that cannot be sent as a header",
        ));
        return;
    }
    match client.session().set(token) {
        Ok(()) => notifier.notify(Notification::success(TOKEN_SAVED_NOTICE)),
        Err(e) => notifier.notify(Notification::failure(format!(
            "Token is active for this session only: {e}"
        ))),
    }
}

fn spec(
    descriptor: &'static EndpointDescriptor,
    name: &str,
) -> Result<&'static FieldSpec, ApiError> {
    descriptor
        .field(name)
        .ok_or_else(|| ApiError::UnknownField(name.to_string()))
}

fn text_path(descriptor: &EndpointDescriptor, form: &FormState) -> String {
    let params: Vec<(&str, &str)> = descriptor
        .placeholders()
        .map(|name| (name, form.value(name)))
        .collect();
    descriptor.render_path(&params)
}

fn numeric_path(
    descriptor: &'static EndpointDescriptor,
    form: &FormState,
) -> Result<String, ApiError> {
    let values = descriptor
        .placeholders()
        .map(|name| {
            let spec = spec(descriptor, name)?;
            let raw = form.value(spec.name);
            let id = raw.trim().parse::<i64>().map_err(|_| ApiError::InputError {
                field: spec.name.to_string(),
                message: format!("'{raw}' is not a whole number"),
            })?;
            Ok((name, id.to_string()))
        })
        .collect::<Result<Vec<_>, ApiError>>()?;
    let params: Vec<(&str, &str)> = values
        .iter()
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    Ok(descriptor.render_path(&params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::response::NotificationLevel;
    use crate::session::{FileTokenStorage, Session};
    use crate::testing::{RecordingNotifier, RecordingTransport};
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        client: ApiClient<Arc<RecordingTransport>>,
        transport: Arc<RecordingTransport>,
        notifier: RecordingNotifier,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(RecordingTransport::new());
        Fixture {
            client: ApiClient::new(
                "https://api.test",
                Arc::new(Session::in_memory()),
                transport.clone(),
            ),
            transport,
            notifier: RecordingNotifier::default(),
        }
    }

    fn state(pairs: &[(&str, &str)]) -> FormState {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn login_stores_the_returned_token() {
        let f = fixture();
        f.transport.respond(200, "tok123");
        let payload = dispatch(
            &f.client,
            EndpointId::Login,
            &state(&[("email", "a@b.com"), ("password", "x")]),
            &f.notifier,
        )
        .await
        .unwrap();

        assert_eq!(payload, json!("tok123"));
        assert_eq!(f.client.session().get().as_deref(), Some("tok123"));
        let sent = f.transport.requests();
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(
            sent[0].url,
            "https://api.test/api/auth/login?email=a%40b.com&password=x"
        );
        assert!(sent[0].body.is_none());
        assert_eq!(
            f.notifier.notifications(),
            vec![Notification::success(TOKEN_SAVED_NOTICE)]
        );
    }

    #[tokio::test]
    async fn login_token_is_trimmed_to_match_storage() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let session = Arc::new(Session::load(FileTokenStorage::in_dir(dir.path())).unwrap());
        let client = ApiClient::new("https://api.test", session.clone(), transport.clone());
        let notifier = RecordingNotifier::default();

        transport.respond(200, "tok123\n");
        let payload = dispatch(
            &client,
            EndpointId::Login,
            &state(&[("email", "a@b.com"), ("password", "x")]),
            &notifier,
        )
        .await
        .unwrap();
        assert_eq!(payload, json!("tok123\n"));
        assert_eq!(session.authorization().as_deref(), Some("Bearer tok123"));

        let restarted = Session::load(FileTokenStorage::in_dir(dir.path())).unwrap();
        assert_eq!(restarted.get(), session.get());

        transport.respond(200, "[]");
        client.get("/api/company/all").await.unwrap();
        assert_eq!(
            transport.requests()[1].header("authorization"),
            Some("Bearer tok123")
        );
    }

    #[tokio::test]
    async fn login_token_with_control_characters_is_refused() {
        let f = fixture();
        f.client.session().set("old").unwrap();
        f.transport.respond(200, "tok\r\n123");
        dispatch(
            &f.client,
            EndpointId::Login,
            &state(&[("email", "a@b.com"), ("password", "x")]),
            &f.notifier,
        )
        .await
        .unwrap();
        assert_eq!(f.client.session().get().as_deref(), Some("old"));
        let notices = f.notifier.notifications();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NotificationLevel::Failure);
    }

    #[tokio::test]
    async fn failed_login_keeps_the_previous_session() {
        let f = fixture();
        f.client.session().set("old").unwrap();
        f.transport.respond(401, r#"{"message":"invalid credentials"}"#);
        let err = dispatch(
            &f.client,
            EndpointId::Login,
            &state(&[("email", "a@b.com"), ("password", "wrong")]),
            &f.notifier,
        )
        .await
        .unwrap_err();
        assert_eq!(err.diagnostic(), "invalid credentials");
        assert_eq!(f.client.session().get().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_the_network() {
        let f = fixture();
        let form = Form::new(
            EndpointId::CreateEmployee.descriptor(),
            Arc::new(RecordingNotifier::default()),
        );
        form.set_field("employee", "{bad json").unwrap();

        let outcome = submit(&form, &f.client, EndpointId::CreateEmployee, &f.notifier)
            .await
            .unwrap();

        match outcome {
            Outcome::Failure(message) => {
                assert!(message.contains("employee"), "{message}");
                assert!(message.contains("invalid JSON"), "{message}");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(f.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn numeric_id_is_parsed_before_dispatch() {
        let f = fixture();
        let err = dispatch(
            &f.client,
            EndpointId::EmployeeById,
            &state(&[("id", "seven")]),
            &f.notifier,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::InputError { ref field, .. } if field == "id"));
        assert!(f.transport.requests().is_empty());

        for raw in ["1.5", "1e3", ""] {
            let err = dispatch(
                &f.client,
                EndpointId::EmployeeById,
                &state(&[("id", raw)]),
                &f.notifier,
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ApiError::InputError { .. }), "{raw}: {err:?}");
        }
        assert!(f.transport.requests().is_empty());

        f.transport.respond(200, r#"{"id":7}"#);
        dispatch(
            &f.client,
            EndpointId::VerificationById,
            &state(&[("id", " 7 ")]),
            &f.notifier,
        )
        .await
        .unwrap();
        assert_eq!(f.transport.requests()[0].url, "https://api.test/api/verify/7");
    }

    #[tokio::test]
    async fn trust_code_is_substituted_into_the_path() {
        let f = fixture();
        f.transport.respond(200, r#"{"name":"Acme"}"#);
        dispatch(
            &f.client,
            EndpointId::CompanyByTrustCode,
            &state(&[("code", "ABC 123")]),
            &f.notifier,
        )
        .await
        .unwrap();
        assert_eq!(
            f.transport.requests()[0].url,
            "https://api.test/api/company/trust/ABC%20123"
        );
    }

    #[tokio::test]
    async fn register_sends_typed_body() {
        let f = fixture();
        f.transport.respond(200, r#"{"message":"OTP sent"}"#);
        dispatch(
            &f.client,
            EndpointId::RegisterUser,
            &state(&[("name", "John"), ("email", "john@example.com"), ("password", "pw")]),
            &f.notifier,
        )
        .await
        .unwrap();
        let sent = &f.transport.requests()[0];
        let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"email": "john@example.com", "password": "pw", "name": "John"})
        );
        assert_eq!(sent.header("authorization"), None);
    }

    #[tokio::test]
    async fn server_error_surfaces_server_message() {
        let f = fixture();
        f.transport.respond(500, r#"{"message":"db down"}"#);
        let form = Form::new(
            EndpointId::AllVerifications.descriptor(),
            Arc::new(RecordingNotifier::default()),
        );
        let outcome = submit(&form, &f.client, EndpointId::AllVerifications, &f.notifier)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Failure("db down".to_string()));
    }

    #[tokio::test]
    async fn auth_required_calls_go_out_without_a_token() {
        let f = fixture();
        f.transport.respond(401, "");
        let err = dispatch(&f.client, EndpointId::AllCompanies, &FormState::new(), &f.notifier)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 401, .. }));
        assert_eq!(f.transport.requests()[0].header("authorization"), None);
    }
}
