use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Every registered user receives this one-time passcode.
pub const MOCK_OTP: &str = "123456";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub trust_code: String,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct RegisterCompany {
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct OtpQuery {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub email: String,
    pub password: String,
}

struct User {
    password: String,
    verified: bool,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, User>,
    tokens: HashSet<String>,
    companies: Vec<Company>,
    employees: Vec<Value>,
    verifications: Vec<Value>,
    last_id: u64,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<T, ApiError>;

fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

fn trust_code(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{prefix}-{}", &id[..8])
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/api/auth/register", post(register_user))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/login", post(login))
        .route("/api/company/register", post(register_company))
        .route("/api/company/trust/{code}", get(company_by_trust_code))
        .route("/api/company/all", get(all_companies))
        .route("/api/employees", post(create_employee))
        .route("/api/employees/{id}", get(employee_by_id))
        .route("/api/employees/trust/{code}", get(employee_by_trust_code))
        .route("/api/verify/request", post(submit_verification))
        .route("/api/verify/all", get(all_verifications))
        .route("/api/verify/{id}", get(verification_by_id))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn authorize(store: &Store, headers: &HeaderMap) -> ApiResult<()> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    match token {
        Some(token) if store.tokens.contains(token) => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "unauthorized")),
    }
}

fn with_id(body: Value, id: u64, extra: &[(&str, Value)]) -> ApiResult<Value> {
    let Value::Object(mut record) = body else {
        return Err(error(StatusCode::BAD_REQUEST, "body must be a JSON object"));
    };
    record.insert("id".to_string(), json!(id));
    for (key, value) in extra {
        record.insert(key.to_string(), value.clone());
    }
    Ok(Value::Object(record))
}

fn find_by<'a>(records: &'a [Value], key: &str, wanted: &Value) -> Option<&'a Value> {
    records.iter().find(|record| record.get(key) == Some(wanted))
}

async fn register_user(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err(error(StatusCode::CONFLICT, "email already registered"));
    }
    store.users.insert(
        input.email.clone(),
        User {
            password: input.password,
            verified: false,
        },
    );
    Ok(Json(json!({
        "message": format!("OTP sent to {}", input.email),
        "name": input.name,
    })))
}

async fn verify_otp(
    State(db): State<Db>,
    Query(query): Query<OtpQuery>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    let user = store
        .users
        .get_mut(&query.email)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "user not found"))?;
    if query.otp != MOCK_OTP {
        return Err(error(StatusCode::BAD_REQUEST, "invalid otp"));
    }
    user.verified = true;
    Ok(Json(json!({ "message": "Email verified successfully" })))
}

/// Answers with the bare token as plain text.
async fn login(State(db): State<Db>, Query(query): Query<LoginQuery>) -> ApiResult<String> {
    let mut store = db.write().await;
    let verified = match store.users.get(&query.email) {
        Some(user) if user.password == query.password => user.verified,
        _ => return Err(error(StatusCode::UNAUTHORIZED, "invalid credentials")),
    };
    if !verified {
        return Err(error(StatusCode::FORBIDDEN, "email not verified"));
    }
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone());
    Ok(token)
}

async fn register_company(
    State(db): State<Db>,
    Json(input): Json<RegisterCompany>,
) -> ApiResult<Json<Company>> {
    let mut store = db.write().await;
    let company = Company {
        id: store.next_id(),
        name: input.name,
        email: input.email,
        trust_code: trust_code("CMP"),
    };
    store.companies.push(company.clone());
    Ok(Json(company))
}

async fn company_by_trust_code(
    State(db): State<Db>,
    Path(code): Path<String>,
) -> ApiResult<Json<Company>> {
    let store = db.read().await;
    store
        .companies
        .iter()
        .find(|company| company.trust_code == code)
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "company not found"))
}

async fn all_companies(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Company>>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.companies.clone()))
}

async fn create_employee(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let id = store.next_id();
    let employee = with_id(body, id, &[("trustCode", json!(trust_code("EMP")))])?;
    store.employees.push(employee.clone());
    Ok(Json(employee))
}

async fn employee_by_id(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    find_by(&store.employees, "id", &json!(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "employee not found"))
}

async fn employee_by_trust_code(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    find_by(&store.employees, "trustCode", &json!(code))
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "employee not found"))
}

async fn submit_verification(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let id = store.next_id();
    let request = with_id(body, id, &[("status", json!("PENDING"))])?;
    store.verifications.push(request.clone());
    Ok(Json(request))
}

async fn verification_by_id(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    find_by(&store.verifications, "id", &json!(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "verification request not found"))
}

async fn all_verifications(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Value>>> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(store.verifications.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_serializes_camel_case() {
        let company = Company {
            id: 1,
            name: "Acme".to_string(),
            email: "info@acme.com".to_string(),
            trust_code: "CMP-ABCDEF12".to_string(),
        };
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["trustCode"], "CMP-ABCDEF12");
        assert!(json.get("trust_code").is_none());
    }

    #[test]
    fn trust_codes_carry_prefix() {
        let code = trust_code("EMP");
        assert!(code.starts_with("EMP-"));
        assert_eq!(code.len(), 12);
        assert_ne!(code, trust_code("EMP"));
    }

    #[test]
    fn with_id_rejects_non_objects() {
        assert!(with_id(json!([1, 2]), 1, &[]).is_err());
        let record = with_id(json!({"name": "John"}), 7, &[("status", json!("PENDING"))]).unwrap();
        assert_eq!(record, json!({"name": "John", "id": 7, "status": "PENDING"}));
    }

    #[test]
    fn authorize_requires_known_bearer_token() {
        let mut store = Store::default();
        store.tokens.insert("abc".to_string());

        let mut headers = HeaderMap::new();
        assert!(authorize(&store, &headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert!(authorize(&store, &headers).is_err());

        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert!(authorize(&store, &headers).is_ok());
    }
}
