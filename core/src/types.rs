//! Request shapes for the TrueShift API.
//!
//! # Design
//! Each endpoint with a fixed payload gets its own struct, so handlers move
//! typed values instead of assembling JSON ad hoc. Endpoints whose body is
//! operator-supplied JSON (employee creation, verification requests) keep
//! `serde_json::Value`, because the tester never validates those schemas.
//! Responses stay untyped for the same reason.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Query of `POST /api/auth/verify-otp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

impl OtpVerification {
    pub fn query(&self) -> [(&str, &str); 2] {
        [("email", self.email.as_str()), ("otp", self.otp.as_str())]
    }
}

/// Query of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn query(&self) -> [(&str, &str); 2] {
        [("email", self.email.as_str()), ("password", self.password.as_str())]
    }
}

/// Body of `POST /api/company/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterCompany {
    pub email: String,
    pub name: String,
}
