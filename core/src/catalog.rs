//! The TrueShift endpoints the tester knows about.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::endpoint::{EndpointDescriptor, FieldKind, FieldSpec};
use crate::http::HttpMethod;

/// Identifies one entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EndpointId {
    RegisterUser,
    VerifyOtp,
    Login,
    RegisterCompany,
    CompanyByTrustCode,
    AllCompanies,
    CreateEmployee,
    EmployeeById,
    EmployeeByTrustCode,
    SubmitVerification,
    VerificationById,
    AllVerifications,
}

/// Groups endpoints the way the tester lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Authentication,
    Company,
    Employee,
    Verification,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Authentication,
        Section::Company,
        Section::Employee,
        Section::Verification,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Authentication => "Authentication",
            Section::Company => "Company Management",
            Section::Employee => "Employee Management",
            Section::Verification => "Verification Requests",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Section::Authentication => "Register, verify OTP, and login endpoints",
            Section::Company => "Register companies and retrieve company information",
            Section::Employee => "Create and retrieve employee information",
            Section::Verification => "Submit and manage verification requests",
        }
    }

    pub fn endpoints(self) -> impl Iterator<Item = EndpointId> {
        EndpointId::ALL
            .into_iter()
            .filter(move |id| id.section() == self)
    }
}

const EMAIL: FieldSpec = FieldSpec::new("email", FieldKind::Email, "Email", "john@example.com");
const PASSWORD: FieldSpec = FieldSpec::new("password", FieldKind::Secret, "Password", "••••••••");

static REGISTER_USER: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/auth/register",
    description: "Register a new employee account. Sends OTP to email.",
    fields: &[
        FieldSpec::new("name", FieldKind::ShortText, "Name", "John Doe"),
        EMAIL,
        PASSWORD,
    ],
    requires_auth: false,
};

static VERIFY_OTP: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/auth/verify-otp",
    description: "Verify the OTP sent to your email",
    fields: &[
        EMAIL,
        FieldSpec::new("otp", FieldKind::ShortText, "OTP Code", "123456"),
    ],
    requires_auth: false,
};

static LOGIN: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/auth/login",
    description: "Login and receive JWT token",
    fields: &[EMAIL, PASSWORD],
    requires_auth: false,
};

static REGISTER_COMPANY: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/company/register",
    description: "Register a new company and get a unique trust code",
    fields: &[
        FieldSpec::new("name", FieldKind::ShortText, "Company Name", "Acme Corp"),
        FieldSpec::new("email", FieldKind::Email, "Company Email", "info@acme.com"),
    ],
    requires_auth: false,
};

static COMPANY_BY_TRUST_CODE: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/company/trust/{code}",
    description: "Get company details by trust code",
    fields: &[FieldSpec::new("code", FieldKind::ShortText, "Trust Code", "ABC123")],
    requires_auth: false,
};

static ALL_COMPANIES: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/company/all",
    description: "Get all registered companies",
    fields: &[],
    requires_auth: true,
};

static CREATE_EMPLOYEE: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/employees",
    description: "Create a new employee record (internal use)",
    fields: &[FieldSpec::new(
        "employee",
        FieldKind::LongText,
        "Employee JSON",
        r#"{"name": "John", "email": "john@example.com", ...}"#,
    )],
    requires_auth: true,
};

static EMPLOYEE_BY_ID: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/employees/{id}",
    description: "Get employee by ID",
    fields: &[FieldSpec::new("id", FieldKind::Number, "Employee ID", "1")],
    requires_auth: true,
};

static EMPLOYEE_BY_TRUST_CODE: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/employees/trust/{trustCode}",
    description: "Get employee by trust code",
    fields: &[FieldSpec::new(
        "trustCode",
        FieldKind::ShortText,
        "Trust Code",
        "EMP123",
    )],
    requires_auth: true,
};

static SUBMIT_VERIFICATION: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Post,
    path: "/api/verify/request",
    description: "Submit a new verification request",
    fields: &[FieldSpec::new(
        "request",
        FieldKind::LongText,
        "Verification Request JSON",
        r#"{"requestedByCompany": {...}, "employee": {...}}"#,
    )],
    requires_auth: true,
};

static VERIFICATION_BY_ID: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/verify/{id}",
    description: "Get verification request by ID",
    fields: &[FieldSpec::new("id", FieldKind::Number, "Request ID", "1")],
    requires_auth: true,
};

static ALL_VERIFICATIONS: EndpointDescriptor = EndpointDescriptor {
    method: HttpMethod::Get,
    path: "/api/verify/all",
    description: "Get all verification requests",
    fields: &[],
    requires_auth: true,
};

impl EndpointId {
    pub const ALL: [EndpointId; 12] = [
        EndpointId::RegisterUser,
        EndpointId::VerifyOtp,
        EndpointId::Login,
        EndpointId::RegisterCompany,
        EndpointId::CompanyByTrustCode,
        EndpointId::AllCompanies,
        EndpointId::CreateEmployee,
        EndpointId::EmployeeById,
        EndpointId::EmployeeByTrustCode,
        EndpointId::SubmitVerification,
        EndpointId::VerificationById,
        EndpointId::AllVerifications,
    ];

    pub fn descriptor(self) -> &'static EndpointDescriptor {
        match self {
            EndpointId::RegisterUser => &REGISTER_USER,
            EndpointId::VerifyOtp => &VERIFY_OTP,
            EndpointId::Login => &LOGIN,
            EndpointId::RegisterCompany => &REGISTER_COMPANY,
            EndpointId::CompanyByTrustCode => &COMPANY_BY_TRUST_CODE,
            EndpointId::AllCompanies => &ALL_COMPANIES,
            EndpointId::CreateEmployee => &CREATE_EMPLOYEE,
            EndpointId::EmployeeById => &EMPLOYEE_BY_ID,
            EndpointId::EmployeeByTrustCode => &EMPLOYEE_BY_TRUST_CODE,
            EndpointId::SubmitVerification => &SUBMIT_VERIFICATION,
            EndpointId::VerificationById => &VERIFICATION_BY_ID,
            EndpointId::AllVerifications => &ALL_VERIFICATIONS,
        }
    }

    pub fn section(self) -> Section {
        match self {
            EndpointId::RegisterUser | EndpointId::VerifyOtp | EndpointId::Login => {
                Section::Authentication
            }
            EndpointId::RegisterCompany
            | EndpointId::CompanyByTrustCode
            | EndpointId::AllCompanies => Section::Company,
            EndpointId::CreateEmployee
            | EndpointId::EmployeeById
            | EndpointId::EmployeeByTrustCode => Section::Employee,
            EndpointId::SubmitVerification
            | EndpointId::VerificationById
            | EndpointId::AllVerifications => Section::Verification,
        }
    }

    /// Short command-line name, e.g. `auth.login`.
    pub fn slug(self) -> &'static str {
        match self {
            EndpointId::RegisterUser => "auth.register",
            EndpointId::VerifyOtp => "auth.verify-otp",
            EndpointId::Login => "auth.login",
            EndpointId::RegisterCompany => "company.register",
            EndpointId::CompanyByTrustCode => "company.by-trust-code",
            EndpointId::AllCompanies => "company.all",
            EndpointId::CreateEmployee => "employee.create",
            EndpointId::EmployeeById => "employee.by-id",
            EndpointId::EmployeeByTrustCode => "employee.by-trust-code",
            EndpointId::SubmitVerification => "verify.request",
            EndpointId::VerificationById => "verify.by-id",
            EndpointId::AllVerifications => "verify.all",
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EndpointId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointId::ALL
            .into_iter()
            .find(|id| id.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown endpoint: {s}"))
    }
}
