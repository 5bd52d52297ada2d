use std::str::FromStr;

use serde::Deserialize;

use orgadmin_auth::Role;
use orgadmin_core::DomainError;

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------
//
// Bodies carrying passwords or tokens must not derive `Debug`.

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub company_id: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateAdminRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub company_id: String,
}

/// Profile fields plus optional role/company change.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub company_id: Option<String>,
}

impl UpdateUserRequest {
    pub fn has_profile_changes(&self) -> bool {
        self.email.is_some() || self.first_name.is_some() || self.last_name.is_some()
    }

    pub fn has_reassignment(&self) -> bool {
        self.role.is_some() || self.company_id.is_some()
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub company_id: Option<String>,
    pub role: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    Ok(raw.trim().parse::<T>()?)
}

pub fn parse_optional_id<T>(raw: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.filter(|s| !s.trim().is_empty()).map(parse_id).transpose()
}

pub fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse::<Role>().map_err(|e| ApiError::bad_request(e.to_string()))
}
