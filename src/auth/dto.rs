use serde::{Deserialize, Serialize};

use super::repo_types::PublicUser;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

/// Response of the user listing.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub message: String,
    pub users: Vec<PublicUser>,
}

/// Profile of the authenticated caller.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
}
