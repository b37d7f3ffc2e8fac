use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::user::{InstitutionType, Shift, StaffRole, User, UserKind};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "name": "Alice Johnson",
    "email": "alice@example.com",
    "password": "secret123",
    "confirmPassword": "secret123",
    "role": "student",
    "institutionType": "college",
    "department": "Computer Science",
    "shift": "morning",
    "regNo": "CS2021001",
    "degreeName": "Bachelor of Technology (B.Tech)",
    "stream": "Computer Science and Engineering",
    "year": 3
}))]
pub struct SignupReq {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: Option<String>,
    pub role: UserKind,
    pub institution_type: InstitutionType,
    pub department: Option<String>,
    pub shift: Shift,

    // student
    pub reg_no: Option<String>,
    pub degree_name: Option<String>,
    pub stream: Option<String>,
    pub year: Option<u8>,

    // staff
    pub staff_id: Option<String>,
    pub staff_role: Option<StaffRole>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    /// email of the account
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
