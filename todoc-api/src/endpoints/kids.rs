use super::{API_PREFIX, KidId, UserId};
use crate::error::ValidationError;
use crate::macros::setters;
use crate::request::{EmptyResponse, Method, Request, RequestData, Upload};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;

const ALLOWED_PHOTO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];
const NAME_MAX_CHARS: usize = 50;

// Common

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Male => f.write_str("male"),
            Self::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Gender {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(ValidationError::Invalid(format!(
                "gender must be 'male' or 'female', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kid {
    pub id: KidId,
    pub user_id: UserId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRecords {
    pub meal: Option<serde_json::Value>,
    pub sleep: Option<serde_json::Value>,
    pub health: Option<serde_json::Value>,
    pub growth: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub kid: Kid,
    pub recent_records: RecentRecords,
}

// Requests

#[derive(Debug, Default, Clone, Serialize)]
pub struct ListKids;

impl Request for ListKids {
    type Data = ();
    type Response = Vec<Kid>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/", API_PREFIX).into()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateKid {
    name: String,
    birth_date: NaiveDate,
    gender: Gender,
}

impl CreateKid {
    pub fn new(name: impl Into<String>, birth_date: NaiveDate, gender: Gender) -> Self {
        Self {
            name: name.into(),
            birth_date,
            gender,
        }
    }
}

impl Request for CreateKid {
    type Data = Self;
    type Response = Kid;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/", API_PREFIX).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::require("name", &self.name)?;
        ValidationError::max_chars("name", &self.name, NAME_MAX_CHARS)?;
        validate_birth_date(self.birth_date)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetKid {
    #[serde(skip)]
    kid_id: KidId,
}

impl GetKid {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }
}

impl Request for GetKid {
    type Data = ();
    type Response = Kid;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}", API_PREFIX, self.kid_id).into()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KidChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateKid {
    #[serde(skip)]
    kid_id: KidId,
    #[serde(flatten)]
    changes: KidChanges,
}

impl UpdateKid {
    pub fn new(kid_id: KidId) -> Self {
        Self {
            kid_id,
            changes: KidChanges::default(),
        }
    }

    setters!(
        opt changes.name: String,
        opt changes.birth_date: NaiveDate,
        opt changes.gender: Gender,
        opt changes.image_url: String,
    );
}

impl Request for UpdateKid {
    type Data = Self;
    type Response = Kid;
    const METHOD: Method = Method::PUT;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}", API_PREFIX, self.kid_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.changes.name {
            ValidationError::require("name", name)?;
            ValidationError::max_chars("name", name, NAME_MAX_CHARS)?;
        }
        if let Some(birth_date) = self.changes.birth_date {
            validate_birth_date(birth_date)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteKid {
    #[serde(skip)]
    kid_id: KidId,
}

impl DeleteKid {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }
}

impl Request for DeleteKid {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}", API_PREFIX, self.kid_id).into()
    }
}

#[derive(Debug, Clone)]
pub struct UploadKidPhoto {
    kid_id: KidId,
    upload: Upload,
}

impl UploadKidPhoto {
    pub fn new(kid_id: KidId, upload: Upload) -> Self {
        Self { kid_id, upload }
    }
}

impl Request for UploadKidPhoto {
    type Data = ();
    type Response = Kid;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}/photo", API_PREFIX, self.kid_id).into()
    }

    fn data(&self) -> RequestData<&()> {
        RequestData::Multipart(self.upload.clone())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if !ALLOWED_PHOTO_TYPES.contains(&self.upload.content_type.as_str()) {
            return Err(ValidationError::Invalid(
                "Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.".into(),
            ));
        }
        if self.upload.bytes.is_empty() {
            return Err(ValidationError::Required { field: "file" });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetDashboard {
    #[serde(skip)]
    kid_id: KidId,
}

impl GetDashboard {
    pub fn new(kid_id: KidId) -> Self {
        Self { kid_id }
    }
}

impl Request for GetDashboard {
    type Data = ();
    type Response = Dashboard;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}/dashboard", API_PREFIX, self.kid_id).into()
    }
}

fn validate_birth_date(birth_date: NaiveDate) -> Result<(), ValidationError> {
    if birth_date > chrono::Utc::now().date_naive() {
        return Err(ValidationError::Invalid(
            "birth_date cannot be in the future".into(),
        ));
    }
    Ok(())
}
