use super::{API_PREFIX, KidId, RecordId, decimal, timestamp};
use crate::error::ValidationError;
use crate::macros::setters;
use crate::request::{EmptyResponse, Method, Request, RequestData};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::marker::PhantomData;

const LIST_LIMIT_MAX: u32 = 100;
const TITLE_MAX_CHARS: usize = 200;

// Enums

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Growth,
    Sleep,
    Meal,
    Health,
    Stool,
    Misc,
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Growth => "growth",
            Self::Sleep => "sleep",
            Self::Meal => "meal",
            Self::Health => "health",
            Self::Stool => "stool",
            Self::Misc => "misc",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    BreastMilk,
    Formula,
    BabyFood,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Good,
    Normal,
    Bad,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Cough,
    Fever,
    RunnyNose,
    Vomit,
    Diarrhea,
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoolAmount {
    Low,
    Medium,
    High,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoolCondition {
    Normal,
    Diarrhea,
    Constipation,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoolColor {
    Yellow,
    Brown,
    Green,
    Other,
}

/// Parse the snake_case wire name, case-insensitively
macro_rules! wire_name_from_str {
    ($($ty:ident),* $(,)?) => {
        $(
            impl std::str::FromStr for $ty {
                type Err = ValidationError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    let name = s.trim().to_ascii_lowercase().replace('-', "_");
                    serde_json::from_value(serde_json::Value::String(name)).map_err(|_| {
                        ValidationError::Invalid(format!("unknown {} '{}'", stringify!($ty), s))
                    })
                }
            }
        )*
    };
}

wire_name_from_str!(
    RecordType,
    MealType,
    SleepQuality,
    Symptom,
    StoolAmount,
    StoolCondition,
    StoolColor,
);

// Common

/// Fields shared by every record category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Base record row as returned alongside a category record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub id: RecordId,
    pub kid_id: KidId,
    pub record_type: RecordType,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Category-specific columns of a record in the combined listing.
/// Only the columns of the record's own category are populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDetails {
    #[serde(default, with = "decimal")]
    pub height_cm: Option<f64>,
    #[serde(default, with = "decimal")]
    pub weight_kg: Option<f64>,
    #[serde(default, with = "timestamp::option")]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sleep_quality: Option<SleepQuality>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub meal_detail: Option<String>,
    #[serde(default)]
    pub burp: Option<bool>,
    #[serde(default, with = "decimal")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub symptom: Option<Symptom>,
    #[serde(default)]
    pub symptom_other: Option<String>,
    #[serde(default)]
    pub amount: Option<StoolAmount>,
    #[serde(default)]
    pub condition: Option<StoolCondition>,
    #[serde(default)]
    pub color: Option<StoolColor>,
}

/// A record with its category details, as listed by `GET /kids/{id}/records/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kid_id: KidId,
    pub record_type: RecordType,
    #[serde(flatten)]
    pub fields: RecordFields,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub details: RecordDetails,
}

/// One record category: its path segment and category columns
pub trait RecordCategory: Serialize + DeserializeOwned {
    const RECORD_TYPE: RecordType;

    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Copy this category's columns into the combined details
    fn fill(&self, details: &mut RecordDetails);
}

/// Response of the per-category create and list endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "D: RecordCategory")]
pub struct CategoryRecord<D> {
    pub id: RecordId,
    #[serde(flatten)]
    pub detail: D,
    #[serde(default)]
    pub record: Option<RecordSummary>,
}

impl<D: RecordCategory> CategoryRecord<D> {
    /// Combine with the embedded base row; `None` if the server omitted it
    pub fn into_record(self) -> Option<Record> {
        let summary = self.record?;
        let mut details = RecordDetails::default();
        self.detail.fill(&mut details);

        Some(Record {
            id: summary.id,
            kid_id: summary.kid_id,
            record_type: summary.record_type,
            fields: summary.fields,
            created_at: summary.created_at,
            details,
        })
    }
}

// Categories

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Growth {
    #[serde(default, with = "decimal")]
    pub height_cm: Option<f64>,
    #[serde(default, with = "decimal")]
    pub weight_kg: Option<f64>,
}

impl RecordCategory for Growth {
    const RECORD_TYPE: RecordType = RecordType::Growth;

    fn validate(&self) -> Result<(), ValidationError> {
        ValidationError::positive("height_cm", self.height_cm)?;
        ValidationError::positive("weight_kg", self.weight_kg)?;
        if self.height_cm.is_none() && self.weight_kg.is_none() {
            return Err(ValidationError::Invalid(
                "height_cm or weight_kg is required".into(),
            ));
        }
        Ok(())
    }

    fn fill(&self, details: &mut RecordDetails) {
        details.height_cm = self.height_cm;
        details.weight_kg = self.weight_kg;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sleep {
    #[serde(with = "timestamp")]
    pub start_datetime: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_datetime: DateTime<Utc>,
    pub sleep_quality: SleepQuality,
}

impl Sleep {
    pub fn duration(&self) -> chrono::Duration {
        self.end_datetime - self.start_datetime
    }
}

impl RecordCategory for Sleep {
    const RECORD_TYPE: RecordType = RecordType::Sleep;

    fn validate(&self) -> Result<(), ValidationError> {
        if self.end_datetime <= self.start_datetime {
            return Err(ValidationError::Invalid(
                "end_datetime must be after start_datetime".into(),
            ));
        }
        Ok(())
    }

    fn fill(&self, details: &mut RecordDetails) {
        details.start_datetime = Some(self.start_datetime);
        details.end_datetime = Some(self.end_datetime);
        details.sleep_quality = Some(self.sleep_quality);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub meal_type: MealType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burp: Option<bool>,
}

impl RecordCategory for Meal {
    const RECORD_TYPE: RecordType = RecordType::Meal;

    fn fill(&self, details: &mut RecordDetails) {
        details.meal_type = Some(self.meal_type);
        details.meal_detail = self.meal_detail.clone();
        details.burp = self.burp;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default, with = "decimal")]
    pub temperature: Option<f64>,
    pub symptom: Symptom,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_other: Option<String>,
}

impl RecordCategory for Health {
    const RECORD_TYPE: RecordType = RecordType::Health;

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(temperature) = self.temperature {
            ValidationError::within("temperature", temperature, 35.0, 42.0)?;
        }
        if self.symptom == Symptom::Other {
            ValidationError::require("symptom_other", self.symptom_other.as_deref().unwrap_or(""))?;
        }
        Ok(())
    }

    fn fill(&self, details: &mut RecordDetails) {
        details.temperature = self.temperature;
        details.symptom = Some(self.symptom);
        details.symptom_other = self.symptom_other.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stool {
    pub amount: StoolAmount,
    pub condition: StoolCondition,
    pub color: StoolColor,
}

impl RecordCategory for Stool {
    const RECORD_TYPE: RecordType = RecordType::Stool;

    fn fill(&self, details: &mut RecordDetails) {
        details.amount = Some(self.amount);
        details.condition = Some(self.condition);
        details.color = Some(self.color);
    }
}

// Requests

#[derive(Debug, Clone, Serialize)]
pub struct ListRecords {
    #[serde(skip)]
    kid_id: KidId,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_type: Option<RecordType>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::option::serialize"
    )]
    date_from: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::option::serialize"
    )]
    date_to: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

impl ListRecords {
    pub fn new(kid_id: KidId) -> Self {
        Self {
            kid_id,
            record_type: None,
            date_from: None,
            date_to: None,
            limit: None,
        }
    }

    setters!(
        opt record_type: RecordType,
        opt date_from: DateTime<Utc>,
        opt date_to: DateTime<Utc>,
        opt limit: u32,
    );
}

impl Request for ListRecords {
    type Data = Self;
    type Response = Vec<Record>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("{}/kids/{}/records/", API_PREFIX, self.kid_id).into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_limit(self.limit)?;
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ValidationError::Invalid(
                    "date_from must not be after date_to".into(),
                ));
            }
        }
        Ok(())
    }
}

/// `GET /kids/{id}/records/{category}`
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "")]
pub struct ListCategoryRecords<D> {
    #[serde(skip)]
    kid_id: KidId,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip)]
    category: PhantomData<D>,
}

impl<D> ListCategoryRecords<D> {
    pub fn new(kid_id: KidId) -> Self {
        Self {
            kid_id,
            limit: None,
            category: PhantomData,
        }
    }

    setters!(opt limit: u32);
}

impl<D: RecordCategory> Request for ListCategoryRecords<D> {
    type Data = Self;
    type Response = Vec<CategoryRecord<D>>;

    fn endpoint(&self) -> Cow<'_, str> {
        format!(
            "{}/kids/{}/records/{}",
            API_PREFIX,
            self.kid_id,
            D::RECORD_TYPE
        )
        .into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Query(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        validate_limit(self.limit)
    }
}

/// `POST /kids/{id}/records/{category}`
#[derive(Debug, Clone, Serialize)]
pub struct CreateRecord<D> {
    #[serde(skip)]
    kid_id: KidId,
    #[serde(flatten)]
    fields: RecordFields,
    #[serde(flatten)]
    detail: D,
}

impl<D: RecordCategory> CreateRecord<D> {
    pub fn new(kid_id: KidId, detail: D) -> Self {
        Self {
            kid_id,
            fields: RecordFields::default(),
            detail,
        }
    }

    pub fn fields(mut self, fields: RecordFields) -> Self {
        self.fields = fields;
        self
    }

    setters!(
        opt fields.title: String,
        opt fields.memo: String,
        opt fields.image_url: String,
    );
}

impl<D: RecordCategory> Request for CreateRecord<D> {
    type Data = Self;
    type Response = CategoryRecord<D>;
    const METHOD: Method = Method::POST;

    fn endpoint(&self) -> Cow<'_, str> {
        format!(
            "{}/kids/{}/records/{}",
            API_PREFIX,
            self.kid_id,
            D::RECORD_TYPE
        )
        .into()
    }

    fn data(&self) -> RequestData<&Self> {
        RequestData::Json(self)
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.fields.title {
            ValidationError::max_chars("title", title, TITLE_MAX_CHARS)?;
        }
        self.detail.validate()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecord {
    #[serde(skip)]
    kid_id: KidId,
    #[serde(skip)]
    record_id: RecordId,
}

impl DeleteRecord {
    pub fn new(kid_id: KidId, record_id: RecordId) -> Self {
        Self { kid_id, record_id }
    }
}

impl Request for DeleteRecord {
    type Data = ();
    type Response = EmptyResponse;
    const METHOD: Method = Method::DELETE;

    fn endpoint(&self) -> Cow<'_, str> {
        format!(
            "{}/kids/{}/records/{}",
            API_PREFIX, self.kid_id, self.record_id
        )
        .into()
    }
}

fn validate_limit(limit: Option<u32>) -> Result<(), ValidationError> {
    match limit {
        Some(limit) if limit == 0 || limit > LIST_LIMIT_MAX => Err(ValidationError::OutOfRange {
            field: "limit",
            min: 1.0,
            max: LIST_LIMIT_MAX as f64,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_create_record_flattens_fields_and_detail() {
        let request = CreateRecord::new(
            4,
            Growth {
                height_cm: Some(68.5),
                weight_kg: None,
            },
        )
        .memo("after bath");

        assert_eq!(request.endpoint(), "/api/v1/kids/4/records/growth");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"memo": "after bath", "height_cm": 68.5, "weight_kg": null})
        );
    }

    #[test]
    fn test_health_temperature_range() {
        let mut health = Health {
            temperature: Some(38.2),
            symptom: Symptom::Fever,
            symptom_other: None,
        };
        assert!(health.validate().is_ok());

        health.temperature = Some(43.0);
        assert!(health.validate().is_err());

        health.temperature = None;
        health.symptom = Symptom::Other;
        assert!(health.validate().is_err());
    }

    #[test]
    fn test_sleep_must_end_after_start() {
        let sleep = Sleep {
            start_datetime: at(22),
            end_datetime: at(21),
            sleep_quality: SleepQuality::Good,
        };
        assert!(sleep.validate().is_err());
    }

    #[test]
    fn test_growth_requires_a_measurement() {
        assert!(Growth::default().validate().is_err());
        assert!(
            Growth {
                height_cm: Some(-1.0),
                weight_kg: None
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn test_category_record_into_record() {
        let body = json!({
            "id": 11,
            "meal_type": "breast_milk",
            "meal_detail": "120ml",
            "burp": true,
            "record": {
                "id": 11,
                "kid_id": 4,
                "record_type": "meal",
                "title": null,
                "memo": "night feed",
                "image_url": null,
                "created_at": "2024-05-01T03:00:00"
            }
        });

        let created: CategoryRecord<Meal> = serde_json::from_value(body).unwrap();
        let record = created.into_record().unwrap();

        assert_eq!(record.id, 11);
        assert_eq!(record.record_type, RecordType::Meal);
        assert_eq!(record.fields.memo.as_deref(), Some("night feed"));
        assert_eq!(record.details.meal_type, Some(MealType::BreastMilk));
        assert_eq!(record.details.burp, Some(true));
        assert_eq!(record.created_at, at(3));
    }

    #[test]
    fn test_combined_listing_decodes_string_decimals() {
        let body = json!([{
            "id": 2,
            "kid_id": 4,
            "record_type": "health",
            "title": null,
            "memo": null,
            "image_url": null,
            "created_at": "2024-05-01T10:00:00+00:00",
            "temperature": "38.5",
            "symptom": "fever",
            "symptom_other": null
        }]);

        let records: Vec<Record> = serde_json::from_value(body).unwrap();
        assert_eq!(records[0].details.temperature, Some(38.5));
        assert_eq!(records[0].details.symptom, Some(Symptom::Fever));
        assert_eq!(records[0].details.height_cm, None);
    }

    #[test]
    fn test_list_records_limit_bounds() {
        assert!(ListRecords::new(1).limit(100u32).validate().is_ok());
        assert!(ListRecords::new(1).limit(101u32).validate().is_err());
        assert!(ListRecords::new(1).limit(0u32).validate().is_err());
        assert!(
            ListRecords::new(1)
                .date_from(at(10))
                .date_to(at(9))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_enums_parse_from_wire_names() {
        assert_eq!("breast_milk".parse::<MealType>().unwrap(), MealType::BreastMilk);
        assert_eq!("Runny-Nose".parse::<Symptom>().unwrap(), Symptom::RunnyNose);
        assert_eq!("sleep".parse::<RecordType>().unwrap(), RecordType::Sleep);
        assert!("purple".parse::<StoolColor>().is_err());
    }

    #[test]
    fn test_category_list_endpoint() {
        let request = ListCategoryRecords::<Stool>::new(9);
        assert_eq!(request.endpoint(), "/api/v1/kids/9/records/stool");
    }
}
