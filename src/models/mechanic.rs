use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{flag_badge, record_id, AdminResource, Resource};
use crate::api::{ApiResult, MultipartBody, Payload};
use crate::schema::cell::json_string_form;
use crate::schema::{
    BadgeTone, CellContent, CellValue, ColumnDescriptor, FieldDescriptor, FieldType, TableRow,
};

/// Optional text parts left out of the body when blank
const OMIT_WHEN_EMPTY: [&str; 4] = ["start_time", "end_time", "workshop_name", "email"];

const WEEKDAYS: [(&str, &str); 7] = [
    ("monday", "Monday"),
    ("tuesday", "Tuesday"),
    ("wednesday", "Wednesday"),
    ("thursday", "Thursday"),
    ("friday", "Friday"),
    ("saturday", "Saturday"),
    ("sunday", "Sunday"),
];

column_keys! {
    pub enum MechanicKey {
        Id => "id",
        FullName => "full_name",
        FirstName => "first_name",
        LastName => "last_name",
        Email => "email",
        Phone => "phone_number",
        Province => "province",
        City => "city",
        Expertise => "expertise",
        YearsOfExperience => "years_of_experience",
        WorkshopName => "workshop_name",
        IsVerified => "is_verified",
        IsAvailable => "is_available",
        AverageRating => "average_rating",
        CreatedAt => "created_at",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub cnic: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    /// GeoJSON point, `coordinates: [lng, lat]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Value>,
    /// A list, or one comma-separated string
    #[serde(default)]
    pub expertise: Option<Value>,
    #[serde(default)]
    pub years_of_experience: Option<f64>,
    #[serde(default)]
    pub workshop_name: Option<String>,
    #[serde(default)]
    pub working_days: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mechanic {
    pub fn full_name(&self) -> String {
        if let Some(name) = self.full_name.as_ref().filter(|n| !n.is_empty()) {
            return name.clone();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `[lng, lat]` from the GeoJSON location
    fn coordinate(&self, index: usize) -> Option<Value> {
        self.location
            .as_ref()
            .and_then(|location| location.get("coordinates"))
            .and_then(|coordinates| coordinates.get(index))
            .cloned()
    }
}

impl TableRow for Mechanic {
    type Key = MechanicKey;

    fn cell(&self, key: MechanicKey) -> CellValue {
        match key {
            MechanicKey::Id => record_id(&self.id, &self.mongo_id),
            MechanicKey::FullName => self.full_name().into(),
            MechanicKey::FirstName => self.first_name.clone().into(),
            MechanicKey::LastName => self.last_name.clone().into(),
            MechanicKey::Email => self.email.clone().into(),
            MechanicKey::Phone => self.phone_number.clone().into(),
            MechanicKey::Province => self.province.clone().into(),
            MechanicKey::City => self.city.clone().into(),
            MechanicKey::Expertise => self.expertise.as_ref().into(),
            MechanicKey::YearsOfExperience => self.years_of_experience.into(),
            MechanicKey::WorkshopName => self.workshop_name.clone().into(),
            MechanicKey::IsVerified => self.is_verified.into(),
            MechanicKey::IsAvailable => self.is_available.into(),
            MechanicKey::AverageRating => self.average_rating.into(),
            MechanicKey::CreatedAt => self.created_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(MechanicKey::Id).string_form()
    }
}

fn rating(value: &CellValue) -> CellContent {
    match value {
        CellValue::Int(i) => CellContent::text(format!("★ {:.1}", *i as f64)),
        CellValue::Float(f) => CellContent::text(format!("★ {:.1}", f)),
        _ => CellContent::text("N/A"),
    }
}

#[async_trait]
impl AdminResource for Mechanic {
    const RESOURCE: Resource = Resource::Mechanics;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(MechanicKey::FullName, "Name").sortable(),
            ColumnDescriptor::new(MechanicKey::Email, "Email").sortable(),
            ColumnDescriptor::new(MechanicKey::Phone, "Phone"),
            ColumnDescriptor::new(MechanicKey::City, "City").sortable(),
            ColumnDescriptor::new(MechanicKey::IsVerified, "Verified").with_render(|value, _| {
                flag_badge(value, "Verified", "Unverified", BadgeTone::Neutral)
            }),
            ColumnDescriptor::new(MechanicKey::IsAvailable, "Available")
                .with_render(|value, _| flag_badge(value, "Yes", "No", BadgeTone::Negative)),
            ColumnDescriptor::new(MechanicKey::AverageRating, "Rating")
                .sortable()
                .with_render(|value, _| rating(value)),
        ]
    }

    fn form_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("first_name", "First Name", FieldType::Text).required(),
            FieldDescriptor::new("last_name", "Last Name", FieldType::Text).required(),
            FieldDescriptor::new("email", "Email", FieldType::Email),
            FieldDescriptor::new("phone_number", "Phone Number", FieldType::Text)
                .required()
                .min_length(11)
                .max_length(11)
                .placeholder("e.g., 03001234567"),
            FieldDescriptor::new("province", "Province", FieldType::Text).required(),
            FieldDescriptor::new("city", "City", FieldType::Text).required(),
            FieldDescriptor::new("cnic", "CNIC", FieldType::Text)
                .required()
                .min_length(13)
                .max_length(13)
                .placeholder("e.g., 3520212345671"),
            FieldDescriptor::new("address", "Address", FieldType::Text).required(),
            FieldDescriptor::new("latitude", "Latitude", FieldType::Number)
                .required()
                .min(-90.0)
                .max(90.0),
            FieldDescriptor::new("longitude", "Longitude", FieldType::Number)
                .required()
                .min(-180.0)
                .max(180.0),
            FieldDescriptor::new("expertise", "Expertise (comma-separated)", FieldType::Text)
                .required(),
            FieldDescriptor::new("years_of_experience", "Years of Experience", FieldType::Number)
                .required()
                .min(0.0),
            FieldDescriptor::new("workshop_name", "Workshop Name", FieldType::Text),
            FieldDescriptor::new("working_days", "Working Days", FieldType::SelectMultiple)
                .options(WEEKDAYS),
            FieldDescriptor::new("start_time", "Start Time", FieldType::Time),
            FieldDescriptor::new("end_time", "End Time", FieldType::Time),
            FieldDescriptor::new("profile_picture", "Profile Picture", FieldType::File)
                .placeholder("path to an image file"),
            FieldDescriptor::new("is_verified", "Verified", FieldType::Checkbox),
            FieldDescriptor::new("is_available", "Available", FieldType::Checkbox),
        ]
    }

    fn new_form_data() -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("is_available".to_string(), json!(true));
        data.insert("is_verified".to_string(), json!(false));
        data.insert("working_days".to_string(), json!([]));
        data
    }

    fn edit_form_data(&self) -> Map<String, Value> {
        let mut data = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let hours = self.working_hours.as_ref();
        let expertise = match &self.expertise {
            Some(Value::Array(items)) => items
                .iter()
                .map(json_string_form)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };

        data.insert("latitude".to_string(), self.coordinate(1).unwrap_or(json!(0)));
        data.insert("longitude".to_string(), self.coordinate(0).unwrap_or(json!(0)));
        data.insert(
            "working_days".to_string(),
            self.working_days.clone().unwrap_or(json!([])),
        );
        data.insert(
            "start_time".to_string(),
            json!(hours.and_then(|h| h.start_time.clone()).unwrap_or_default()),
        );
        data.insert(
            "end_time".to_string(),
            json!(hours.and_then(|h| h.end_time.clone()).unwrap_or_default()),
        );
        data.insert("expertise".to_string(), json!(expertise));
        // The stored picture is a URL; only a newly picked file is uploaded
        data.insert("profile_picture".to_string(), json!(""));
        data
    }

    fn display_name(&self) -> String {
        let name = self.full_name();
        if name.is_empty() {
            self.row_id()
        } else {
            name
        }
    }

    /// Always multipart, over the declared fields only
    async fn encode_submission(
        fields: &[FieldDescriptor],
        submission: Map<String, Value>,
    ) -> ApiResult<Payload> {
        let mut body = MultipartBody::new();

        for field in fields {
            let Some(value) = submission.get(&field.name) else {
                continue;
            };
            let name = field.name.as_str();

            match (name, value) {
                (_, Value::Null) => {}
                (_, Value::String(path)) if field.field_type == FieldType::File => {
                    if !path.trim().is_empty() {
                        body.attach_file(name, path.trim()).await?;
                    }
                }
                ("expertise", Value::String(list)) => {
                    list.split(',')
                        .map(str::trim)
                        .filter(|item| !item.is_empty())
                        .for_each(|item| body.push_text(name, item));
                }
                (name, Value::String(s)) if OMIT_WHEN_EMPTY.contains(&name) && s.is_empty() => {}
                (name, value) => body.push_value(name, value),
            }
        }

        Ok(Payload::Multipart(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MultipartPart;
    use crate::schema::{validate_fields, SortDirection, TableViewState, ViewOptions};

    fn mechanic() -> Mechanic {
        serde_json::from_value(json!({
            "_id": "m1",
            "first_name": "Ali",
            "last_name": "Raza",
            "email": "ali@garage.pk",
            "city": "Lahore",
            "location": {"type": "Point", "coordinates": [74.35, 31.52]},
            "expertise": ["engine", "brakes"],
            "working_days": ["monday", "friday"],
            "working_hours": {"start_time": "09:00", "end_time": "18:00"},
            "profile_picture": "https://cdn.example.com/ali.png",
            "is_verified": false,
            "is_available": true,
            "average_rating": 4.3
        }))
        .unwrap()
    }

    #[test]
    fn test_row_cells() {
        let row = mechanic();
        assert_eq!(row.row_id(), "m1");
        assert_eq!(row.cell(MechanicKey::FullName), CellValue::from("Ali Raza"));
        assert_eq!(row.cell(MechanicKey::Expertise).string_form(), "engine,brakes");

        let columns = Mechanic::columns();
        assert_eq!(columns[6].render_cell(&row), CellContent::text("★ 4.3"));
        assert_eq!(
            columns[5].render_cell(&row),
            CellContent::badge("Yes", BadgeTone::Positive)
        );
    }

    #[test]
    fn test_rating_sort_puts_unrated_last() {
        let rows: Vec<Mechanic> = (0..60)
            .map(|i| {
                let rating = if i % 3 == 0 {
                    Value::Null
                } else {
                    json!(((i * 37) % 50) as f64 / 10.0)
                };
                serde_json::from_value(json!({"_id": format!("m{i}"), "average_rating": rating}))
                    .unwrap()
            })
            .collect();

        let mut view = TableViewState::new();
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            view.toggle_sort(MechanicKey::AverageRating);
            assert_eq!(view.sort(), Some((MechanicKey::AverageRating, direction)));

            let sorted = view.apply(&rows, ViewOptions::default());
            let ratings: Vec<Option<f64>> = sorted.iter().map(|row| row.average_rating).collect();
            let rated: Vec<f64> = ratings.iter().flatten().copied().collect();
            assert_eq!(rated.len(), 40);
            assert!(ratings[40..].iter().all(Option::is_none));
            assert!(rated.windows(2).all(|pair| match direction {
                SortDirection::Asc => pair[0] <= pair[1],
                SortDirection::Desc => pair[0] >= pair[1],
            }));
        }
    }

    #[test]
    fn test_edit_seed_flattens_nested_fields() {
        let seeded = mechanic().edit_form_data();
        assert_eq!(seeded.get("latitude"), Some(&json!(31.52)));
        assert_eq!(seeded.get("longitude"), Some(&json!(74.35)));
        assert_eq!(seeded.get("start_time"), Some(&json!("09:00")));
        assert_eq!(seeded.get("end_time"), Some(&json!("18:00")));
        assert_eq!(seeded.get("expertise"), Some(&json!("engine, brakes")));
        assert_eq!(seeded.get("working_days"), Some(&json!(["monday", "friday"])));
        assert_eq!(seeded.get("profile_picture"), Some(&json!("")));
    }

    #[test]
    fn test_new_seed() {
        let seeded = Mechanic::new_form_data();
        assert_eq!(seeded.get("is_available"), Some(&json!(true)));
        assert_eq!(seeded.get("is_verified"), Some(&json!(false)));
        assert_eq!(seeded.get("working_days"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_submission_encoding() {
        let fields = Mechanic::form_fields();
        let mut submission = mechanic().edit_form_data();
        submission.insert("workshop_name".to_string(), json!(""));
        submission.insert("start_time".to_string(), json!(""));
        submission.insert("expertise".to_string(), json!("engine, brakes ,, ac"));
        submission.insert("cnic".to_string(), Value::Null);

        let payload = Mechanic::encode_submission(&fields, submission).await.unwrap();
        let Payload::Multipart(body) = payload else {
            panic!("expected multipart, got {:?}", payload);
        };

        assert_eq!(body.text_values("working_days"), vec!["monday", "friday"]);
        assert_eq!(body.text_values("expertise"), vec!["engine", "brakes", "ac"]);
        assert_eq!(body.text_values("is_verified"), vec!["false"]);
        assert_eq!(body.text_values("is_available"), vec!["true"]);
        assert_eq!(body.text_values("latitude"), vec!["31.52"]);
        assert_eq!(body.text_values("end_time"), vec!["18:00"]);
        assert!(body.text_values("start_time").is_empty());
        assert!(body.text_values("workshop_name").is_empty());
        assert!(body.text_values("cnic").is_empty());
        assert!(body.text_values("profile_picture").is_empty());
        // Nested and undeclared fields are not sent
        assert!(body.parts().iter().all(|part| part.name() != "location"));
        assert!(body.parts().iter().all(|part| matches!(part, MultipartPart::Text { .. })));
    }

    #[tokio::test]
    async fn test_picked_file_is_uploaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("avatar.png");
        std::fs::write(&path, b"png").unwrap();

        let mut submission = Mechanic::new_form_data();
        submission.insert("profile_picture".to_string(), json!(path.to_string_lossy()));
        let payload = Mechanic::encode_submission(&Mechanic::form_fields(), submission)
            .await
            .unwrap();
        let Payload::Multipart(body) = payload else {
            panic!("expected multipart");
        };
        assert!(body.parts().iter().any(|part| matches!(
            part,
            MultipartPart::File { name, file_name, .. } if name == "profile_picture" && file_name == "avatar.png"
        )));
    }

    #[test]
    fn test_form_schema_is_valid() {
        assert!(validate_fields(&Mechanic::form_fields()).is_ok());
    }
}
