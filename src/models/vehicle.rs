use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{flag_badge, format_date, record_id, AdminResource, Resource};
use crate::schema::{
    BadgeTone, CellContent, CellValue, ColumnDescriptor, FieldDescriptor, FieldType, TableRow,
};

column_keys! {
    pub enum VehicleKey {
        Id => "_id",
        Brand => "brand",
        Model => "model",
        Year => "year",
        Type => "type",
        FuelType => "fuel_type",
        Transmission => "transmission",
        RegistrationNumber => "registration_number",
        MileageKm => "mileage_km",
        IsPrimary => "is_primary",
        IsActive => "is_active",
        Owner => "owner",
        CreatedAt => "created_at",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleOwner {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleOwner {
    pub fn name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub mongo_id: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(rename = "type", default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub fuel_type: Option<String>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub mileage_km: Option<f64>,
    #[serde(default)]
    pub is_primary: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<VehicleOwner>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TableRow for Vehicle {
    type Key = VehicleKey;

    fn cell(&self, key: VehicleKey) -> CellValue {
        match key {
            VehicleKey::Id => record_id(&self.id, &self.mongo_id),
            VehicleKey::Brand => self.brand.clone().into(),
            VehicleKey::Model => self.model.clone().into(),
            VehicleKey::Year => self.year.into(),
            VehicleKey::Type => self.vehicle_type.clone().into(),
            VehicleKey::FuelType => self.fuel_type.clone().into(),
            VehicleKey::Transmission => self.transmission.clone().into(),
            VehicleKey::RegistrationNumber => self.registration_number.clone().into(),
            VehicleKey::MileageKm => self.mileage_km.into(),
            VehicleKey::IsPrimary => self.is_primary.into(),
            VehicleKey::IsActive => self.is_active.into(),
            VehicleKey::Owner => self.owner.as_ref().map(VehicleOwner::name).into(),
            VehicleKey::CreatedAt => self.created_at.clone().into(),
        }
    }

    fn row_id(&self) -> String {
        self.cell(VehicleKey::Id).string_form()
    }
}

impl AdminResource for Vehicle {
    const RESOURCE: Resource = Resource::Vehicles;

    fn columns() -> Vec<ColumnDescriptor<Self>> {
        vec![
            ColumnDescriptor::new(VehicleKey::Id, "ID"),
            ColumnDescriptor::new(VehicleKey::Brand, "Brand").sortable(),
            ColumnDescriptor::new(VehicleKey::Model, "Model").sortable(),
            ColumnDescriptor::new(VehicleKey::Year, "Year").sortable(),
            ColumnDescriptor::new(VehicleKey::Type, "Type"),
            ColumnDescriptor::new(VehicleKey::FuelType, "Fuel"),
            ColumnDescriptor::new(VehicleKey::MileageKm, "Mileage (km)").sortable(),
            ColumnDescriptor::new(VehicleKey::IsActive, "Active")
                .with_render(|value, _| flag_badge(value, "Yes", "No", BadgeTone::Negative)),
            ColumnDescriptor::new(VehicleKey::Owner, "Owner").with_render(|value, _| {
                match value.string_form() {
                    name if name.is_empty() => CellContent::text("N/A"),
                    name => CellContent::text(name),
                }
            }),
            ColumnDescriptor::new(VehicleKey::CreatedAt, "Created At")
                .sortable()
                .with_render(|value, _| format_date(value)),
        ]
    }

    fn form_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("brand", "Brand", FieldType::Text),
            FieldDescriptor::new("model", "Model", FieldType::Text).required(),
            FieldDescriptor::new("year", "Year", FieldType::Number)
                .min(1900.0)
                .max(2100.0),
            FieldDescriptor::new("type", "Type", FieldType::Select)
                .required()
                .options([
                    ("car", "Car"),
                    ("bike", "Bike"),
                    ("truck", "Truck"),
                    ("van", "Van"),
                    ("suv", "SUV"),
                    ("bus", "Bus"),
                    ("other", "Other"),
                ]),
            FieldDescriptor::new("fuel_type", "Fuel Type", FieldType::Select).options([
                ("petrol", "Petrol"),
                ("diesel", "Diesel"),
                ("electric", "Electric"),
                ("hybrid", "Hybrid"),
                ("cng", "CNG"),
                ("lpg", "LPG"),
                ("hydrogen", "Hydrogen"),
                ("other", "Other"),
            ]),
            FieldDescriptor::new("transmission", "Transmission", FieldType::Select).options([
                ("manual", "Manual"),
                ("automatic", "Automatic"),
                ("semi_automatic", "Semi-Automatic"),
                ("cvt", "CVT"),
                ("dual_clutch", "Dual Clutch"),
                ("other", "Other"),
            ]),
            FieldDescriptor::new("mileage_km", "Current Mileage (km)", FieldType::Number)
                .required()
                .min(0.0),
            FieldDescriptor::new("is_primary", "Primary", FieldType::Checkbox),
            FieldDescriptor::new("is_active", "Active", FieldType::Checkbox),
            FieldDescriptor::new("registration_number", "Registration Number", FieldType::Text),
        ]
    }

    fn display_name(&self) -> String {
        let name = [self.brand.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.row_id()
        } else {
            name
        }
    }
}
