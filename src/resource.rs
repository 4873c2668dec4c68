//! Declarative description of the product admin resource: which form fields
//! exist, which constraints apply to them, and how the list table renders.
//!
//! The descriptor is served as JSON for the admin frontend, and the same
//! constants drive server-side validation so the two cannot drift apart.

use std::collections::BTreeMap;

use image::ImageFormat;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    error::{AppError, Result},
    models::{Lifecycle, ProductRequest},
};

pub const NAVIGATION_ICON: &str = "heroicon-o-rectangle-stack";

/// Key prefix of uploaded product images in the bucket.
pub const IMAGE_DIRECTORY: &str = "products";
pub const ACCEPTED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];
pub const MAX_IMAGE_SIZE_KB: usize = 5120;
pub const MAX_IMAGE_SIZE_BYTES: usize = MAX_IMAGE_SIZE_KB * 1024;

/// Largest value a `NUMERIC(12, 2)` price column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);
pub const PRICE_DECIMALS: u32 = 2;

pub const POLL_INTERVAL: &str = "5s";
pub const REORDER_COLUMN: &str = "sort";
pub const IMAGE_THUMBNAIL_SIZE: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    TextInput,
    Textarea,
    Toggle,
    FileUpload,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadConstraints {
    pub directory: &'static str,
    pub accepted_file_types: &'static [&'static str],
    pub max_size_kb: usize,
    pub multiple: bool,
    pub image: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub required: bool,
    pub numeric: bool,
    pub nullable: bool,
    pub disabled: bool,
    pub reactive: bool,
    /// Not stored on the record; lives only in the form session.
    pub dehydrated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadConstraints>,
}

impl FormField {
    fn new(name: &'static str, kind: FieldKind, label: &'static str) -> Self {
        Self {
            name,
            kind,
            label,
            required: false,
            numeric: false,
            nullable: false,
            disabled: false,
            reactive: false,
            dehydrated: true,
            placeholder: None,
            prefix: None,
            default: None,
            upload: None,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    fn reactive(mut self) -> Self {
        self.reactive = true;
        self
    }

    fn form_only(mut self) -> Self {
        self.dehydrated = false;
        self
    }

    fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    fn prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn upload(mut self, constraints: UploadConstraints) -> Self {
        self.upload = Some(constraints);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Boolean,
    Image,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub label: &'static str,
    pub sortable: bool,
    pub searchable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    pub circular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

impl TableColumn {
    fn new(name: &'static str, kind: ColumnKind, label: &'static str) -> Self {
        Self {
            name,
            kind,
            label,
            sortable: false,
            searchable: false,
            format: None,
            circular: false,
            size: None,
        }
    }

    fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    fn format(mut self, format: &'static str) -> Self {
        self.format = Some(format);
        self
    }

    fn circular(mut self, size: u32) -> Self {
        self.circular = true;
        self.size = Some(size);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub reorderable: &'static str,
    pub poll: &'static str,
    pub defer_loading: bool,
    pub striped: bool,
    pub record_classes: BTreeMap<&'static str, &'static str>,
    pub columns: Vec<TableColumn>,
    pub actions: Vec<&'static str>,
    pub bulk_actions: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub model: &'static str,
    pub navigation_icon: &'static str,
    pub form: Vec<FormField>,
    pub table: TableSchema,
    pub pages: BTreeMap<&'static str, &'static str>,
}

pub fn form_schema() -> Vec<FormField> {
    vec![
        FormField::new("name", FieldKind::TextInput, "Name").required(),
        FormField::new("price", FieldKind::TextInput, "Price")
            .required()
            .numeric()
            .prefix("$"),
        FormField::new("description", FieldKind::Textarea, "Description").nullable(),
        FormField::new("search_query", FieldKind::TextInput, "Search Query")
            .placeholder("Enter your search term...")
            .reactive()
            .form_only(),
        FormField::new("search_result", FieldKind::Textarea, "ChatGPT Response")
            .placeholder("Result will be shown here...")
            .disabled()
            .form_only(),
        FormField::new("status", FieldKind::Toggle, "Active Status").default_value(json!(true)),
        FormField::new("image", FieldKind::FileUpload, "Product Image")
            .nullable()
            .upload(UploadConstraints {
                directory: IMAGE_DIRECTORY,
                accepted_file_types: &ACCEPTED_IMAGE_TYPES,
                max_size_kb: MAX_IMAGE_SIZE_KB,
                multiple: true,
                image: true,
            }),
    ]
}

pub fn table_schema() -> TableSchema {
    let record_classes = [Lifecycle::Draft, Lifecycle::Reviewing, Lifecycle::Published]
        .into_iter()
        .map(|lifecycle| (lifecycle_name(lifecycle), lifecycle.row_class()))
        .collect();

    TableSchema {
        reorderable: REORDER_COLUMN,
        poll: POLL_INTERVAL,
        defer_loading: true,
        striped: true,
        record_classes,
        columns: vec![
            TableColumn::new("name", ColumnKind::Text, "Name")
                .sortable()
                .searchable(),
            TableColumn::new("price", ColumnKind::Text, "Price")
                .sortable()
                .format("money"),
            TableColumn::new("status", ColumnKind::Boolean, "Status").sortable(),
            TableColumn::new("image", ColumnKind::Image, "Image").circular(IMAGE_THUMBNAIL_SIZE),
            TableColumn::new("created_at", ColumnKind::Text, "Created")
                .format("date_time")
                .sortable(),
        ],
        actions: vec!["edit"],
        bulk_actions: vec!["delete"],
    }
}

pub fn descriptor() -> ResourceDescriptor {
    ResourceDescriptor {
        model: "product",
        navigation_icon: NAVIGATION_ICON,
        form: form_schema(),
        table: table_schema(),
        pages: BTreeMap::from([
            ("index", "/"),
            ("create", "/create"),
            ("edit", "/{record}/edit"),
        ]),
    }
}

fn lifecycle_name(lifecycle: Lifecycle) -> &'static str {
    match lifecycle {
        Lifecycle::Draft => "draft",
        Lifecycle::Reviewing => "reviewing",
        Lifecycle::Published => "published",
    }
}

/// Checks a create or update payload against the form's field rules.
/// On create every required field must be present; on update absent fields
/// keep their stored value, but present ones must still be valid.
pub fn validate_product(payload: &ProductRequest, creating: bool) -> Result<()> {
    let mut errors = BTreeMap::new();

    match payload.name.as_deref() {
        None if creating => {
            errors.insert("name".to_string(), "The name field is required.".to_string());
        }
        Some(name) if name.trim().is_empty() => {
            errors.insert("name".to_string(), "The name field is required.".to_string());
        }
        _ => {}
    }

    match payload.price {
        None if creating => {
            errors.insert("price".to_string(), "The price field is required.".to_string());
        }
        Some(price) if price < Decimal::ZERO => {
            errors.insert(
                "price".to_string(),
                "The price field must be at least 0.".to_string(),
            );
        }
        Some(price) if price > MAX_PRICE => {
            errors.insert(
                "price".to_string(),
                format!("The price field must not be greater than {}.", MAX_PRICE),
            );
        }
        Some(price) if price.normalize().scale() > PRICE_DECIMALS => {
            errors.insert(
                "price".to_string(),
                format!(
                    "The price field must have at most {} decimal places.",
                    PRICE_DECIMALS
                ),
            );
        }
        _ => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Maps an uploaded file's MIME type to the stored extension, rejecting
/// anything outside the accepted types, above the size cap, or whose
/// contents are not actually an image of the declared type.
pub fn validate_image(content_type: &str, body: &[u8]) -> std::result::Result<&'static str, String> {
    let (extension, expected) = match content_type {
        "image/jpeg" | "image/jpg" => ("jpg", ImageFormat::Jpeg),
        "image/png" => ("png", ImageFormat::Png),
        other => {
            return Err(format!(
                "The file must be of type: {}. Got {}.",
                ACCEPTED_IMAGE_TYPES.join(", "),
                other
            ));
        }
    };

    if body.is_empty() {
        return Err("The file is empty.".to_string());
    }

    if body.len() > MAX_IMAGE_SIZE_BYTES {
        return Err(format!(
            "The file may not be greater than {} kilobytes.",
            MAX_IMAGE_SIZE_KB
        ));
    }

    match image::guess_format(body) {
        Ok(detected) if detected == expected => Ok(extension),
        _ => Err(format!(
            "The file contents do not match its declared type {}.",
            content_type
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FormField {
        form_schema()
            .into_iter()
            .find(|f| f.name == name)
            .unwrap()
    }

    #[test]
    fn search_fields_never_reach_storage() {
        assert!(!field("search_query").dehydrated);
        assert!(field("search_query").reactive);
        assert!(!field("search_result").dehydrated);
        assert!(field("search_result").disabled);
        assert!(field("name").dehydrated);
    }

    #[test]
    fn image_field_carries_upload_constraints() {
        let upload = field("image").upload.unwrap();

        assert_eq!(upload.directory, "products");
        assert_eq!(upload.max_size_kb, 5120);
        assert!(upload.multiple);
        assert_eq!(upload.accepted_file_types, ["image/jpeg", "image/jpg", "image/png"]);
    }

    #[test]
    fn descriptor_lists_the_three_pages() {
        let descriptor = descriptor();

        assert_eq!(descriptor.pages["index"], "/");
        assert_eq!(descriptor.pages["create"], "/create");
        assert_eq!(descriptor.pages["edit"], "/{record}/edit");
        assert_eq!(descriptor.table.bulk_actions, vec!["delete"]);
    }

    #[test]
    fn table_maps_every_lifecycle_to_a_row_class() {
        let table = table_schema();

        assert_eq!(table.record_classes.len(), 3);
        assert_eq!(table.record_classes["draft"], "opacity-30");
        assert_eq!(table.reorderable, "sort");
        assert_eq!(table.poll, "5s");
    }

    #[test]
    fn only_name_is_searchable() {
        let searchable: Vec<_> = table_schema()
            .columns
            .into_iter()
            .filter(|c| c.searchable)
            .map(|c| c.name)
            .collect();

        assert_eq!(searchable, vec!["name"]);
    }

    #[test]
    fn create_requires_name_and_price() {
        let err = validate_product(&ProductRequest::default(), true).unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert!(errors.contains_key("name"));
                assert!(errors.contains_key("price"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn update_allows_missing_fields() {
        assert!(validate_product(&ProductRequest::default(), false).is_ok());
    }

    #[test]
    fn blank_name_and_negative_price_are_rejected() {
        let payload = ProductRequest {
            name: Some("   ".to_string()),
            price: Some(Decimal::new(-1, 2)),
            ..Default::default()
        };

        let err = validate_product(&payload, false).unwrap_err();

        match err {
            AppError::Validation(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors["price"], "The price field must be at least 0.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_price_is_valid() {
        let payload = ProductRequest {
            name: Some("Widget".to_string()),
            price: Some(Decimal::ZERO),
            ..Default::default()
        };

        assert!(validate_product(&payload, true).is_ok());
    }

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = b"\xff\xd8\xff\xe0\0\x10JFIF\0";

    fn padded(header: &[u8], len: usize) -> Vec<u8> {
        let mut body = header.to_vec();
        body.resize(len, 0);
        body
    }

    #[test]
    fn price_bounds_follow_the_column() {
        assert_eq!(MAX_PRICE.to_string(), "9999999999.99");

        let at_max = ProductRequest {
            price: Some(MAX_PRICE),
            ..Default::default()
        };
        assert!(validate_product(&at_max, false).is_ok());

        let too_big: ProductRequest =
            serde_json::from_str(r#"{"name": "W", "price": "100000000000"}"#).unwrap();
        match validate_product(&too_big, true).unwrap_err() {
            AppError::Validation(errors) => {
                assert!(errors["price"].contains("9999999999.99"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn price_with_more_than_two_decimals_is_rejected() {
        let precise: ProductRequest = serde_json::from_str(r#"{"price": "1.005"}"#).unwrap();
        let trailing_zeros: ProductRequest = serde_json::from_str(r#"{"price": "1.500"}"#).unwrap();

        assert!(matches!(
            validate_product(&precise, false),
            Err(AppError::Validation(_))
        ));
        assert!(validate_product(&trailing_zeros, false).is_ok());
    }

    #[test]
    fn accepted_image_types_map_to_extensions() {
        assert_eq!(validate_image("image/jpeg", JPEG_HEADER), Ok("jpg"));
        assert_eq!(validate_image("image/jpg", JPEG_HEADER), Ok("jpg"));
        assert_eq!(validate_image("image/png", PNG_HEADER), Ok("png"));
    }

    #[test]
    fn other_types_are_rejected() {
        assert!(validate_image("image/webp", PNG_HEADER).is_err());
        assert!(validate_image("application/pdf", PNG_HEADER).is_err());
    }

    #[test]
    fn declared_type_must_match_contents() {
        let script = b"#!/bin/sh\necho not an image\n";

        assert!(validate_image("image/png", script).is_err());
        assert!(validate_image("image/png", JPEG_HEADER).is_err());
        assert!(validate_image("image/jpeg", PNG_HEADER).is_err());
    }

    #[test]
    fn size_cap_is_inclusive() {
        assert!(validate_image("image/png", &padded(PNG_HEADER, MAX_IMAGE_SIZE_BYTES)).is_ok());
        assert!(
            validate_image("image/png", &padded(PNG_HEADER, MAX_IMAGE_SIZE_BYTES + 1)).is_err()
        );
        assert!(validate_image("image/png", &[]).is_err());
    }
}
