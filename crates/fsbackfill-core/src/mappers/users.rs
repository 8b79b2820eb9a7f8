//! `Users` collection → `users` table

use crate::model::{Column, Document, Row, TableSpec, Value};
use crate::registry::CollectionMapping;

pub const COLLECTION: &str = "Users";
pub const TABLE: &str = "users";
pub const CONFLICT_COLUMN: &str = "uid";

pub fn table() -> TableSpec {
    TableSpec::new(
        TABLE,
        CONFLICT_COLUMN,
        vec![
            Column::text("uid"),
            Column::text("first_name"),
            Column::text("last_name"),
            Column::text("middle_name"),
            Column::text("profile_image"),
            Column::text("gender"),
            Column::text("linkedin"),
            Column::text("work_email"),
            Column::text("personal_email"),
            Column::text("phone_number"),
            Column::text("address1"),
            Column::text("address2"),
            Column::text("city"),
            Column::text("state"),
            Column::text("zipcode"),
            Column::text("country"),
            Column::boolean("is_active"),
            Column::text("stripe_customer_id"),
            Column::timestamptz("create_date"),
            Column::timestamptz("update_date"),
            Column::timestamptz("last_login_date"),
            Column::text("title"),
        ],
    )
}

/// Values are listed in the order of [`table`]'s columns.
pub fn map(doc: &Document) -> Row {
    let field = |name: &str| Value::from_field(doc.get(name));
    let email = field("email");

    Row::new(vec![
        Value::text(doc.id.clone()),
        field("firstName"),
        field("lastName"),
        field("middleName"),
        Value::Null, // profile_image
        Value::Null, // gender
        Value::Null, // linkedin
        email.clone(),
        email,
        field("phone"),
        field("address1"),
        field("address2"),
        field("city"),
        field("state"),
        field("zipcode"),
        field("country"),
        Value::Bool(true), // is_active
        Value::Null,       // stripe_customer_id
        Value::Null,       // create_date
        Value::Null,       // update_date
        Value::Null,       // last_login_date
        field("title"),
    ])
}

pub fn mapping() -> CollectionMapping {
    CollectionMapping::new(COLLECTION, table(), map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldValue;

    fn value_of<'a>(row: &'a Row, column: &str) -> &'a Value {
        let idx = table().column_index(column).unwrap();
        row.get(idx).unwrap()
    }

    fn full_doc() -> Document {
        Document::new("uid-123")
            .with_field("firstName", FieldValue::String("Ada".into()))
            .with_field("lastName", FieldValue::String("Lovelace".into()))
            .with_field("middleName", FieldValue::String("King".into()))
            .with_field("email", FieldValue::String("ada@example.com".into()))
            .with_field("phone", FieldValue::String("+44 20 0000".into()))
            .with_field("address1", FieldValue::String("12 St James's Sq".into()))
            .with_field("city", FieldValue::String("London".into()))
            .with_field("country", FieldValue::String("UK".into()))
            .with_field("title", FieldValue::String("Analyst".into()))
    }

    #[test]
    fn test_identifier_passthrough() {
        let row = map(&full_doc());
        assert_eq!(value_of(&row, "uid"), &Value::text("uid-123"));
    }

    #[test]
    fn test_renames() {
        let row = map(&full_doc());
        assert_eq!(value_of(&row, "first_name"), &Value::text("Ada"));
        assert_eq!(value_of(&row, "last_name"), &Value::text("Lovelace"));
        assert_eq!(value_of(&row, "middle_name"), &Value::text("King"));
        assert_eq!(value_of(&row, "phone_number"), &Value::text("+44 20 0000"));
        assert_eq!(value_of(&row, "title"), &Value::text("Analyst"));
    }

    #[test]
    fn test_email_fans_out() {
        let row = map(&full_doc());
        assert_eq!(value_of(&row, "work_email"), &Value::text("ada@example.com"));
        assert_eq!(value_of(&row, "personal_email"), &Value::text("ada@example.com"));
    }

    #[test]
    fn test_columns_without_source_are_null_or_constant() {
        let row = map(&full_doc().with_field("linkedin", FieldValue::String("x".into())));
        for column in [
            "profile_image",
            "gender",
            "linkedin",
            "stripe_customer_id",
            "create_date",
            "update_date",
            "last_login_date",
        ] {
            assert_eq!(value_of(&row, column), &Value::Null, "column {column}");
        }
        assert_eq!(value_of(&row, "is_active"), &Value::Bool(true));
    }

    #[test]
    fn test_missing_optional_fields_are_null() {
        let row = map(&Document::new("bare"));
        assert_eq!(row.len(), table().columns.len());
        assert_eq!(value_of(&row, "first_name"), &Value::Null);
        assert_eq!(value_of(&row, "address2"), &Value::Null);
        assert_eq!(value_of(&row, "work_email"), &Value::Null);
        assert_eq!(value_of(&row, "personal_email"), &Value::Null);
    }

    #[test]
    fn test_mapping_passes_checks() {
        assert!(mapping().map_checked(&full_doc()).is_ok());
        assert!(mapping().map_checked(&Document::new("bare")).is_ok());
    }
}
