//! Tests for the typed value variant and its helpers.
mod common;
use std::path::Path;
use wizflow::prelude::*;

#[test]
fn test_type_names_resolve_to_kinds() {
    for kind in ValueKind::ALL {
        assert_eq!(ValueKind::from_type_name(kind.type_name()), Some(kind));
    }
    assert_eq!(ValueKind::from_type_name("long"), Some(ValueKind::Int64));
    assert_eq!(ValueKind::from_type_name("RasterElement"), None);

    assert_eq!(
        TypeName::parse("vector<double>").unwrap(),
        TypeName::Sequence(ValueKind::Double)
    );
    assert_eq!(TypeName::parse("unsigned short").unwrap().to_string(), "unsigned short");
    assert!(matches!(
        TypeName::parse("vector<RasterElement>"),
        Err(ValueError::UnknownType(_))
    ));
}

#[test]
fn test_scalar_text_forms() {
    let cases = [
        ("bool", DataValue::Bool(true), "true"),
        ("char", DataValue::Char(-5), "-5"),
        ("unsigned int", DataValue::UnsignedInt(42), "42"),
        ("double", DataValue::Double(0.25), "0.25"),
        ("string", DataValue::from("hello world"), "hello world"),
        ("Blob", DataValue::Blob(vec![1, 2, 3]), "AQID"),
        ("Filename", DataValue::Filename(Filename::new("/data/a.tif")), "/data/a.tif"),
    ];
    for (type_name, value, text) in cases {
        assert_eq!(value.type_name(), type_name);
        assert_eq!(value.to_xml_string(), text);
        assert_eq!(DataValue::from_xml_string(type_name, text).unwrap(), value);
    }
}

#[test]
fn test_datetime_text_form_and_log_fields() {
    let stamp = DateTime::parse_rfc3339("2024-03-05T07:08:09Z").unwrap();
    let value = DataValue::DateTime(stamp);
    assert_eq!(value.to_xml_string(), "2024-03-05T07:08:09Z");
    assert_eq!(DataValue::from_xml_string("DateTime", "2024-03-05T07:08:09Z").unwrap(), value);
    assert_eq!(stamp.log_date(), "05 Mar 2024");
    assert_eq!(stamp.log_time(), "07:08:09 UTC");
}

#[test]
fn test_sequences_are_space_separated() {
    let value = DataValue::from(vec![1i32, -2, 3]);
    assert_eq!(value.type_name(), "vector<int>");
    assert_eq!(value.to_xml_string(), "1 -2 3");
    assert_eq!(DataValue::from_xml_string("vector<int>", " 1  -2 3 ").unwrap(), value);

    let empty = DataValue::from_xml_string("vector<float>", "").unwrap();
    assert_eq!(empty.type_name(), "vector<float>");
    assert_eq!(empty.to_xml_string(), "");
}

#[test]
fn test_string_sequences_are_quoted_and_escaped() {
    let value = DataValue::from(vec![
        "plain".to_string(),
        "with space".to_string(),
        "say \"hi\"".to_string(),
        "back\\slash".to_string(),
    ]);
    let text = value.to_xml_string();
    assert_eq!(text, r#""plain" "with space" "say \"hi\"" "back\\slash""#);
    assert_eq!(DataValue::from_xml_string("vector<string>", &text).unwrap(), value);

    assert!(matches!(
        DataValue::from_xml_string("vector<string>", r#""unterminated"#),
        Err(ValueError::Parse { .. })
    ));
}

#[test]
fn test_sequence_rejects_mixed_and_nested_values() {
    let mixed = DataValue::sequence(ValueKind::Int, vec![DataValue::Int(1), DataValue::Double(2.0)]);
    assert!(matches!(mixed, Err(ValueError::MixedSequence { .. })));

    let mut sequence = Sequence::new(ValueKind::Int);
    assert!(sequence.push(DataValue::Int(7)).is_ok());
    let nested = sequence.push(DataValue::from(vec![1i32]));
    assert!(matches!(nested, Err(ValueError::NestedSequence(_))));
    assert_eq!(sequence.len(), 1);
}

#[test]
fn test_parse_errors_name_the_type() {
    let err = DataValue::from_xml_string("unsigned char", "300").unwrap_err();
    assert!(err.to_string().contains("unsigned char"));
    assert!(err.to_string().contains("300"));

    let err = DataValue::from_xml_string("bool", "maybe").unwrap_err();
    assert!(matches!(err, ValueError::Parse { .. }));
}

#[test]
fn test_typed_copy_from_any() {
    let copied = DataValue::from_any("int", &5i32).unwrap();
    assert_eq!(copied, DataValue::Int(5));

    let copied = DataValue::from_any("vector<double>", &vec![0.5f64, 1.5]).unwrap();
    assert_eq!(copied.to_xml_string(), "0.5 1.5");

    let copied = DataValue::from_any("string", &String::from("abc")).unwrap();
    assert_eq!(copied, DataValue::from("abc"));

    let already_typed = DataValue::Int64(9);
    assert_eq!(DataValue::from_any("long", &already_typed), Some(DataValue::Int64(9)));

    // Wrong backing type or unknown type name.
    assert_eq!(DataValue::from_any("int", &5i64), None);
    assert_eq!(DataValue::from_any("int", &DataValue::Double(1.0)), None);
    assert_eq!(DataValue::from_any("RasterElement", &5i32), None);
}

#[test]
fn test_filename_parts() {
    let file = Filename::new("/data/scenes/site.ntf");
    assert_eq!(file.file_name(), Some("site.ntf"));
    assert_eq!(file.extension(), Some("ntf"));
    assert_eq!(file.directory(), Some(Path::new("/data/scenes")));
    assert_eq!(Filename::new("site.ntf").directory(), None);
}

#[test]
fn test_sequences_with_empty_items_round_trip() {
    let sequences = [
        DataValue::from(vec![String::new(), "a".to_string()]),
        DataValue::from(vec![Filename::new(""), Filename::new("/x y")]),
        DataValue::sequence(
            ValueKind::Blob,
            vec![DataValue::Blob(Vec::new()), DataValue::Blob(vec![1])],
        )
        .unwrap(),
    ];
    for value in sequences {
        let text = value.to_xml_string();
        assert_eq!(DataValue::from_xml_string(&value.type_name(), &text).unwrap(), value);
    }
}

#[test]
fn test_every_kind_round_trips_in_a_sequence() {
    let stamp = DateTime::parse_rfc3339("2024-03-05T07:08:09Z").unwrap();
    let samples = [
        DataValue::Bool(false),
        DataValue::Char(-1),
        DataValue::UnsignedChar(200),
        DataValue::Short(-300),
        DataValue::UnsignedShort(60000),
        DataValue::Int(-7),
        DataValue::UnsignedInt(7),
        DataValue::Int64(-1 << 40),
        DataValue::UnsignedInt64(1 << 50),
        DataValue::Float(1.5),
        DataValue::Double(-0.125),
        DataValue::from("two words"),
        DataValue::Blob(vec![0, 255]),
        DataValue::DateTime(stamp),
        DataValue::Filename(Filename::new("/data/a b.tif")),
    ];
    for sample in samples {
        let kind = sample.scalar_kind().unwrap();
        let value = DataValue::sequence(kind, vec![sample.clone(), sample]).unwrap();
        let text = value.to_xml_string();
        assert_eq!(DataValue::from_xml_string(&value.type_name(), &text).unwrap(), value);
    }
}
