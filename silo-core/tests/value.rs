use silo_core::{AsValue, ScalarKind, Value};

#[test]
fn value_null() {
    assert_eq!(Value::Null, Value::Null);
    assert!(Value::Null.is_null());
    assert!(Value::Int64(None).is_null());
    assert!(!Value::Int64(Some(0)).is_null());
    assert_ne!(Value::Float32(Some(1.0)), Value::Null);
}

#[test]
fn value_bool() {
    let val: Value = true.into();
    assert_eq!(val, Value::Boolean(Some(true)));
    assert_ne!(val, Value::Boolean(Some(false)));
    assert_eq!(bool::try_from_value(val).unwrap(), true);
    assert_eq!(bool::try_from_value(Value::Int64(Some(1))).unwrap(), true);
    assert_eq!(bool::try_from_value(Value::Int32(Some(0))).unwrap(), false);
    assert!(bool::try_from_value(Value::Float64(Some(0.5))).is_err());
}

#[test]
fn value_i64_accepts_narrower_integers() {
    let val: Value = 42i64.into();
    assert_eq!(val, Value::Int64(Some(42)));
    assert_eq!(i64::try_from_value(Value::Int16(Some(7))).unwrap(), 7);
    assert_eq!(i64::try_from_value(Value::Int32(Some(-9))).unwrap(), -9);
    assert!(i64::try_from_value(Value::Varchar(Some("42".into()))).is_err());
}

#[test]
fn value_i32_range_checks_wider_integers() {
    assert_eq!(i32::try_from_value(Value::Int64(Some(1000))).unwrap(), 1000);
    assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
    assert_eq!(i16::try_from_value(Value::Int64(Some(-32768))).unwrap(), -32768);
    assert!(i16::try_from_value(Value::Int32(Some(70000))).is_err());
}

#[test]
fn value_string() {
    let val: Value = "hello".into();
    assert_eq!(val, Value::Varchar(Some("hello".to_owned())));
    assert_eq!(String::try_from_value(val).unwrap(), "hello");
    assert!(String::try_from_value(Value::Int64(Some(1))).is_err());
}

#[test]
fn value_option_maps_null_both_ways() {
    let val: Value = Option::<i64>::None.into();
    assert!(val.is_null());
    assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
    assert_eq!(
        Option::<i64>::try_from_value(Value::Int64(None)).unwrap(),
        None
    );
    assert_eq!(
        Option::<i64>::try_from_value(Value::Int64(Some(3))).unwrap(),
        Some(3)
    );
    assert_eq!(Option::<i64>::kind(), ScalarKind::Int64);
}

#[test]
fn scalar_kind_names() {
    assert_eq!(ScalarKind::from_name("int64"), Some(ScalarKind::Int64));
    assert_eq!(ScalarKind::from_name("i64"), Some(ScalarKind::Int64));
    assert_eq!(ScalarKind::from_name("int"), Some(ScalarKind::Int64));
    assert_eq!(ScalarKind::from_name("string"), Some(ScalarKind::Varchar));
    assert_eq!(ScalarKind::from_name("bool"), Some(ScalarKind::Boolean));
    assert_eq!(ScalarKind::from_name("duration"), None);
}

#[test]
fn scalar_kind_parses_literals() {
    assert_eq!(
        ScalarKind::Int64.parse_literal("-1").unwrap(),
        Value::Int64(Some(-1))
    );
    assert_eq!(
        ScalarKind::Varchar.parse_literal("N/A").unwrap(),
        Value::Varchar(Some("N/A".to_owned()))
    );
    assert!(ScalarKind::Int64.parse_literal("many").is_err());
}
