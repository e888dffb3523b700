use silo_core::{DbError, Operation, Placeholder, infer_operation, standardize};

#[test]
fn standardize_named_markers() {
    let sql = "SELECT * FROM department WHERE name=$name$ AND count>$Count$";
    let (std_sql, params) = standardize(sql, Placeholder::Question).unwrap();
    assert_eq!(std_sql, "SELECT * FROM department WHERE name=? AND count>?");
    assert_eq!(params, vec!["name".to_owned(), "Count".to_owned()]);
}

#[test]
fn standardize_numbered_markers() {
    let sql = "UPDATE t SET a=$a$, b=$b$ WHERE a=$a$";
    let (std_sql, params) = standardize(sql, Placeholder::Numbered).unwrap();
    assert_eq!(std_sql, "UPDATE t SET a=$1, b=$2 WHERE a=$3");
    assert_eq!(
        params,
        vec!["a".to_owned(), "b".to_owned(), "a".to_owned()]
    );
}

#[test]
fn standardize_keeps_declaration_order_with_repeats() {
    let sql = "SELECT * FROM t WHERE x=$x$ OR y=$y$ OR x=$x$";
    let (_, params) = standardize(sql, Placeholder::Question).unwrap();
    assert_eq!(
        params,
        vec!["x".to_owned(), "y".to_owned(), "x".to_owned()]
    );
}

#[test]
fn standardize_trims_marker_text() {
    let (std_sql, params) = standardize("WHERE a=$ a $", Placeholder::Question).unwrap();
    assert_eq!(std_sql, "WHERE a=?");
    assert_eq!(params, vec!["a".to_owned()]);
}

#[test]
fn standardize_without_markers_is_identity() {
    let sql = "DELETE FROM department";
    let (std_sql, params) = standardize(sql, Placeholder::Question).unwrap();
    assert_eq!(std_sql, sql);
    assert!(params.is_empty());
}

#[test]
fn standardize_rejects_unterminated_marker() {
    let sql = "SELECT * FROM department WHERE name=$name$ AND count>$Count";
    let error = standardize(sql, Placeholder::Question).unwrap_err();
    assert!(matches!(error, DbError::TemplateCompile { .. }));
    assert_eq!(error.code(), 2);
}

#[test]
fn infer_known_verbs() {
    assert_eq!(infer_operation(" select * FROM table1 "), Operation::Select);
    assert_eq!(
        infer_operation(" insert INTO table1 values($xx$,$yy$) "),
        Operation::Insert
    );
    assert_eq!(infer_operation(" update table1 SET xx=$xx$ "), Operation::Update);
    assert_eq!(infer_operation(" delete FROM table1 "), Operation::Delete);
}

#[test]
fn infer_unknown_verb_is_generic() {
    assert_eq!(infer_operation(" show tables;"), Operation::Generic);
    assert_eq!(infer_operation("WITH x AS (SELECT 1) SELECT * FROM x"), Operation::Generic);
    assert_eq!(infer_operation("sel"), Operation::Generic);
    assert_eq!(infer_operation(""), Operation::Generic);
}

#[test]
fn placeholder_style_follows_driver() {
    assert_eq!(Placeholder::for_driver("postgres"), Placeholder::Numbered);
    assert_eq!(Placeholder::for_driver("postgresql"), Placeholder::Numbered);
    assert_eq!(Placeholder::for_driver("sqlite"), Placeholder::Question);
    assert_eq!(Placeholder::for_driver("mysql"), Placeholder::Question);
}
