use silo::{DbError, Output, Params, RecordDescriptor, Registry, TxState, Value};

#[derive(Debug, Default, Clone)]
struct Person {
    id: i64,
    name: String,
    age: Option<i64>,
    contact: Contact,
}

#[derive(Debug, Default, Clone)]
struct Contact {
    email: Option<String>,
}

fn person_descriptor() -> RecordDescriptor {
    RecordDescriptor::of::<Person>("Person")
        .field("id", |p: &mut Person, v: i64| p.id = v)
        .field("name", |p: &mut Person, v: String| p.name = v)
        .field("age", |p: &mut Person, v: Option<i64>| p.age = v)
        .field("contact.email", |p: &mut Person, v: Option<String>| {
            p.contact.email = v
        })
        .build()
}

async fn start_registry() -> Registry {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = Registry::new();
    let db = registry.get("main");
    db.register_record(person_descriptor())
        .expect("Failed to register the Person record");
    registry
        .start("tests/resource")
        .await
        .expect("Failed to start the registry");
    db.exec("people.schema", &Params::None)
        .await
        .expect("Failed to create the people table");
    registry
}

async fn count(db: &silo::DataSource) -> i64 {
    let scalar = db
        .query_one("people.count", &Params::None)
        .await
        .expect("Failed to count people")
        .and_then(Output::into_scalar)
        .expect("Expected a scalar output");
    match scalar {
        Value::Int64(Some(count)) => count,
        other => panic!("unexpected count value: {other:?}"),
    }
}

fn params(name: &str) -> Params {
    Params::map([
        ("name", Value::from(name)),
        ("age", Value::from(1i64)),
        ("email", Value::Null),
    ])
}

#[tokio::test]
async fn callback_returning_true_commits() {
    let registry = start_registry().await;
    let db = registry.get("main");

    db.do_transaction(|tx| {
        Box::pin(async move {
            tx.insert("people.add", &params("committed")).await?;
            assert_eq!(tx.state(), TxState::Open);
            Ok(true)
        })
    })
    .await
    .expect("Failed to run the committing transaction");

    assert_eq!(count(&db).await, 1);
}

#[tokio::test]
async fn callback_returning_false_rolls_back() {
    let registry = start_registry().await;
    let db = registry.get("main");

    db.do_transaction(|tx| {
        Box::pin(async move {
            tx.insert("people.add", &params("discarded")).await?;
            Ok(false)
        })
    })
    .await
    .expect("A rolled back transaction is not an error");

    assert_eq!(count(&db).await, 0);
}

#[tokio::test]
async fn callback_error_rolls_back_and_is_reported() {
    let registry = start_registry().await;
    let db = registry.get("main");

    let error = db
        .do_transaction(|tx| {
            Box::pin(async move {
                tx.insert("people.add", &params("doomed")).await?;
                // Unresolvable parameter: the binder fails hard.
                tx.insert("people.add", &Params::map::<&str, Value, _>([]))
                    .await?;
                Ok(true)
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(error, DbError::MissingParameter { .. }));

    assert_eq!(count(&db).await, 0);
}

#[tokio::test]
async fn callback_panic_rolls_back_and_converts() {
    let registry = start_registry().await;
    let db = registry.get("main");

    let error = db
        .do_transaction(|tx| {
            Box::pin(async move {
                tx.insert("people.add", &params("lost")).await?;
                panic!("boom");
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(error, DbError::InternalFault { .. }));
    assert_eq!(error.code(), 9);
    assert!(error.to_string().contains("boom"));

    assert_eq!(count(&db).await, 0);
}

#[tokio::test]
async fn transaction_sees_its_own_writes() {
    let registry = start_registry().await;
    let db = registry.get("main");

    db.do_transaction(|tx| {
        Box::pin(async move {
            let id = tx.insert("people.add", &params("visible")).await?;
            let person = tx
                .query_one("people.load", &Params::scalar(id))
                .await?
                .and_then(Output::into_record::<Person>);
            match person {
                Some(person) => {
                    assert_eq!(person.name, "visible");
                    assert_eq!(person.id, id);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    })
    .await
    .expect("Failed to read back inside the transaction");

    assert_eq!(count(&db).await, 1);
}
