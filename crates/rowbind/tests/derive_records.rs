//! Derived descriptors feeding the clause builders.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rowbind::clause::{self, ClauseBuilder, Dialect};
use rowbind::{
    FieldKind, FieldValue, FromRow, OrmError, OrmResult, Record, Row, Value, present_fields,
};

#[derive(Debug, Record, FromRow)]
#[orm(rename_all = "PascalCase")]
struct User {
    #[orm(column = "ID")]
    id: i64,
    name: String,
    age: i32,
}

#[derive(Debug, Default, Record)]
#[orm(rename_all = "PascalCase")]
struct UserFilter {
    name: String,
    age: i32,
}

#[derive(Debug, Default, Record)]
#[orm(rename_all = "UPPERCASE")]
struct Abc {
    a: String,
    b: String,
    c: i32,
}

#[derive(Debug, Default, Record)]
struct Ledger {
    owner: String,
    balance: Option<f64>,
    frozen: bool,
    opened: Option<NaiveDate>,
    settled_at: NaiveDateTime,
    audited_at: DateTime<Utc>,
    memo: Option<String>,
}

#[test]
fn descriptor_follows_declaration_order() {
    let names: Vec<&str> = User::COLUMNS.iter().map(|c| c.name).collect();
    assert_eq!(names, ["ID", "Name", "Age"]);
    assert_eq!(User::COLUMNS[1].kind, FieldKind::Text);
    assert!(!User::COLUMNS[1].nullable);

    assert_eq!(Ledger::COLUMNS[1].kind, FieldKind::Float);
    assert!(Ledger::COLUMNS[1].nullable);
    assert_eq!(Ledger::COLUMNS[4].name, "settled_at");
}

#[test]
fn select_with_partially_set_selector() {
    let selector = UserFilter {
        name: String::new(),
        age: 30,
    };
    let c = clause::select::<User, _>("users", &selector).unwrap();
    assert_eq!(
        c.sql(),
        "SELECT ID, IFNULL(Name, '') AS Name, Age FROM users WHERE Age = ?"
    );
    assert_eq!(c.params(), &[Value::Int(30)]);
}

#[test]
fn insert_skips_unset_fields() {
    let values = Abc {
        a: "x".into(),
        b: String::new(),
        c: 3,
    };
    let c = clause::insert("t", &values).unwrap();
    assert_eq!(c.sql(), "INSERT INTO t(A, C) VALUES (?, ?)");
    assert_eq!(c.params(), &[Value::Text("x".into()), Value::Int(3)]);
}

#[test]
fn all_unset_selector_drops_where() {
    let values = Abc {
        c: 1,
        ..Abc::default()
    };
    let update = clause::update("t", &Abc::default(), &values).unwrap();
    let delete = clause::delete("t", &Abc::default()).unwrap();

    assert!(!update.sql().contains("WHERE"));
    assert!(!delete.sql().contains("WHERE"));
    assert!(!update.has_where());
    assert!(!delete.has_where());
}

#[test]
fn explicit_zero_survives_through_option() {
    let ledger = Ledger {
        balance: Some(0.0),
        frozen: false,
        ..Ledger::default()
    };
    let set: Vec<&str> = present_fields(&ledger).iter().map(|f| f.name()).collect();
    assert_eq!(set, ["balance", "frozen"]);

    let c = ClauseBuilder::new(Dialect::Postgres)
        .delete("ledgers", &ledger)
        .unwrap();
    assert_eq!(c.sql(), "DELETE FROM ledgers WHERE balance = $1 AND frozen = $2");
    assert_eq!(c.params(), &[Value::Float(0.0), Value::Bool(false)]);
}

#[test]
fn epoch_timestamps_count_as_unset() {
    let ledger = Ledger {
        settled_at: DateTime::from_timestamp(0, 0).unwrap().naive_utc(),
        audited_at: DateTime::from_timestamp(60, 0).unwrap(),
        ..Ledger::default()
    };
    let set: Vec<&str> = present_fields(&ledger).iter().map(|f| f.name()).collect();
    assert_eq!(set, ["frozen", "audited_at"]);
}

#[test]
fn nullable_text_is_projected_as_is() {
    let c = clause::select::<LedgerRow, _>("ledgers", &()).unwrap();
    assert_eq!(c.sql(), "SELECT IFNULL(owner, '') AS owner, memo FROM ledgers");
}

#[derive(Debug, Record, FromRow)]
struct LedgerRow {
    owner: String,
    memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Record, FromRow)]
struct Profile {
    id: i64,
    handle: String,
    score: f64,
    ratio: f32,
    active: bool,
    born: NaiveDate,
    seen_at: NaiveDateTime,
    verified_at: DateTime<Utc>,
    rank: Option<i16>,
    bio: Option<String>,
    token: uuid::Uuid,
}

/// A row echoing back the values a record was introspected into.
struct EchoRow(Vec<FieldValue>);

impl Row for EchoRow {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn column_name(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(|f| f.name())
    }

    fn value_at(&self, idx: usize) -> OrmResult<Value> {
        self.0
            .get(idx)
            .map(|f| f.value.clone())
            .ok_or_else(|| OrmError::scan(idx, "?", "no such column"))
    }
}

#[test]
fn present_fields_scan_back_into_an_equal_record() -> OrmResult<()> {
    let profile = Profile {
        id: 9,
        handle: "ann".into(),
        score: 12.25,
        ratio: 0.5,
        active: false,
        born: NaiveDate::from_ymd_opt(1990, 4, 1).unwrap(),
        seen_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap().naive_utc(),
        verified_at: DateTime::from_timestamp(1_700_000_600, 0).unwrap(),
        rank: Some(0),
        bio: Some(String::new()),
        token: uuid::Uuid::from_u128(7),
    };

    let present = present_fields(&profile);
    assert_eq!(present.len(), Profile::COLUMNS.len());

    let back = Profile::from_row(&EchoRow(present))?;
    assert_eq!(back, profile);
    Ok(())
}

#[test]
fn unset_fields_leave_the_row_short() {
    let sparse = LedgerRow {
        owner: "ann".into(),
        memo: None,
    };
    let err = LedgerRow::from_row(&EchoRow(present_fields(&sparse))).unwrap_err();
    assert!(matches!(err, OrmError::Scan { .. }));

    let back = LedgerRow::from_row(&EchoRow(sparse.fields())).unwrap();
    assert_eq!((back.owner.as_str(), back.memo), ("ann", None));
}
