//! End-to-end tests against the in-memory client.
//!
//! Run with: cargo test --test test_loopback

use fbclient_rs::protocol::constants::{
    CS_NONE, CS_UTF8, ISC_INFO_SQL_STMT_INSERT, ISC_INFO_SQL_STMT_SELECT_FOR_UPD, SQL_BLOB, SQL_BOOLEAN,
    SQL_DOUBLE, SQL_FLOAT, SQL_INT128, SQL_INT64, SQL_LONG, SQL_SHORT, SQL_TEXT, SQL_TYPE_DATE, SQL_VARYING,
};
use fbclient_rs::protocol::decode::Int128;
use fbclient_rs::{make_tpb, Attachment, Error, LoopbackClient, Script, SqlValue, SqlVar};

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

const ROW_SQL: &str = "SELECT ?, ?, ?, ?, ?, ?, ?, ?, ? FROM RDB$DATABASE";

fn row_columns() -> Vec<SqlVar> {
    vec![
        SqlVar::new(SQL_SHORT, 2).named("C_SMALLINT").nullable(),
        SqlVar::new(SQL_LONG, 4).named("C_INT").nullable(),
        SqlVar::new(SQL_INT64, 8).named("C_BIGINT").nullable(),
        SqlVar::new(SQL_INT128, 16).named("C_INT128").nullable(),
        SqlVar::new(SQL_DOUBLE, 8).named("C_DOUBLE").nullable(),
        SqlVar::new(SQL_FLOAT, 4).named("C_FLOAT").nullable(),
        SqlVar::new(SQL_BOOLEAN, 1).named("C_BOOLEAN").nullable(),
        SqlVar::new(SQL_TEXT, 40).with_subtype(CS_UTF8).named("C_CHAR").nullable(),
        SqlVar::new(SQL_VARYING, 40).with_subtype(CS_UTF8).named("C_VARCHAR").nullable(),
    ]
}

fn attach(client: &LoopbackClient) -> Attachment {
    Attachment::attach(client.clone(), "employee.fdb", &[]).unwrap()
}

#[test]
fn test_row_round_trip() {
    let client = LoopbackClient::new();
    client.script(ROW_SQL, Script::echo(row_columns()));
    let mut att = attach(&client);

    att.transaction(|tr| {
        tr.statement(ROW_SQL, |stmt| {
            {
                let mut p = stmt.params()?;
                p.set_i16(0, i16::MAX)?;
                p.set_i32(1, i32::MAX)?;
                p.set_i64(2, i64::MAX)?;
                p.set_int128(3, Int128::from_i64(i64::MIN))?;
                p.set_f64(4, f64::MAX)?;
                p.set_f32(5, f32::MAX)?;
                p.set_bool(6, true)?;
                p.set_string(7, "firebird")?;
                p.set_string(8, "firebird")?;
            }
            stmt.open(|rs| {
                assert!(!rs.eof());
                assert_eq!(rs.get_i16(0)?, 32767);
                assert_eq!(rs.get_i32(1)?, 2147483647);
                assert_eq!(rs.get_i64(2)?, i64::MAX);
                assert_eq!(rs.get_int128(3)?, Int128::from_i64(i64::MIN));
                assert_eq!(rs.get_f64(4)?, f64::MAX);
                assert_eq!(rs.get_f32(5)?, f32::MAX);
                assert!(rs.get_bool(6)?);
                assert_eq!(rs.get_string(7)?, "firebird  ");
                assert_eq!(rs.get_string(8)?, "firebird");
                assert_eq!(rs.column_name(8)?, "C_VARCHAR");
                assert_eq!(rs.find("C_BIGINT"), Some(2));
                assert!(!rs.fetch()?);
                assert!(rs.eof());
                Ok(())
            })
        })
    })
    .unwrap();

    let stats = client.stats();
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.statements, 0);
    assert_eq!(stats.transactions, 0);
}

#[test]
fn test_null_contract() {
    let client = LoopbackClient::new();
    client.script(ROW_SQL, Script::echo(row_columns()));
    let mut att = attach(&client);

    att.transaction(|tr| {
        tr.statement(ROW_SQL, |stmt| {
            let mut p = stmt.params()?;
            p.set_i32(1, 7)?;
            assert!(!p.is_null(1)?);
            p.set_null(1)?;
            assert!(p.is_null(1)?);
            assert!(matches!(p.get_i32(1), Err(Error::NullField { index: 1 })));
            assert_eq!(p.get_i32_opt(1)?, None);
            assert_eq!(p.get_value(1)?, SqlValue::Null);
            Ok(())
        })
    })
    .unwrap();
}

#[test]
fn test_any_values_through_echo() {
    let columns = vec![
        SqlVar::new(SQL_LONG, 4).with_scale(-2).named("PRICE").nullable(),
        SqlVar::new(SQL_TYPE_DATE, 4).named("HIRED").nullable(),
        SqlVar::new(SQL_VARYING, 80).with_subtype(CS_UTF8).named("NAME").nullable(),
        SqlVar::new(SQL_INT64, 8).named("ID").nullable(),
    ];
    let sql = "SELECT ?, ?, ?, ? FROM RDB$DATABASE";
    let client = LoopbackClient::new();
    client.script(sql, Script::echo(columns));
    let mut att = attach(&client);

    let price = BigDecimal::from_str("123.45").unwrap();
    let hired = NaiveDate::from_ymd_opt(1993, 2, 4).unwrap();
    let input = vec![
        SqlValue::Decimal(price.clone()),
        SqlValue::Date(hired),
        SqlValue::from("Zoë"),
        SqlValue::Null,
    ];
    let values = att.open(sql, &input, |rs| rs.values()).unwrap();
    assert_eq!(values, input);

    let logged = client.executions_of(sql);
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].params, input);
}

#[test]
fn test_returning_singleton() {
    let sql = "INSERT INTO COUNTRY (COUNTRY, CURRENCY) VALUES (?, ?) RETURNING COUNTRY, CURRENCY";
    let columns = vec![
        SqlVar::new(SQL_VARYING, 60).with_subtype(CS_UTF8).named("COUNTRY"),
        SqlVar::new(SQL_VARYING, 40).with_subtype(CS_UTF8).named("CURRENCY"),
    ];
    let client = LoopbackClient::new();
    client.script(sql, Script::echo(columns));
    let mut att = attach(&client);

    let (country, currency) = att
        .statement(sql, |stmt| {
            assert_eq!(stmt.statement_type()?, ISC_INFO_SQL_STMT_INSERT);
            stmt.execute_with(&["Atlantis".into(), "Pearl".into()])?;
            let mut result = stmt.result()?;
            Ok((result.get_string(0)?, result.get_string(1)?))
        })
        .unwrap();
    assert_eq!(country, "Atlantis");
    assert_eq!(currency, "Pearl");
}

#[test]
fn test_sequence_per_execution() {
    let sql = "SELECT NEXT VALUE FOR EMP_NO_GEN FROM RDB$DATABASE";
    let client = LoopbackClient::new();
    client.script(sql, Script::sequence("GEN_ID", 145));
    let mut att = attach(&client);

    let ids: Vec<i64> = (0..3)
        .map(|_| att.open(sql, &[], |rs| rs.get_i64(0)).unwrap())
        .collect();
    assert_eq!(ids, vec![145, 146, 147]);
}

#[test]
fn test_update_where_current_of() {
    let select = "SELECT EMP_NO, SALARY FROM EMPLOYEE FOR UPDATE";
    let update = "UPDATE EMPLOYEE SET SALARY = ? WHERE CURRENT OF EMP";
    let client = LoopbackClient::new();
    client.script(
        select,
        Script::rows(
            vec![
                SqlVar::new(SQL_SHORT, 2).named("EMP_NO"),
                SqlVar::new(SQL_INT64, 8).with_scale(-2).named("SALARY"),
            ],
            vec![
                vec![SqlValue::Short(2), SqlValue::Decimal(BigDecimal::from_str("1000.00").unwrap())],
                vec![SqlValue::Short(4), SqlValue::Decimal(BigDecimal::from_str("2000.50").unwrap())],
            ],
        ),
    );
    client.script(
        update,
        Script::command(vec![SqlVar::new(SQL_INT64, 8).with_scale(-2)]),
    );
    let mut att = attach(&client);

    att.transaction(|tr| {
        tr.statement_with_cursor(select, "EMP", |stmt| {
            assert_eq!(stmt.statement_type()?, ISC_INFO_SQL_STMT_SELECT_FOR_UPD);
            stmt.open(|rs| {
                rs.for_each(|row| {
                    let raised = row.get_decimal(1)? * BigDecimal::from(2);
                    row.statement(update, |upd| {
                        let mut p = upd.params()?;
                        p.set_decimal(0, &raised)?;
                        upd.execute()
                    })
                })
            })
        })
    })
    .unwrap();

    let updates = client.executions_of(update);
    assert_eq!(updates.len(), 2);
    assert_eq!(
        updates[1].params,
        vec![SqlValue::Decimal(BigDecimal::from_str("4001.00").unwrap())]
    );
    let selects = client.executions_of(select);
    assert_eq!(selects[0].cursor.as_deref(), Some("EMP"));
}

#[test]
fn test_blob_columns() {
    let sql = "SELECT ?, ? FROM RDB$DATABASE";
    let client = LoopbackClient::new();
    client.script(
        sql,
        Script::echo(vec![
            SqlVar::new(SQL_BLOB, 8).with_subtype(1).named("NOTES"),
            SqlVar::new(SQL_BLOB, 8).with_subtype(0).named("PHOTO"),
        ]),
    );
    let mut att = attach(&client);
    let notes = "x".repeat(70_000);
    let photo: Vec<u8> = (0..=255u8).cycle().take(40_000).collect();

    let (read_notes, read_photo) = att
        .transaction(|tr| {
            tr.statement(sql, |stmt| {
                {
                    let mut p = stmt.params()?;
                    p.set_string(0, &notes)?;
                    p.set_bytes(1, &photo)?;
                }
                stmt.open(|rs| Ok((rs.get_string(0)?, rs.get_bytes(1)?)))
            })
        })
        .unwrap();
    assert_eq!(read_notes, notes);
    assert_eq!(read_photo, photo);
    assert_eq!(client.stats().blobs, 0);

    let err = att
        .transaction(|tr| {
            let id = tr.write_blob(&[0xff, 0xfe])?;
            tr.statement(sql, |stmt| {
                {
                    let mut p = stmt.params()?;
                    p.set_blob_id(0, id)?;
                    p.set_blob_id(1, id)?;
                }
                stmt.open(|rs| rs.get_string(0))
            })
        })
        .unwrap_err();
    assert!(matches!(err, Error::InvalidEncoding { index: 0 }));
}

#[test]
fn test_binary_text_column() {
    let sql = "SELECT ? FROM RDB$DATABASE";
    let client = LoopbackClient::new();
    client.script(sql, Script::echo(vec![SqlVar::new(SQL_TEXT, 4).with_subtype(CS_NONE)]));
    let mut att = attach(&client);

    let bytes = att
        .statement(sql, |stmt| {
            stmt.params()?.set_bytes(0, &[1, 2])?;
            stmt.open(|rs| rs.get_bytes(0))
        })
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 0, 0]);
}

#[test]
fn test_statement_pool_reuse() {
    let client = LoopbackClient::new();
    let mut att = attach(&client);

    att.transaction(|tr| {
        for n in 0..60 {
            tr.statement(&format!("DELETE FROM T{}", n % 3), |stmt| stmt.execute())?;
        }
        Ok(())
    })
    .unwrap();

    let pools = att.pool_stats();
    assert_eq!(pools.statements, 1);
    assert!(pools.descriptors <= 2);
    assert_eq!(client.executions().len(), 60);
}

#[test]
fn test_commit_retaining_keeps_handle() {
    let client = LoopbackClient::new();
    let mut att = attach(&client);

    let mut tr = att.begin().unwrap();
    tr.execute("DELETE FROM SALES").unwrap();
    tr.commit_retaining().unwrap();
    assert!(tr.is_active());
    tr.execute("DELETE FROM SALES").unwrap();
    tr.rollback_retaining().unwrap();
    assert!(tr.is_active());
    tr.commit().unwrap();
    assert!(!tr.is_active());
    assert!(matches!(tr.execute("DELETE FROM SALES"), Err(Error::InvalidHandle)));
    tr.commit().unwrap();
    drop(tr);

    let stats = client.stats();
    assert_eq!(stats.commits_retaining, 1);
    assert_eq!(stats.rollbacks_retaining, 1);
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.rollbacks, 0);
}

#[test]
fn test_transaction_with_tpb() {
    let client = LoopbackClient::new();
    let mut att = attach(&client);
    let tpb = make_tpb(|p| {
        p.read_committed().no_wait();
    });

    att.transaction_with(&tpb, |tr| tr.execute("DELETE FROM SALES")).unwrap();
    assert_eq!(client.stats().commits, 1);
}

#[test]
fn test_error_rolls_back_and_keeps_message() {
    let client = LoopbackClient::new();
    client.script(
        "INSERT INTO COUNTRY VALUES ('USA', 'Dollar')",
        Script::fail("violation of PRIMARY or UNIQUE KEY constraint \"INTEG_2\" on table \"COUNTRY\""),
    );
    let mut att = attach(&client);

    let err = att
        .execute_with("INSERT INTO COUNTRY VALUES ('USA', 'Dollar')", &[])
        .unwrap_err();
    match &err {
        Error::Native { message, .. } => assert!(message.contains("INTEG_2")),
        other => panic!("unexpected error {:?}", other),
    }
    let stats = client.stats();
    assert_eq!(stats.rollbacks, 1);
    assert_eq!(stats.commits, 0);
    assert_eq!(stats.statements, 0);

    att.execute("DELETE FROM COUNTRY").unwrap();
    assert_eq!(client.stats().commits, 1);
}

#[test]
fn test_closed_attachment() {
    let client = LoopbackClient::new();
    let mut att = attach(&client);
    att.close().unwrap();
    assert!(matches!(att.execute("DELETE FROM SALES"), Err(Error::InvalidHandle)));
    assert_eq!(client.stats(), Default::default());
}
