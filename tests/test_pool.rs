//! Attachment pool under concurrent tasks.

use std::sync::Arc;

use fbclient_rs::protocol::constants::{CS_UTF8, SQL_VARYING};
use fbclient_rs::{Attachment, AttachmentPool, Error, LoopbackClient, Script, SqlValue, SqlVar};
use tokio_test::assert_ok;

const SQL: &str = "INSERT INTO LOG (MESSAGE) VALUES (?)";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hundred_tasks_share_four_attachments() {
    let client = LoopbackClient::new();
    client.script(
        SQL,
        Script::command(vec![SqlVar::new(SQL_VARYING, 400).with_subtype(CS_UTF8)]),
    );
    let factory_client = client.clone();
    let pool = Arc::new(AttachmentPool::new(4, move || {
        Attachment::attach(factory_client.clone(), "employee.fdb", &[])
    }));
    assert_eq!(pool.size(), 4);

    let mut tasks = Vec::new();
    for n in 0..100 {
        let pool = pool.clone();
        tasks.push(tokio::spawn(async move {
            let mut att = pool.acquire().await?;
            let done = att.execute_with(SQL, &[SqlValue::from(format!("task {}", n))]);
            pool.dispose(att).await;
            done
        }));
    }
    for task in tasks {
        assert_ok!(task.await.unwrap());
    }

    assert_eq!(client.executions_of(SQL).len(), 100);
    assert!(client.stats().attachments <= 4);

    pool.close().await;
    assert!(matches!(pool.acquire().await, Err(Error::InvalidHandle)));
}

#[tokio::test]
async fn test_refused_attach() {
    let client = LoopbackClient::new();
    client.refuse_attach("Your user name and password are not defined");
    let pool = AttachmentPool::new(2, move || Attachment::attach(client.clone(), "employee.fdb", &[]));

    for _ in 0..2 {
        match pool.acquire().await {
            Err(Error::Native { message, .. }) => assert!(message.contains("password")),
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("attach should have been refused"),
        }
    }
    pool.close().await;
}
