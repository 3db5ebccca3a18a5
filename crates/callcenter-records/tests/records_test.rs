use callcenter_db::{create_pool, run_migrations, DbRuntimeSettings};
use callcenter_records::{
    append_exchange, create_ticket, get_customer, insert_customer, list_tickets, recent_turns,
    session_turn_count, update_customer_status, AccountStore, ConversationStore, NewCustomer,
    SqliteRecordStore,
};
use callcenter_types::{AccountStatus, Role, TicketPriority, Turn};
use rusqlite::Connection;

fn test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("should open in-memory db");
    run_migrations(&conn).expect("migrations should succeed");
    conn
}

fn alice() -> NewCustomer {
    NewCustomer {
        phone: "+1234567890".to_string(),
        name: "Alice Johnson".to_string(),
        email: Some("alice@example.com".to_string()),
        plan: "premium".to_string(),
        status: AccountStatus::Active,
        balance: 250.0,
    }
}

#[test]
fn customer_lookup_and_status_update() {
    let conn = test_db();
    let created = insert_customer(&conn, &alice()).expect("insert customer");
    assert_eq!(created.first_name(), "Alice");

    let found = get_customer(&conn, "+1234567890")
        .expect("query should succeed")
        .expect("customer should exist");
    assert_eq!(found, created);

    let updated = update_customer_status(&conn, "+1234567890", AccountStatus::Suspended)
        .expect("update should succeed")
        .expect("customer should exist");
    assert_eq!(updated.status, AccountStatus::Suspended);
    assert_eq!(updated.name, "Alice Johnson");

    assert!(get_customer(&conn, "+19999999999").unwrap().is_none());
    assert!(
        update_customer_status(&conn, "+19999999999", AccountStatus::Active)
            .unwrap()
            .is_none()
    );
}

#[test]
fn tickets_are_listed_newest_first() {
    let conn = test_db();
    let first = create_ticket(&conn, "+1234567890", "Cannot log in", TicketPriority::High)
        .expect("create ticket");
    let second = create_ticket(&conn, "+1234567890", "Billing question", TicketPriority::Low)
        .expect("create ticket");
    create_ticket(&conn, "+15550000000", "Someone else", TicketPriority::Medium)
        .expect("create ticket");

    assert!(second > first);

    let tickets = list_tickets(&conn, "+1234567890").expect("list tickets");
    assert_eq!(tickets.len(), 2);
    assert_eq!(tickets[0].id, second);
    assert_eq!(tickets[0].priority, TicketPriority::Low);
    assert_eq!(tickets[1].issue, "Cannot log in");
    assert_eq!(tickets[1].status, "open");
}

#[test]
fn recent_turns_are_capped_and_oldest_first() {
    let conn = test_db();
    for i in 0..4 {
        append_exchange(
            &conn,
            "+1234567890",
            &Turn::caller(format!("question {i}")),
            &Turn::agent(format!("answer {i}")),
        )
        .expect("append exchange");
    }

    let all = recent_turns(&conn, "+1234567890", 100).expect("load turns");
    assert_eq!(all.len(), 8);
    assert_eq!(all[0], Turn::caller("question 0"));
    assert_eq!(all[7], Turn::agent("answer 3"));

    let capped = recent_turns(&conn, "+1234567890", 4).expect("load turns");
    let contents: Vec<&str> = capped.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, ["question 2", "answer 2", "question 3", "answer 3"]);
    assert_eq!(capped[0].role, Role::Caller);

    assert!(recent_turns(&conn, "+15550000000", 10).unwrap().is_empty());
}

#[test]
fn failed_exchange_leaves_no_partial_turns() {
    let conn = test_db();
    append_exchange(
        &conn,
        "+1234567890",
        &Turn::caller("hello"),
        &Turn::agent("hi there"),
    )
    .expect("first exchange");

    // Make the agent insert fail; the caller insert must roll back with it.
    conn.execute_batch(
        "CREATE TEMP TRIGGER fail_second_insert AFTER INSERT ON conversation_turns
         WHEN NEW.role = 'agent'
         BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
    )
    .expect("create trigger");

    let result = append_exchange(
        &conn,
        "+1234567890",
        &Turn::caller("second question"),
        &Turn::agent("second answer"),
    );
    assert!(result.is_err(), "exchange should fail");

    assert_eq!(session_turn_count(&conn, "+1234567890").unwrap(), 2);
    let turns = recent_turns(&conn, "+1234567890", 10).unwrap();
    assert_eq!(turns.last(), Some(&Turn::agent("hi there")));
}

#[tokio::test]
async fn sqlite_store_round_trips_through_pool() {
    let pool = create_pool(
        "file:records_store?mode=memory&cache=shared",
        DbRuntimeSettings::default(),
    )
    .expect("pool");
    {
        let conn = pool.get().expect("connection");
        run_migrations(&conn).expect("migrations");
        insert_customer(&conn, &alice()).expect("seed customer");
    }

    let store = SqliteRecordStore::new(pool);

    let customer = store.customer("+1234567890").await.unwrap().unwrap();
    assert_eq!(customer.plan, "premium");

    let id = store
        .open_ticket("+1234567890", "Router keeps rebooting", TicketPriority::High)
        .await
        .unwrap();
    let tickets = store.tickets("+1234567890").await.unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].id, id);

    let cancelled = store
        .set_customer_status("+1234567890", AccountStatus::Cancelled)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cancelled.status, AccountStatus::Cancelled);

    store
        .append_exchange("+1234567890", &Turn::caller("hi"), &Turn::agent("hello"))
        .await
        .unwrap();
    let turns = store.recent_turns("+1234567890", 10).await.unwrap();
    assert_eq!(turns, vec![Turn::caller("hi"), Turn::agent("hello")]);
}

#[test]
fn customer_serializes_status_label() {
    let conn = test_db();
    let customer = insert_customer(&conn, &alice()).unwrap();
    let json = serde_json::to_value(&customer).unwrap();
    assert_eq!(json["status"], "active");
    assert_eq!(json["balance"], 250.0);
}
