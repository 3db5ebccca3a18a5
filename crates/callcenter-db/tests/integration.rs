use callcenter_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn pooled_connections_share_migrated_schema() {
    let pool = create_pool(
        "file:db_integration?mode=memory&cache=shared",
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");

    let first = pool.get().expect("failed to get connection");
    let applied = run_migrations(&first).expect("failed to run migrations");
    assert!(applied > 0);

    // A second pooled connection must see the tables created by the first.
    let second = pool.get().expect("failed to get second connection");
    let mut stmt = second
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect();

    for expected in [
        "_callcenter_migrations",
        "conversation_turns",
        "customers",
        "sessions",
        "tickets",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}, got {tables:?}"
        );
    }

    let again = run_migrations(&second).expect("rerun should succeed");
    assert_eq!(again, 0);
}
