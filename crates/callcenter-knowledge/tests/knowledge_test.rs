use callcenter_db::{create_pool, run_migrations, DbRuntimeSettings};
use callcenter_knowledge::{
    add_documents, default_faqs, document_count, search, KnowledgeDocument, KnowledgeSearch,
    SqliteKnowledgeIndex,
};
use rusqlite::Connection;
use std::io::Write;

fn seeded_db() -> Connection {
    let conn = Connection::open_in_memory().expect("should open in-memory db");
    run_migrations(&conn).expect("migrations should succeed");
    add_documents(&conn, &default_faqs()).expect("seed faqs");
    conn
}

#[test]
fn default_faqs_cover_ten_topics() {
    let faqs = default_faqs();
    assert_eq!(faqs.len(), 10);
    assert_eq!(faqs[0].id, "1");
    assert_eq!(faqs[9].category.as_deref(), Some("privacy"));
}

#[test]
fn password_question_finds_reset_passage_first() {
    let conn = seeded_db();
    let passages = search(&conn, "password reset", 3).expect("search");
    assert!(!passages.is_empty());
    assert!(passages[0].contains("Forgot Password"));
}

#[test]
fn search_respects_limit() {
    let conn = seeded_db();
    let passages = search(&conn, "account support billing", 2).expect("search");
    assert_eq!(passages.len(), 2);
}

#[test]
fn unmatched_or_empty_query_returns_nothing() {
    let conn = seeded_db();
    assert!(search(&conn, "zebra xylophone", 3).unwrap().is_empty());
    assert!(search(&conn, "?!", 3).unwrap().is_empty());
    assert!(search(&conn, "\"unbalanced ( quote", 3).is_ok());
}

#[test]
fn re_adding_a_document_replaces_it() {
    let conn = seeded_db();
    assert_eq!(document_count(&conn).unwrap(), 10);

    let replacement = KnowledgeDocument {
        id: "1".to_string(),
        text: "Passwords are reset by calling the helpdesk.".to_string(),
        category: None,
    };
    add_documents(&conn, &[replacement]).expect("replace");

    assert_eq!(document_count(&conn).unwrap(), 10);
    let passages = search(&conn, "helpdesk", 3).unwrap();
    assert_eq!(passages, vec!["Passwords are reset by calling the helpdesk."]);
    assert!(search(&conn, "spam folder", 3)
        .unwrap()
        .iter()
        .all(|p| !p.contains("spam folder")));
}

#[tokio::test]
async fn pooled_index_seeds_once_and_searches() {
    let pool = create_pool(
        "file:knowledge_index?mode=memory&cache=shared",
        DbRuntimeSettings::default(),
    )
    .expect("pool");
    {
        let conn = pool.get().expect("connection");
        run_migrations(&conn).expect("migrations");
    }

    let index = SqliteKnowledgeIndex::new(pool);
    assert_eq!(index.seed_if_empty(default_faqs()).await.unwrap(), 10);
    assert_eq!(index.seed_if_empty(default_faqs()).await.unwrap(), 0);
    assert_eq!(index.document_count().await.unwrap(), 10);

    let passages = index.search("How do I get a refund?", 3).await.unwrap();
    assert!(passages[0].contains("Refunds are available within 30 days"));
}

#[tokio::test]
async fn seed_file_is_parsed() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"[{{"id": "shipping", "text": "Orders ship within two days.", "category": "orders"}},
            {{"id": "returns", "text": "Returns are accepted for 60 days."}}]"#
    )
    .unwrap();

    let docs = SqliteKnowledgeIndex::load_seed_file(file.path()).await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].category.as_deref(), Some("orders"));
    assert_eq!(docs[1].category, None);
}

#[tokio::test]
async fn missing_seed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SqliteKnowledgeIndex::load_seed_file(dir.path().join("nope.json")).await;
    assert!(result.is_err());
}
