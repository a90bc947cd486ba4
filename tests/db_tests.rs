//! tests/db_tests.rs
//!
//! One contract, two adapters: every check runs against the in-memory and the
//! SQLite repository.

mod common;
use common::{fast_config, pw, seed, setup};

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use encrypted_token_vault::{
    Cancellation, ListQuery, MemoryRepository, OrderBy, RecordField, RecordFilter, Repository,
    RepositoryError, SecretRecord, SqliteRepository, TokenVault,
};
use tempfile::tempdir;
use uuid::Uuid;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap()
}

fn record(token: &str, minute: u32) -> SecretRecord {
    SecretRecord::new(token.to_string(), format!("v2:{token}"), None, at(minute))
}

fn adapters() -> Vec<(&'static str, Box<dyn Repository>)> {
    setup();
    vec![
        ("memory", Box::new(MemoryRepository::new())),
        ("sqlite", Box::new(SqliteRepository::open_in_memory().unwrap())),
    ]
}

#[test]
fn create_and_find() {
    for (name, repo) in adapters() {
        let mut stored = record("tk_alpha", 1);
        stored.expires_at = Some(at(30));
        repo.create(&stored).unwrap();

        assert_eq!(repo.find_by_id(stored.id).unwrap().as_ref(), Some(&stored), "{name}");
        assert_eq!(repo.find_by_token("tk_alpha").unwrap(), Some(stored.clone()), "{name}");
        assert_eq!(repo.find_by_token("tk_beta").unwrap(), None, "{name}");
        assert_eq!(repo.find_by_id(Uuid::new_v4()).unwrap(), None, "{name}");
    }
}

#[test]
fn duplicate_tokens_are_rejected() {
    for (name, repo) in adapters() {
        repo.create(&record("tk_same", 1)).unwrap();
        let err = repo.create(&record("tk_same", 2)).unwrap_err();
        assert!(
            matches!(err, RepositoryError::Duplicate { ref token } if token == "tk_same"),
            "{name}"
        );
        assert_eq!(repo.count(&RecordFilter::everything()).unwrap(), 1, "{name}");
    }
}

#[test]
fn update_touches_only_listed_fields() {
    for (name, repo) in adapters() {
        let original = record("tk_update", 1);
        repo.create(&original).unwrap();

        let mut changed = original.clone();
        changed.encrypted_value = "v2:new".into();
        changed.updated_at = at(5);
        changed.expires_at = Some(at(50));
        changed.token = "tk_ignored".into();
        repo.update(&changed, &[RecordField::EncryptedValue, RecordField::UpdatedAt])
            .unwrap();

        let stored = repo.find_by_id(original.id).unwrap().unwrap();
        assert_eq!(stored.encrypted_value, "v2:new", "{name}");
        assert_eq!(stored.updated_at, at(5), "{name}");
        assert_eq!(stored.expires_at, None, "{name}");
        assert_eq!(stored.token, "tk_update", "{name}");

        changed.soft_deleted_at = Some(at(6));
        repo.update(&changed, &[RecordField::SoftDeletedAt, RecordField::ExpiresAt])
            .unwrap();
        let stored = repo.find_by_id(original.id).unwrap().unwrap();
        assert_eq!(stored.soft_deleted_at, Some(at(6)), "{name}");
        assert_eq!(stored.expires_at, Some(at(50)), "{name}");
    }
}

#[test]
fn update_and_delete_of_unknown_ids_fail() {
    for (name, repo) in adapters() {
        let ghost = record("tk_ghost", 1);
        assert!(
            matches!(
                repo.update(&ghost, &[RecordField::UpdatedAt]),
                Err(RepositoryError::MissingId(id)) if id == ghost.id
            ),
            "{name}"
        );
        assert!(
            matches!(repo.delete_by_id(ghost.id), Err(RepositoryError::MissingId(_))),
            "{name}"
        );
    }
}

#[test]
fn delete_frees_the_token() {
    for (name, repo) in adapters() {
        let first = record("tk_reuse", 1);
        repo.create(&first).unwrap();
        repo.delete_by_id(first.id).unwrap();

        assert_eq!(repo.find_by_token("tk_reuse").unwrap(), None, "{name}");
        repo.create(&record("tk_reuse", 2)).unwrap();
    }
}

#[test]
fn filters_hide_soft_deleted_unless_asked() {
    for (name, repo) in adapters() {
        let a = record("tk_a", 1);
        let b = record("tk_b", 2);
        let mut c = record("tk_c", 3);
        c.soft_deleted_at = Some(at(4));
        for r in [&a, &b, &c] {
            repo.create(r).unwrap();
        }

        assert_eq!(repo.count(&RecordFilter::active()).unwrap(), 2, "{name}");
        assert_eq!(repo.count(&RecordFilter::everything()).unwrap(), 3, "{name}");

        let tokens = |filter: RecordFilter| -> Vec<String> {
            let query = ListQuery {
                order_by: Some(OrderBy::Token),
                ..ListQuery::new(filter)
            };
            repo.list(&query).unwrap().into_iter().map(|r| r.token).collect()
        };

        let wanted = vec!["tk_a".into(), "tk_c".into(), "tk_x".into()];
        assert_eq!(tokens(RecordFilter::active().with_tokens(wanted)), ["tk_a"], "{name}");
        assert_eq!(
            tokens(RecordFilter::everything().with_tokens(vec!["tk_a".into(), "tk_c".into()])),
            ["tk_a", "tk_c"],
            "{name}"
        );
        assert_eq!(tokens(RecordFilter::everything().with_ids(vec![b.id])), ["tk_b"], "{name}");
        assert!(tokens(RecordFilter::everything().with_tokens(Vec::new())).is_empty(), "{name}");

        let single = RecordFilter {
            token: Some("tk_b".into()),
            ..RecordFilter::active()
        };
        assert_eq!(repo.count(&single).unwrap(), 1, "{name}");
    }
}

#[test]
fn token_and_id_sets_beyond_the_bind_limit() {
    for (name, repo) in adapters() {
        let kept = [record("tk_big_a", 1), record("tk_big_b", 2), record("tk_big_c", 3)];
        for r in &kept {
            repo.create(r).unwrap();
        }

        let mut tokens: Vec<String> = (0..40_000).map(|i| format!("tk_absent{i}")).collect();
        tokens.extend(["tk_big_a".to_string(), "tk_big_c".to_string()]);
        let filter = RecordFilter::active().with_tokens(tokens);
        assert_eq!(repo.count(&filter).unwrap(), 2, "{name}");
        assert_eq!(repo.list(&ListQuery::new(filter)).unwrap().len(), 2, "{name}");

        let mut ids: Vec<Uuid> = (0..40_000).map(|_| Uuid::new_v4()).collect();
        ids.push(kept[1].id);
        let page = ListQuery::page(RecordFilter::everything().with_ids(ids), 0, 10);
        let found: Vec<String> = repo.list(&page).unwrap().into_iter().map(|r| r.token).collect();
        assert_eq!(found, ["tk_big_b"], "{name}");
    }
}

#[test]
fn sqlite_read_many_with_a_large_page_size() {
    setup();
    let mut config = fast_config();
    config.rotation.page_size = 40_000;
    let repo = Arc::new(SqliteRepository::open_in_memory().unwrap());
    let vault = TokenVault::new(config, repo).unwrap();
    let password = pw("bulk");
    let cancel = Cancellation::new();

    let stored = seed(&vault, "bulk", 5, &password);
    let mut wanted: Vec<String> = (0..35_000).map(|i| format!("tk_missing{i}")).collect();
    wanted.extend(stored.iter().cloned());

    let found = vault.read_many(&wanted, &password, &cancel).unwrap();
    assert_eq!(found.len(), stored.len());
    for (i, token) in stored.iter().enumerate() {
        assert_eq!(found[token].expose_secret(), &format!("bulk-{i}"));
    }
}

#[test]
fn pages_partition_the_table() {
    for (name, repo) in adapters() {
        for i in 0..11 {
            repo.create(&record(&format!("tk_page{i:02}"), i)).unwrap();
        }

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = repo
                .list(&ListQuery::page(RecordFilter::everything(), offset, 4))
                .unwrap();
            let fetched = page.len();
            seen.extend(page.into_iter().map(|r| r.id));
            if fetched < 4 {
                break;
            }
            offset += fetched;
        }

        let mut sorted = seen.clone();
        sorted.sort();
        assert_eq!(seen, sorted, "{name}: pages come back in id order");
        sorted.dedup();
        assert_eq!(sorted.len(), 11, "{name}");
    }
}

#[test]
fn created_at_order() {
    for (name, repo) in adapters() {
        for (token, minute) in [("tk_late", 30), ("tk_early", 1), ("tk_mid", 15)] {
            repo.create(&record(token, minute)).unwrap();
        }
        let query = ListQuery {
            order_by: Some(OrderBy::CreatedAt),
            limit: Some(2),
            ..ListQuery::new(RecordFilter::active())
        };
        let tokens: Vec<String> = repo.list(&query).unwrap().into_iter().map(|r| r.token).collect();
        assert_eq!(tokens, ["tk_early", "tk_mid"], "{name}");
    }
}

#[test]
fn sqlite_file_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("vault.db");
    let cancel = Cancellation::new();
    let password = pw("persist");

    let token = {
        let repo = Arc::new(SqliteRepository::open(&path).unwrap());
        let vault = TokenVault::new(fast_config(), repo).unwrap();
        vault
            .create_default("on disk", &password, Some(Utc::now() + Duration::days(1)), &cancel)
            .unwrap()
    };

    let repo = Arc::new(SqliteRepository::open(&path).unwrap());
    let vault = TokenVault::new(fast_config(), repo).unwrap();
    assert_eq!(vault.read(&token, &password, &cancel).unwrap().expose_secret(), "on disk");
    assert_eq!(vault.rotate_password(&password, &pw("next"), &cancel).unwrap(), 1);
    assert_eq!(vault.read(&token, &pw("next"), &cancel).unwrap().expose_secret(), "on disk");
}

#[test]
fn sqlite_open_reports_unusable_directories_as_io() {
    setup();
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "plain file").unwrap();

    let err = SqliteRepository::open(blocker.join("vault.db")).unwrap_err();
    assert!(matches!(err, RepositoryError::Io(_)), "{err:?}");
}
