mod common;

use chassis_core::{DataContext, DbError, ListQuery, RepoError, Repository, UnitOfWork};
use common::{comment, open_store, ticket, Comment, Ticket, MIGRATIONS};

#[test]
fn repository_is_cached_per_type() {
    let mut uow = UnitOfWork::new(open_store());

    let first = uow.repository::<Ticket>().unwrap() as *const _ as usize;
    let second = uow.repository::<Ticket>().unwrap() as *const _ as usize;

    assert_eq!(first, second);
}

#[test]
fn distinct_entity_types_get_distinct_repositories() {
    let mut uow = UnitOfWork::new(open_store());

    let tickets = uow.repository::<Ticket>().unwrap() as *const _ as usize;
    let comments = uow.repository::<Comment>().unwrap() as *const _ as usize;

    assert_ne!(tickets, comments);

    // Interleaved lookups still hit the per-type cache.
    assert_eq!(
        uow.repository::<Ticket>().unwrap() as *const _ as usize,
        tickets
    );
    assert_eq!(
        uow.repository::<Comment>().unwrap() as *const _ as usize,
        comments
    );
}

#[test]
fn save_returns_count_of_staged_mutations() {
    let mut uow = UnitOfWork::new(open_store());

    let stored = {
        let tickets = uow.repository::<Ticket>().unwrap();
        let first = tickets.insert(ticket("a", "open", 0)).unwrap();
        tickets.insert(ticket("b", "open", 1)).unwrap();

        let mut updated = first.clone();
        updated.status = "closed".to_string();
        tickets.update(&updated).unwrap();
        updated
    };

    {
        let comments = uow.repository::<Comment>().unwrap();
        comments.insert(comment(stored.id.unwrap(), "note")).unwrap();
    }

    assert_eq!(uow.save().unwrap(), 4);
    assert_eq!(uow.save().unwrap(), 0);
}

#[test]
fn save_with_nothing_staged_returns_zero() {
    let uow = UnitOfWork::new(open_store());
    assert_eq!(uow.save().unwrap(), 0);
}

#[test]
fn staged_changes_are_visible_before_save_within_the_scope() {
    let mut uow = UnitOfWork::new(open_store());
    let repo = uow.repository::<Ticket>().unwrap();

    let stored = repo.insert(ticket("pending", "open", 0)).unwrap();

    let loaded = repo.get(stored.id.unwrap()).unwrap().unwrap();
    assert_eq!(loaded.title, "pending");
}

#[test]
fn saved_changes_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chassis.db");

    {
        let mut uow = UnitOfWork::new(DataContext::open(&path, MIGRATIONS).unwrap());
        uow.repository::<Ticket>()
            .unwrap()
            .insert(ticket("durable", "open", 1))
            .unwrap();
        assert_eq!(uow.save().unwrap(), 1);
    }

    let mut uow = UnitOfWork::new(DataContext::open(&path, MIGRATIONS).unwrap());
    let all = uow
        .repository::<Ticket>()
        .unwrap()
        .list(&ListQuery::default())
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "durable");
}

#[test]
fn dropping_without_save_rolls_back_staged_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chassis.db");

    {
        let mut uow = UnitOfWork::new(DataContext::open(&path, MIGRATIONS).unwrap());
        uow.repository::<Ticket>()
            .unwrap()
            .insert(ticket("ephemeral", "open", 0))
            .unwrap();
        // Dropped without save: the staged insert must not become durable.
    }

    let mut uow = UnitOfWork::new(DataContext::open(&path, MIGRATIONS).unwrap());
    let all = uow
        .repository::<Ticket>()
        .unwrap()
        .list(&ListQuery::default())
        .unwrap();
    assert!(all.is_empty());
}

#[test]
fn dispose_twice_is_a_noop() {
    let mut uow = UnitOfWork::new(open_store());
    uow.dispose();
    uow.dispose();
    assert!(uow.is_disposed());
}

#[test]
fn disposed_unit_of_work_fails_fast() {
    let mut uow = UnitOfWork::new(open_store());
    uow.repository::<Ticket>().unwrap();
    uow.dispose();

    let err = uow.repository::<Ticket>().unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Disposed)));

    let err = uow.save().unwrap_err();
    assert!(matches!(err, DbError::Disposed));
}

#[test]
fn constraint_violation_propagates_to_caller() {
    let mut uow = UnitOfWork::new(open_store());
    let comments = uow.repository::<Comment>().unwrap();

    let err = comments.insert(comment(999, "orphan")).unwrap_err();
    assert!(matches!(err, RepoError::Db(DbError::Sqlite(_))));
}

#[test]
fn failed_mutation_does_not_inflate_save_count() {
    let mut uow = UnitOfWork::new(open_store());

    {
        let tickets = uow.repository::<Ticket>().unwrap();
        tickets.insert(ticket("kept", "open", 0)).unwrap();
    }
    {
        let comments = uow.repository::<Comment>().unwrap();
        comments.insert(comment(999, "orphan")).unwrap_err();
    }

    assert_eq!(uow.save().unwrap(), 1);
}
