//! Integration tests for follows, comments, and the notification feed

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use sqlx::sqlite::SqlitePoolOptions;

use daramg::db::sqlite_helpers::datetime_to_str;
use daramg::db::users::FollowOutcome;
use daramg::db::{CreateComment, CreateComposer, CreatePost, Continent, Database, Era, PostStatus, PostType};
use daramg::pagination::PageRequest;
use daramg::services::InteractionService;

async fn test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Database::new(pool);
    db.migrate().await.unwrap();
    db
}

async fn seed_user(db: &Database, email: &str, nickname: &str) -> i64 {
    let now = datetime_to_str(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    let result = sqlx::query(
        "INSERT INTO users (email, nickname, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
    )
    .bind(email)
    .bind(nickname)
    .bind(&now)
    .execute(db.pool())
    .await
    .unwrap();
    result.last_insert_rowid()
}

#[tokio::test]
async fn follow_notifies_the_followee() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice@example.com", "alice").await;
    let bob = seed_user(&db, "bob@example.com", "bob").await;
    let service = InteractionService::new(db.pool().clone());

    let outcome = service.follow_user(alice, bob).await.unwrap();
    assert_eq!(outcome, FollowOutcome::Followed);

    let feed = db
        .notifications()
        .list_recent(bob, 30, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].sender_id, alice);
    assert_eq!(feed.items[0].sender_nickname.as_deref(), Some("alice"));
    assert_eq!(feed.items[0].notification_type, "follow");
    assert_eq!(feed.items[0].post_id, None);

    // The follower gets nothing.
    let count = db.notifications().unread_count(alice, 30).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn duplicate_follow_does_not_notify_twice() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice@example.com", "alice").await;
    let bob = seed_user(&db, "bob@example.com", "bob").await;
    let service = InteractionService::new(db.pool().clone());

    assert_eq!(
        service.follow_user(alice, bob).await.unwrap(),
        FollowOutcome::Followed
    );
    assert_eq!(
        service.follow_user(alice, bob).await.unwrap(),
        FollowOutcome::AlreadyFollowing
    );

    let count = db.notifications().unread_count(bob, 30).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn self_follow_is_rejected() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice@example.com", "alice").await;
    let service = InteractionService::new(db.pool().clone());

    assert!(service.follow_user(alice, alice).await.is_err());
    let count = db.notifications().unread_count(alice, 30).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn comment_notifies_the_post_author_but_not_self_comments() {
    let db = test_db().await;
    let author = seed_user(&db, "author@example.com", "author").await;
    let reader = seed_user(&db, "reader@example.com", "reader").await;
    let service = InteractionService::new(db.pool().clone());

    let post = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Free,
            title: "On late Beethoven".to_string(),
            content: "quartets".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: None,
        })
        .await
        .unwrap();

    service
        .add_comment(CreateComment {
            post_id: post.id,
            user_id: reader,
            content: "agreed".to_string(),
        })
        .await
        .unwrap();

    // Author commenting on their own post raises no notification.
    service
        .add_comment(CreateComment {
            post_id: post.id,
            user_id: author,
            content: "thanks".to_string(),
        })
        .await
        .unwrap();

    let feed = db
        .notifications()
        .list_recent(author, 30, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 1);
    assert_eq!(feed.items[0].sender_id, reader);
    assert_eq!(feed.items[0].notification_type, "comment");
    assert_eq!(feed.items[0].post_id, Some(post.id));

    let comments = db.comments().list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 2);
}

#[tokio::test]
async fn old_notifications_fall_outside_the_window() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice@example.com", "alice").await;
    let bob = seed_user(&db, "bob@example.com", "bob").await;

    let old = datetime_to_str(Utc::now() - Duration::days(40));
    let recent = datetime_to_str(Utc::now() - Duration::days(3));
    sqlx::query(
        r#"
        INSERT INTO notifications (receiver_id, sender_id, post_id, notification_type,
                                   is_read, created_at, updated_at)
        VALUES (?1, ?2, NULL, 'follow', 0, ?3, ?3),
               (?1, ?2, NULL, 'follow', 0, ?4, ?4)
        "#,
    )
    .bind(bob)
    .bind(alice)
    .bind(&old)
    .bind(&recent)
    .execute(db.pool())
    .await
    .unwrap();

    let feed = db
        .notifications()
        .list_recent(bob, 30, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert_eq!(feed.items.len(), 1);

    let count = db.notifications().unread_count(bob, 30).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn mark_as_read_is_scoped_to_the_receiver() {
    let db = test_db().await;
    let alice = seed_user(&db, "alice@example.com", "alice").await;
    let bob = seed_user(&db, "bob@example.com", "bob").await;
    let service = InteractionService::new(db.pool().clone());
    service.follow_user(alice, bob).await.unwrap();

    let feed = db
        .notifications()
        .list_recent(bob, 30, &PageRequest::default(), 100)
        .await
        .unwrap();
    let notification_id = feed.items[0].id;

    // Wrong receiver cannot mark it.
    assert!(
        !db.notifications()
            .mark_as_read(notification_id, alice)
            .await
            .unwrap()
    );
    assert!(
        db.notifications()
            .mark_as_read(notification_id, bob)
            .await
            .unwrap()
    );
    // Second mark is a no-op.
    assert!(
        !db.notifications()
            .mark_as_read(notification_id, bob)
            .await
            .unwrap()
    );

    let count = db.notifications().unread_count(bob, 30).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn curation_feed_attaches_composers_without_multiplying_rows() {
    let db = test_db().await;
    let author = seed_user(&db, "author@example.com", "author").await;

    let bach = db
        .composers()
        .create(CreateComposer {
            name: "Bach".to_string(),
            era: Era::Baroque,
            continent: Continent::Europe,
        })
        .await
        .unwrap();
    let ravel = db
        .composers()
        .create(CreateComposer {
            name: "Ravel".to_string(),
            era: Era::Modern,
            continent: Continent::Europe,
        })
        .await
        .unwrap();

    let post = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Curation,
            title: "Keyboard landmarks".to_string(),
            content: "from fugue to jeux d'eau".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: Some(bach.id),
        })
        .await
        .unwrap();

    let mut tx = db.pool().begin().await.unwrap();
    daramg::db::composers::attach_composer(&mut tx, post.id, bach.id)
        .await
        .unwrap();
    daramg::db::composers::attach_composer(&mut tx, post.id, ravel.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let page = db
        .posts()
        .list_curation(None, None, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    let names: Vec<&str> = page.items[0]
        .composers
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bach", "Ravel"]);

    // Era filter resolves through the primary composer.
    let baroque = db
        .posts()
        .list_curation(Some(Era::Baroque), None, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert_eq!(baroque.items.len(), 1);

    let modern = db
        .posts()
        .list_curation(Some(Era::Modern), None, &PageRequest::default(), 100)
        .await
        .unwrap();
    assert!(modern.items.is_empty());
}

#[tokio::test]
async fn composer_feed_merges_sources_and_deduplicates() {
    let db = test_db().await;
    let author = seed_user(&db, "author@example.com", "author").await;

    let brahms = db
        .composers()
        .create(CreateComposer {
            name: "Brahms".to_string(),
            era: Era::Romantic,
            continent: Continent::Europe,
        })
        .await
        .unwrap();

    // A curation post naming Brahms both as primary composer and through the
    // join table, plus a story post attached through the join table only.
    let curation = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Curation,
            title: "Four symphonies".to_string(),
            content: "a survey".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: Some(brahms.id),
        })
        .await
        .unwrap();
    let story = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Story,
            title: "Hearing the fourth live".to_string(),
            content: "passacaglia".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: None,
        })
        .await
        .unwrap();

    let mut tx = db.pool().begin().await.unwrap();
    daramg::db::composers::attach_composer(&mut tx, curation.id, brahms.id)
        .await
        .unwrap();
    daramg::db::composers::attach_composer(&mut tx, story.id, brahms.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let page = db
        .posts()
        .list_by_composer(brahms.id, &PageRequest::default(), 100)
        .await
        .unwrap();
    let post_ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    // Newest first, and the doubly-linked curation post appears once.
    assert_eq!(post_ids, vec![story.id, curation.id]);
    assert!(!page.has_next);
}

#[tokio::test]
async fn composer_feed_includes_story_posts_linked_only_as_primary() {
    let db = test_db().await;
    let author = seed_user(&db, "author@example.com", "author").await;

    let brahms = db
        .composers()
        .create(CreateComposer {
            name: "Brahms".to_string(),
            era: Era::Romantic,
            continent: Continent::Europe,
        })
        .await
        .unwrap();

    // A story post naming Brahms as primary composer, with no join-table row.
    let story = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Story,
            title: "A German Requiem at the Musikverein".to_string(),
            content: "selig sind".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: Some(brahms.id),
        })
        .await
        .unwrap();

    let page = db
        .posts()
        .list_by_composer(brahms.id, &PageRequest::default(), 100)
        .await
        .unwrap();
    let post_ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    assert_eq!(post_ids, vec![story.id]);
}

#[tokio::test]
async fn moderated_posts_are_hidden_from_their_author() {
    let db = test_db().await;
    let author = seed_user(&db, "author@example.com", "author").await;

    let kept = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Free,
            title: "Concert notes".to_string(),
            content: "fine".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: None,
        })
        .await
        .unwrap();
    let draft = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Free,
            title: "Half-written review".to_string(),
            content: "wip".to_string(),
            post_status: PostStatus::Draft,
            primary_composer_id: None,
        })
        .await
        .unwrap();
    let blocked = db
        .posts()
        .create(CreatePost {
            user_id: author,
            post_type: PostType::Free,
            title: "Removed by moderation".to_string(),
            content: "spam".to_string(),
            post_status: PostStatus::Published,
            primary_composer_id: None,
        })
        .await
        .unwrap();
    sqlx::query("UPDATE posts SET is_blocked = 1 WHERE id = ?1")
        .bind(blocked.id)
        .execute(db.pool())
        .await
        .unwrap();

    let page = db
        .posts()
        .list_by_user(author, None, &PageRequest::default(), 100)
        .await
        .unwrap();
    let post_ids: Vec<i64> = page.items.iter().map(|p| p.id).collect();
    // Drafts stay visible to the author; the moderated post does not.
    assert_eq!(post_ids, vec![draft.id, kept.id]);
}
