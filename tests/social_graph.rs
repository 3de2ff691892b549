//! Like and follow flows: edge toggling, denormalized counters, and the
//! legacy one-way follow behavior.

mod common;

use lumina::application::ServiceError;
use lumina::domain::Visibility;

#[tokio::test]
async fn like_toggle_moves_the_counter_both_ways() {
    let (svc, _store) = common::service();
    let image = common::image("owner-1", "Savanna", &[], Visibility::Public);
    svc.save_image_with_tags(&image).await.expect("save");

    let liked = svc.toggle_like("u-1", &image.id).await.expect("toggle");
    assert!(liked.liked);
    assert_eq!(liked.likes, 1);

    let second = svc.toggle_like("u-2", &image.id).await.expect("toggle");
    assert_eq!(second.likes, 2);

    let unliked = svc.toggle_like("u-1", &image.id).await.expect("toggle");
    assert!(!unliked.liked);
    assert_eq!(unliked.likes, 1);

    let stored = svc
        .get_image_by_id(&image.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(stored.likes, 1);
}

#[tokio::test]
async fn liking_a_missing_image_is_not_found() {
    let (svc, _store) = common::service();
    let err = svc
        .toggle_like("u-1", "no-such-image")
        .await
        .expect_err("missing");
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn liked_listing_follows_the_toggle() {
    let (svc, _store) = common::service();
    let image = common::image("owner-1", "Savanna", &[], Visibility::Public);
    svc.save_image_with_tags(&image).await.expect("save");

    svc.toggle_like("u-1", &image.id).await.expect("toggle");
    let liked = svc.images_liked_by_user("u-1").await.expect("list");
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, image.id);

    // The per-user liked cache is dropped by the toggle, so the unlike is
    // visible immediately.
    svc.toggle_like("u-1", &image.id).await.expect("toggle");
    assert!(svc.images_liked_by_user("u-1").await.expect("list").is_empty());
}

#[tokio::test]
async fn legacy_follow_bumps_the_acting_users_own_counter() {
    let (svc, _store) = common::service();
    let follower = svc
        .create_user(common::user("follower@example.com"))
        .await
        .expect("create");
    let followee = svc
        .create_user(common::user("followee@example.com"))
        .await
        .expect("create");

    svc.follow_user(&follower.id, &followee.id)
        .await
        .expect("follow");

    // Historical behavior: the counter lands on the follower's record, not
    // the followee's.
    let follower = svc
        .get_user_by_id(&follower.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(follower.followers, 1);
    let followee_record = svc
        .get_user_by_id(&followee.id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(followee_record.followers, 0);

    assert!(svc.is_following(&follower.id, &followee.id).await.expect("check"));
}

#[tokio::test]
async fn follow_toggle_recomputes_the_followee_counter_from_edges() {
    let (svc, _store) = common::service();
    let follower = svc
        .create_user(common::user("follower@example.com"))
        .await
        .expect("create");
    let followee = svc
        .create_user(common::user("followee@example.com"))
        .await
        .expect("create");

    let on = svc
        .toggle_follow(&follower.id, &followee.id)
        .await
        .expect("toggle");
    assert!(on.following);
    assert_eq!(on.follower_count, 1);
    assert_eq!(
        svc.stored_follower_count(&followee.id).await.expect("count"),
        1
    );

    let off = svc
        .toggle_follow(&follower.id, &followee.id)
        .await
        .expect("toggle");
    assert!(!off.following);
    assert_eq!(off.follower_count, 0);
    assert!(!svc.is_following(&follower.id, &followee.id).await.expect("check"));
    assert_eq!(
        svc.stored_follower_count(&followee.id).await.expect("count"),
        0
    );
}

#[tokio::test]
async fn self_follow_is_a_no_op() {
    let (svc, _store) = common::service();
    let user = svc
        .create_user(common::user("solo@example.com"))
        .await
        .expect("create");

    let outcome = svc.toggle_follow(&user.id, &user.id).await.expect("toggle");
    assert!(!outcome.following);
    assert_eq!(outcome.follower_count, 0);
    assert!(svc.list_followers(&user.id).await.expect("list").is_empty());
}

#[tokio::test]
async fn follow_edges_list_in_both_directions() {
    let (svc, _store) = common::service();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        svc.create_user(common::user(email)).await.expect("create");
    }
    let a = svc
        .get_user_by_email("a@example.com")
        .await
        .expect("get")
        .expect("present");
    let b = svc
        .get_user_by_email("b@example.com")
        .await
        .expect("get")
        .expect("present");
    let c = svc
        .get_user_by_email("c@example.com")
        .await
        .expect("get")
        .expect("present");

    svc.toggle_follow(&a.id, &c.id).await.expect("toggle");
    svc.toggle_follow(&b.id, &c.id).await.expect("toggle");
    svc.toggle_follow(&a.id, &b.id).await.expect("toggle");

    let followers_of_c = svc.list_followers(&c.id).await.expect("list");
    assert_eq!(followers_of_c.len(), 2);

    let a_follows = svc.list_following(&a.id).await.expect("list");
    let mut followees: Vec<_> = a_follows.iter().map(|e| e.followee_id.clone()).collect();
    followees.sort();
    let mut expected = vec![b.id.clone(), c.id.clone()];
    expected.sort();
    assert_eq!(followees, expected);
}
