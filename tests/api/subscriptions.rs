use uuid::Uuid;

use crate::helpers::{assert_is_redirect_to, spawn_app, TestApp, TestUser};

async fn spawn_logged_in_app_with_another_user() -> (TestApp, TestUser) {
    let app = spawn_app().await;
    let other = TestUser::generate();
    other.store(&app.db_pool).await;
    app.login_test_user().await;
    (app, other)
}

#[tokio::test]
async fn subscribing_saves_the_lead_time() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;

    let response = app.post_subscribe(other.user_id, "7").await;
    assert_is_redirect_to(&response, "/users");

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, Some(7));
    let html_page = app.get_users_html().await;
    assert!(html_page.contains("You will be reminded 7 days before the birthday."));
}

#[tokio::test]
async fn subscribing_again_changes_the_lead_time() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;

    app.post_subscribe(other.user_id, "7").await;
    app.post_subscribe(other.user_id, "2").await;

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, Some(2));
}

#[tokio::test]
async fn an_invalid_lead_time_is_rejected() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;

    for days_alert in ["0", "367", "soon", ""] {
        let response = app.post_subscribe(other.user_id, days_alert).await;
        assert_is_redirect_to(&response, "/users");
        let html_page = app.get_users_html().await;
        assert!(
            html_page.contains("class=\"error\""),
            "no error shown for days_alert={days_alert:?}"
        );
    }

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, None);
}

#[tokio::test]
async fn subscribing_to_an_unknown_user_is_rejected() {
    let (app, _) = spawn_logged_in_app_with_another_user().await;

    let response = app.post_subscribe(Uuid::new_v4(), "3").await;
    assert_is_redirect_to(&response, "/users");

    let html_page = app.get_users_html().await;
    assert!(html_page.contains("There is no such user."));
}

#[tokio::test]
async fn a_malformed_user_id_is_reported_as_an_unknown_user() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;

    for route in ["subscribe", "unsubscribe"] {
        let response = app.post_subscription_route(route, "abc", "3").await;
        assert_is_redirect_to(&response, "/users");

        let html_page = app.get_users_html().await;
        assert!(
            html_page.contains("There is no such user."),
            "no error shown for /{route}/abc"
        );
    }

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, None);
}

#[tokio::test]
async fn subscribing_to_yourself_is_rejected() {
    let (app, _) = spawn_logged_in_app_with_another_user().await;

    app.post_subscribe(app.test_user.user_id, "3").await;

    let html_page = app.get_users_html().await;
    assert!(html_page.contains("You cannot subscribe to your own birthday."));
    assert_eq!(
        app.days_alert(app.test_user.user_id, app.test_user.user_id).await,
        None
    );
}

#[tokio::test]
async fn unsubscribing_removes_the_subscription() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;
    app.post_subscribe(other.user_id, "7").await;

    let response = app.post_unsubscribe(other.user_id).await;
    assert_is_redirect_to(&response, "/users");

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, None);
    let html_page = app.get_users_html().await;
    assert!(html_page.contains("Unsubscribed."));
}

#[tokio::test]
async fn unsubscribing_without_a_subscription_is_reported() {
    let (app, other) = spawn_logged_in_app_with_another_user().await;

    let response = app.post_unsubscribe(other.user_id).await;
    assert_is_redirect_to(&response, "/users");

    let html_page = app.get_users_html().await;
    assert!(html_page.contains("You were not subscribed to this user."));
}

#[tokio::test]
async fn you_must_be_logged_in_to_subscribe() {
    let app = spawn_app().await;
    let other = TestUser::generate();
    other.store(&app.db_pool).await;

    let response = app.post_subscribe(other.user_id, "3").await;
    assert_is_redirect_to(&response, "/");

    let response = app.post_unsubscribe(other.user_id).await;
    assert_is_redirect_to(&response, "/");

    assert_eq!(app.days_alert(app.test_user.user_id, other.user_id).await, None);
}
