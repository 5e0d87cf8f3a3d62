use uuid::Uuid;

use crate::helpers::{assert_is_redirect_to, spawn_app};

#[tokio::test]
async fn valid_credentials_redirect_to_the_user_list() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "username": &app.test_user.username,
            "password": &app.test_user.password,
        }))
        .await;
    assert_is_redirect_to(&response, "/users");

    let html_page = app.get_users_html().await;
    assert!(html_page.contains(&format!("Welcome {}!", app.test_user.username)));
}

#[tokio::test]
async fn a_wrong_password_is_forbidden() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "username": &app.test_user.username,
            "password": Uuid::new_v4().to_string(),
        }))
        .await;

    assert_eq!(response.status().as_u16(), 403);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Wrong username or password"));
}

#[tokio::test]
async fn an_unknown_user_gets_the_same_answer_as_a_wrong_password() {
    let app = spawn_app().await;

    let response = app
        .post_login(&serde_json::json!({
            "username": Uuid::new_v4().to_string(),
            "password": Uuid::new_v4().to_string(),
        }))
        .await;

    assert_eq!(response.status().as_u16(), 403);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("Wrong username or password"));

    let response = app.get_users().await;
    assert_is_redirect_to(&response, "/");
}
