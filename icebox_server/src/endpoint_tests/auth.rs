use actix_web::{http::StatusCode, test, test::TestRequest, App};
use serde_json::json;

use super::{configure, test_auth_config, test_db};
use crate::{auth::TokenIssuer, data_objects::TokenResponse};

fn signup_body(email: &str) -> serde_json::Value {
    json!({
        "first_name": "Frank",
        "last_name": "Frost",
        "email": email,
        "password": "correct-horse-battery",
        "phone": "555-0100",
        "vehicle_type": "van"
    })
}

#[actix_web::test]
async fn driver_signup_issues_a_valid_token() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;

    let req = TestRequest::post().uri("/api/drivers/signup").set_json(signup_body("Frank@Example.com")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: TokenResponse = test::read_body_json(res).await;
    assert_eq!(body.driver.name, "Frank Frost");

    let claims = TokenIssuer::new(&auth).validate(&body.token).expect("Token should validate");
    assert_eq!(claims.sub, body.driver.id);
    assert_eq!(claims.email, "frank@example.com");

    // Same email again is a conflict.
    let req = TestRequest::post().uri("/api/drivers/signup").set_json(signup_body("frank@example.com")).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn weak_passwords_are_rejected() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;

    let mut body = signup_body("weak@example.com");
    body["password"] = json!("short");
    let req = TestRequest::post().uri("/api/drivers/signup").set_json(body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signin_checks_the_password() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;

    let req = TestRequest::post().uri("/api/drivers/signup").set_json(signup_body("frank@example.com")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = TestRequest::post()
        .uri("/api/drivers/signin")
        .set_json(json!({"email": "frank@example.com", "password": "wrong"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/api/drivers/signin")
        .set_json(json!({"email": "unknown@example.com", "password": "correct-horse-battery"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/api/drivers/signin")
        .set_json(json!({"email": "frank@example.com", "password": "correct-horse-battery"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: TokenResponse = test::read_body_json(res).await;
    assert!(!body.token.is_empty());
}

#[actix_web::test]
async fn admin_manages_the_driver_roster() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;

    let req = TestRequest::post().uri("/api/drivers/signup").set_json(signup_body("frank@example.com")).to_request();
    let frank: TokenResponse = test::read_body_json(test::call_service(&app, req).await).await;
    let mut body = signup_body("grace@example.com");
    body["first_name"] = json!("Grace");
    let req = TestRequest::post().uri("/api/drivers/signup").set_json(body).to_request();
    let grace: TokenResponse = test::read_body_json(test::call_service(&app, req).await).await;

    let req = TestRequest::get().uri("/api/drivers").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let roster: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(roster.as_array().unwrap().len(), 2);

    // Fresh signups are unverified until an admin flips the flag.
    let req = TestRequest::get().uri(&format!("/api/drivers/{}", frank.driver.id)).to_request();
    let fetched: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(fetched["is_verified"], json!(false));
    assert!(fetched.get("password_hash").is_none());

    let req = TestRequest::patch()
        .uri(&format!("/api/drivers/{}", frank.driver.id))
        .set_json(json!({"is_verified": true}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = test::read_body_json(res).await;
    assert_eq!(updated["is_verified"], json!(true));

    let req = TestRequest::patch().uri("/api/drivers/999").set_json(json!({"is_verified": true})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Grace never took an order, so her record can be removed outright.
    let req = TestRequest::delete().uri(&format!("/api/drivers/{}", grace.driver.id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    let req = TestRequest::get().uri(&format!("/api/drivers/{}", grace.driver.id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn status_endpoint_requires_a_bearer_token() {
    let db = test_db().await;
    let auth = test_auth_config();
    let app = test::init_service(App::new().configure(configure(db.clone(), &auth))).await;

    let req = TestRequest::put().uri("/api/drivers/status").set_json(json!({"is_online": true})).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post().uri("/api/drivers/signup").set_json(signup_body("frank@example.com")).to_request();
    let res = test::call_service(&app, req).await;
    let body: TokenResponse = test::read_body_json(res).await;

    let req = TestRequest::put()
        .uri("/api/drivers/status")
        .insert_header(("Authorization", format!("Bearer {}", body.token)))
        .set_json(json!({"is_online": true}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // A garbage token is rejected.
    let req = TestRequest::put()
        .uri("/api/drivers/status")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .set_json(json!({"is_online": false}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}
