mod common;

use actix_web::test;
use serial_test::serial;

use common::{get_test_user_id, TestApp};

#[actix_rt::test]
#[serial]
async fn test_get_session_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let req = test::TestRequest::get()
        .uri("/auth/session")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_get_loyalty_status_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let user_id = get_test_user_id();

    let req = test::TestRequest::get()
        .uri(&format!("/account/{}/loyalty", user_id))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_get_vouchers_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let user_id = get_test_user_id();

    let req = test::TestRequest::get()
        .uri(&format!("/account/{}/vouchers", user_id))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_claim_voucher_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let user_id = get_test_user_id();
    let catalog_id = get_test_user_id();

    let req = test::TestRequest::post()
        .uri(&format!("/account/{}/vouchers/{}/claim", user_id, catalog_id))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_get_bookings_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let user_id = get_test_user_id();

    let req = test::TestRequest::get()
        .uri(&format!("/account/{}/bookings", user_id))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn test_get_booking_by_id_without_auth() {
    let test_app = TestApp::new().await;
    let app = test::init_service(test_app.create_app()).await;

    let user_id = get_test_user_id();
    let booking_id = get_test_user_id();

    let req = test::TestRequest::get()
        .uri(&format!("/account/{}/bookings/{}", user_id, booking_id))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
