use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Value, json};

use hrms_attendance::attendance::AttendanceService;
use hrms_attendance::attendance::status::WorkPolicy;
use hrms_attendance::auth::jwt::generate_access_token;
use hrms_attendance::clock::Clock;
use hrms_attendance::config::Config;
use hrms_attendance::model::role::Role;
use hrms_attendance::routes;
use hrms_attendance::store::MemoryAttendanceStore;

const SECRET: &str = "test-secret";
const EMPLOYEE: u64 = 42;

struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    fn at(h: u32, m: u32) -> Arc<Self> {
        Arc::new(Self(Mutex::new(time(h, m))))
    }

    fn set(&self, h: u32, m: u32) {
        *self.0.lock().unwrap() = time(h, m);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}

fn time(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: SECRET.into(),
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        rate_attendance_per_min: 10_000,
        geofence_radius_meters: 300.0,
        work_policy: WorkPolicy::default(),
        reference_cache_ttl: std::time::Duration::from_secs(60),
    }
}

fn token(role: Role, employee_id: Option<u64>) -> String {
    let bearer = generate_access_token(1, "asha".into(), role.id(), employee_id, SECRET, 3600).unwrap();
    format!("Bearer {bearer}")
}

fn employee_token() -> String {
    token(Role::Employee, Some(EMPLOYEE))
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

macro_rules! test_app {
    ($clock:expr) => {{
        let config = test_config();
        let store = Arc::new(MemoryAttendanceStore::new());
        let service = Data::new(AttendanceService::new(store, WorkPolicy::default(), 300.0));
        let clock: Arc<dyn Clock> = $clock;
        test::init_service(
            App::new()
                .app_data(service)
                .app_data(Data::from(clock))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config)),
        )
        .await
    }};
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = test::call_service(&$app, $req.peer_addr(peer()).to_request()).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

macro_rules! set_bangalore_reference {
    ($app:expr) => {{
        let (status, _) = send!(
            $app,
            test::TestRequest::put()
                .uri(&format!("/api/attendance/reference/{EMPLOYEE}"))
                .insert_header(("Authorization", token(Role::Hr, None)))
                .set_json(json!({ "latitude": 12.9716, "longitude": 77.5946, "name": "Bangalore HQ" }))
        );
        assert_eq!(status, StatusCode::OK);
    }};
}

fn check_in(latitude: f64, longitude: f64) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/attendance/checkin")
        .insert_header(("Authorization", employee_token()))
        .set_json(json!({ "latitude": latitude, "longitude": longitude, "city": "Bengaluru" }))
}

fn check_out() -> test::TestRequest {
    test::TestRequest::put()
        .uri("/api/attendance/checkout")
        .insert_header(("Authorization", employee_token()))
        .set_json(json!({}))
}

#[actix_web::test]
async fn check_in_at_reference_creates_session() {
    let app = test_app!(ManualClock::at(9, 10));
    set_bangalore_reference!(app);

    let (status, body) = send!(app, check_in(12.9716, 77.5946));

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["employeeId"], EMPLOYEE);
    assert_eq!(body["date"], "2026-03-02");
    assert_eq!(body["status"], "Present");
    assert_eq!(body["punchInLocation"]["city"], "Bengaluru");
    assert!(body["punchOut"].is_null());
    assert!(body["workHours"].is_null());
}

#[actix_web::test]
async fn check_in_outside_geofence_is_rejected() {
    let app = test_app!(ManualClock::at(9, 10));
    set_bangalore_reference!(app);

    let (status, body) = send!(app, check_in(12.9816, 77.6046));

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "GEOFENCE_REJECTED");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("m away from Bangalore HQ"), "{message}");
}

#[actix_web::test]
async fn check_in_without_coordinates_is_bad_request() {
    let app = test_app!(ManualClock::at(9, 10));

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(("Authorization", employee_token()))
            .set_json(json!({ "address": "12 MG Road" }))
    );

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MISSING_LOCATION");
}

#[actix_web::test]
async fn second_check_in_same_day_is_rejected() {
    let clock = ManualClock::at(9, 45);
    let app = test_app!(clock.clone());
    set_bangalore_reference!(app);

    let (status, first) = send!(app, check_in(12.9716, 77.5946));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["status"], "Late Check-in");

    clock.set(10, 30);
    let (status, body) = send!(app, check_in(12.9716, 77.5946));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ALREADY_CHECKED_IN");

    let (status, today) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(("Authorization", employee_token()))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today, first);
}

#[actix_web::test]
async fn full_day_with_late_check_out() {
    let clock = ManualClock::at(9, 0);
    let app = test_app!(clock.clone());
    set_bangalore_reference!(app);

    let (status, _) = send!(app, check_in(12.9716, 77.5946));
    assert_eq!(status, StatusCode::CREATED);

    clock.set(18, 45);
    let (status, body) = send!(app, check_out());

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workHours"], 9.75);
    assert_eq!(body["status"], "Late Check-out");
    assert_eq!(body["punchOut"], "2026-03-02T18:45:00");

    clock.set(19, 0);
    let (status, body) = send!(app, check_out());
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ALREADY_CHECKED_OUT");
}

#[actix_web::test]
async fn short_day_is_low_work_hours() {
    let clock = ManualClock::at(9, 0);
    let app = test_app!(clock.clone());

    // no reference on file: the first check-in is adopted
    let (status, _) = send!(app, check_in(12.9716, 77.5946));
    assert_eq!(status, StatusCode::CREATED);

    clock.set(13, 0);
    let (status, body) = send!(app, check_out());

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workHours"], 4.0);
    assert_eq!(body["status"], "Low Work Hours");

    let (status, reference) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/attendance/reference/{EMPLOYEE}"))
            .insert_header(("Authorization", token(Role::Admin, None)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reference["latitude"], 12.9716);
}

#[actix_web::test]
async fn check_out_without_check_in_is_not_found() {
    let app = test_app!(ManualClock::at(18, 0));

    let (status, body) = send!(app, check_out());

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SESSION_NOT_FOUND");
}

#[actix_web::test]
async fn requests_without_token_are_unauthorized() {
    let app = test_app!(ManualClock::at(9, 0));

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .set_json(json!({ "latitude": 12.9716, "longitude": 77.5946 }))
    );

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn user_without_employee_profile_is_forbidden() {
    let app = test_app!(ManualClock::at(9, 0));

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/api/attendance/checkin")
            .insert_header(("Authorization", token(Role::Hr, None)))
            .set_json(json!({ "latitude": 12.9716, "longitude": 77.5946 }))
    );

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[actix_web::test]
async fn employees_cannot_manage_reference_locations() {
    let app = test_app!(ManualClock::at(9, 0));

    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri(&format!("/api/attendance/reference/{EMPLOYEE}"))
            .insert_header(("Authorization", employee_token()))
            .set_json(json!({ "latitude": 0.0, "longitude": 0.0, "name": "Home" }))
    );

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn history_is_scoped_to_the_caller() {
    let app = test_app!(ManualClock::at(9, 0));
    set_bangalore_reference!(app);
    let (status, _) = send!(app, check_in(12.9716, 77.5946));
    assert_eq!(status, StatusCode::CREATED);

    let (status, page) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance?per_page=5")
            .insert_header(("Authorization", employee_token()))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["per_page"], 5);
    assert_eq!(page["data"][0]["employeeId"], EMPLOYEE);

    let (status, _) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance?employee_id=7")
            .insert_header(("Authorization", employee_token()))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, page) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/api/attendance?employee_id={EMPLOYEE}"))
            .insert_header(("Authorization", token(Role::Hr, None)))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri("/api/attendance?from=2026-03-05&to=2026-03-01")
            .insert_header(("Authorization", employee_token()))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_RANGE");
}

#[actix_web::test]
async fn health_needs_no_token() {
    let app = test_app!(ManualClock::at(9, 0));

    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
