use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bus_booking::config::{ApiConfig, AppConfig, BookingConfig, CircuitBreakerConfig, Config};
use bus_booking::{build_router, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let config = Config {
        app: AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment: "test".into(),
            rust_log: "bus_booking=debug".into(),
        },
        api: ApiConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_seconds: 5,
        },
        booking: BookingConfig {
            login_path: "/login".into(),
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 5,
            timeout_seconds: 60,
        },
    };
    build_router(AppState::new(config).unwrap())
}

fn bus(id: i64, origin: &str, destination: &str, price: &str) -> Value {
    json!({
        "id": id,
        "bus_name": format!("Bus {id}"),
        "bus_number": format!("NUM-{id}"),
        "orgin": origin,
        "destination": destination,
        "features": "AC",
        "start_time": "08:00:00",
        "reach_time": "13:30:00",
        "no_of_seats": 40,
        "price": price
    })
}

fn bus_with_seats(seats: Value) -> Value {
    let mut detail = bus(7, "Pune", "Goa", "500.00");
    detail["seats"] = seats;
    detail
}

async fn mount_bus(server: &MockServer, detail: Value) {
    Mock::given(method("GET"))
        .and(path("/api/buses/7/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail))
        .mount(server)
        .await;
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn booking_posts(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == "/api/booking/")
        .count()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn lists_filtered_buses_with_popular_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/buses/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            bus(1, "Bengaluru", "Chennai", "1200.00"),
            bus(2, "Mumbai", "Pune", "400.00"),
        ])))
        .mount(&server)
        .await;

    let request = Request::builder()
        .uri("/api/buses?from=mum&max_price=")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["buses"][0]["id"], 2);
    assert_eq!(body["buses"][0]["duration"], "5h 30m");
    assert_eq!(body["popular_routes"], json!(["Bengaluru → Chennai", "Mumbai → Pune"]));
}

#[tokio::test]
async fn seat_map_for_forty_seat_bus() {
    let server = MockServer::start().await;
    let seats: Vec<Value> = (1..=40)
        .map(|n| json!({"id": 100 + n, "seat_number": n.to_string(), "is_booked": n == 2}))
        .collect();
    mount_bus(&server, bus_with_seats(json!(seats))).await;

    let request = Request::builder()
        .uri("/api/buses/7/seat-map?selected=101,102")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], false);
    assert_eq!(body["layout"], "Standard (2+3)");
    assert_eq!(body["profile"]["seats_per_row"], 5);
    assert_eq!(body["profile"]["row_count"], 8);
    assert_eq!(body["left_rows"][0][0]["state"], "selected");
    assert_eq!(body["left_rows"][0][1]["state"], "booked");
    assert_eq!(body["right_rows"][0].as_array().unwrap().len(), 3);
    // 102 забронировано, в выборе остаётся только 101
    assert_eq!(body["selection"], json!([101]));
    assert_eq!(body["counts"]["booked"], 1);
}

#[tokio::test]
async fn seat_map_without_seats_is_empty_state() {
    let server = MockServer::start().await;
    mount_bus(&server, bus_with_seats(json!([]))).await;

    let request = Request::builder()
        .uri("/api/buses/7/seat-map")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["empty"], true);
    assert_eq!(body["profile"], Value::Null);
}

#[tokio::test]
async fn toggle_reports_rejection_without_changing_selection() {
    let server = MockServer::start().await;
    mount_bus(
        &server,
        bus_with_seats(json!([
            {"id": 1, "seat_number": "1", "is_booked": false},
            {"id": 2, "seat_number": "2", "is_booked": true},
            {"id": 3, "seat_number": "3", "is_booked": false}
        ])),
    )
    .await;

    let (status, body) = send(
        app(&server),
        post_json("/api/buses/7/selection/toggle", json!({"selection": [1], "seat_id": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rejected"], "already_booked");
    assert_eq!(body["selection"], json!([1]));

    let (_, body) = send(
        app(&server),
        post_json("/api/buses/7/selection/toggle", json!({"selection": [1], "seat_id": 3})),
    )
    .await;
    assert_eq!(body["rejected"], Value::Null);
    assert_eq!(body["selection"], json!([1, 3]));
    assert_eq!(body["summary"], json!({"count": 2, "total_price": 1000.0, "seat_numbers": ["1", "3"]}));
}

#[tokio::test]
async fn booking_without_token_redirects_to_login() {
    let server = MockServer::start().await;
    // ни одного запроса во внешний API быть не должно
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(app(&server), post_json("/api/buses/7/bookings", json!({"selection": [1]}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["redirect"], "/login");
}

#[tokio::test]
async fn seat_map_with_huge_seat_number_stays_small() {
    let server = MockServer::start().await;
    mount_bus(
        &server,
        bus_with_seats(json!([
            {"id": 1, "seat_number": "1", "is_booked": false},
            {"id": 2, "seat_number": "4294967295", "is_booked": false}
        ])),
    )
    .await;

    let request = Request::builder()
        .uri("/api/buses/7/seat-map")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["layout"], "Luxury (3+3)");
    assert_eq!(body["left_rows"].as_array().unwrap().len(), 2);
    assert_eq!(body["right_rows"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn seat_map_selection_limit_skips_booked_ids() {
    let server = MockServer::start().await;
    let seats: Vec<Value> = (1..=10)
        .map(|n| json!({"id": n, "seat_number": n.to_string(), "is_booked": n == 2}))
        .collect();
    mount_bus(&server, bus_with_seats(json!(seats))).await;

    let request = Request::builder()
        .uri("/api/buses/7/seat-map?selected=2,3,4,5,6,7,8")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selection"], json!([3, 4, 5, 6, 7, 8]));
}

#[tokio::test]
async fn concurrent_booking_of_same_seat_is_sent_once() {
    let server = MockServer::start().await;
    mount_bus(
        &server,
        bus_with_seats(json!([
            {"id": 1, "seat_number": "1", "is_booked": false},
            {"id": 3, "seat_number": "3", "is_booked": false}
        ])),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/booking/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({
                    "id": 9, "user": "alice", "bus": "Bus 7", "seat": 1, "booking_time": null
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let booking = || {
        let mut request = post_json("/api/buses/7/bookings", json!({"selection": [1]}));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
        request
    };
    let app = app(&server);
    let ((first, _), (second, second_body)) =
        tokio::join!(send(app.clone(), booking()), send(app.clone(), booking()));

    let mut statuses = [first, second];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    if second == StatusCode::CONFLICT {
        assert_eq!(second_body["error"], "Booking is already being submitted");
    }
    assert_eq!(booking_posts(&server).await, 1);

    // после завершения место снова можно отправить
    let (status, _) = send(app, booking()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking_posts(&server).await, 2);
}

#[tokio::test]
async fn partial_booking_failure_reports_each_seat() {
    let server = MockServer::start().await;
    mount_bus(
        &server,
        bus_with_seats(json!([
            {"id": 1, "seat_number": "1", "is_booked": false},
            {"id": 3, "seat_number": "3", "is_booked": false}
        ])),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/booking/"))
        .and(body_json(json!({"seat_id": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 9, "user": "alice", "bus": "Bus 7", "seat": 1, "booking_time": null
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/booking/"))
        .and(body_json(json!({"seat_id": 3})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Seat already booked"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = post_json("/api/buses/7/bookings", json!({"selection": [1, 3]}));
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Token abc".parse().unwrap());
    let (status, body) = send(app(&server), request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["booked"][0]["seat"], 1);
    assert_eq!(body["failed"][0]["seat_id"], 3);
    assert!(body["failed"][0]["reason"]
        .as_str()
        .unwrap()
        .contains("Seat already booked"));
}

#[tokio::test]
async fn invalid_new_bus_is_rejected_before_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let form = json!({
        "bus_name": "",
        "bus_number": "KA-01",
        "orgin": "A",
        "destination": "B",
        "features": "AC",
        "start_time": "09:00:00",
        "reach_time": "12:00:00",
        "no_of_seats": 0,
        "price": 300.0
    });
    let (status, _) = send(app(&server), post_json("/api/buses", form)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
