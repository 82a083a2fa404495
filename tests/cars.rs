use rustygate::handler::standard_middleware;
use rustygate::http::request::{CONTENT_TYPE, PATH_INFO, REQUEST_METHOD};
use rustygate::{App, AppConfig, Environ, demo};
use serde_json::{Value, json};

fn app() -> App {
    App::new(demo::router().unwrap())
}

fn cars_request(method: &str) -> Environ {
    Environ::new()
        .with(REQUEST_METHOD, method)
        .with(PATH_INFO, "/cars")
        .with(CONTENT_TYPE, "application/json")
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[test]
fn get_cars_lists_the_fleet() {
    let reply = app().handle(cars_request("GET")).unwrap();

    assert_eq!(reply.status, "200 OK");
    assert_eq!(reply.body.len(), 1);
    let body: Value = serde_json::from_slice(&reply.body[0]).unwrap();
    assert_eq!(body, json!({"cars": ["Dodge", "Honda", "Kia", "Toyota"]}));
    assert_eq!(
        reply.body[0],
        br#"{"cars":["Dodge","Honda","Kia","Toyota"]}"#.to_vec()
    );
    assert_eq!(header(&reply.headers, "Content-Type"), Some("application/json"));
}

#[test]
fn post_cars_prepends_the_new_car() {
    let reply = app()
        .handle(cars_request("POST").with_body(r#"{"car":"Tesla"}"#))
        .unwrap();

    assert_eq!(reply.status, "201 Created");
    let body: Value = serde_json::from_slice(&reply.body[0]).unwrap();
    assert_eq!(body["cars"][0], "Tesla");
    assert_eq!(
        body,
        json!({"cars": ["Tesla", "Dodge", "Honda", "Kia", "Toyota"]})
    );
    assert_eq!(
        header(&reply.headers, "Content-Length"),
        Some(reply.body[0].len().to_string().as_str())
    );
}

#[test]
fn delete_cars_is_not_allowed() {
    let reply = app().handle(cars_request("DELETE")).unwrap();
    assert_eq!(reply.status, "405 Method Not Allowed");
    assert!(reply.body.is_empty());
}

#[test]
fn standard_middleware_decorates_the_reply() {
    let config = AppConfig {
        server_name: "rustygate/test".to_string(),
        ..AppConfig::default()
    };
    let app = App::from_config(demo::router().unwrap(), standard_middleware(&config), &config)
        .unwrap();

    let reply = app.handle(cars_request("GET")).unwrap();
    assert_eq!(reply.status, "200 OK");
    assert_eq!(header(&reply.headers, "Server"), Some("rustygate/test"));
    assert!(header(&reply.headers, "Date").is_some());
    let names: Vec<&str> = reply.headers.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(&names[..2], &["Content-Type", "Content-Length"]);
}
