use serde::Deserialize;
use serde_json::json;

use crate::error::HandlerError;
use crate::handler::router::{Handler, HandlerResult};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::status::HttpStatus;

const CARS: [&str; 4] = ["Dodge", "Honda", "Kia", "Toyota"];

#[derive(Debug, Deserialize)]
struct NewCar {
    car: Option<String>,
}

pub fn handler() -> Handler {
    Handler::new().get(list).post(create)
}

fn list(_req: Request) -> HandlerResult {
    Ok(Response::json(json!({ "cars": CARS })).with_status(HttpStatus::Ok))
}

/// Prepends the posted car to the fixed list. Nothing is stored.
fn create(mut req: Request) -> HandlerResult {
    let payload: NewCar = req.json()?;
    let car = payload
        .car
        .ok_or_else(|| HandlerError::Payload("missing `car`".to_string()))?;

    let mut cars = vec![car];
    cars.extend(CARS.iter().map(|c| c.to_string()));

    Ok(Response::json(json!({ "cars": cars })).with_status(HttpStatus::Created))
}
