use std::convert::Infallible;

use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    response::status::Custom,
    serde::json::Json,
    Request, State,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::bot::ClaBot;

pub mod events;
pub use events::{Webhook, WebhookEvent};

mod payload;
use payload::WebhookPayload;

const X_GITHUB_DELIVERY: &str = "X-GitHub-Delivery";

#[derive(Debug, Serialize)]
pub struct Reply {
    pub message: String,
}

#[rocket::post("/api/webhooks/github", data = "<payload>")]
pub async fn github_webhook(
    delivery: DeliveryId,
    payload: WebhookPayload,
    bot: &State<ClaBot>,
) -> Result<Json<Reply>, Custom<Json<Reply>>> {
    let WebhookPayload(webhook) = payload;
    info!(
        "received event with action `{}` (delivery {:?})",
        webhook.action, delivery.0
    );

    match bot.handle(&webhook, delivery.0.as_deref()).await {
        Ok(message) => Ok(Json(Reply { message })),
        Err(err) => {
            warn!("checking pull request failed: {}", err);
            Err(Custom(
                Status::InternalServerError,
                Json(Reply {
                    message: err.to_string(),
                }),
            ))
        }
    }
}

/// GitHub's unique id for a delivery, reused as the correlation key of the check.
pub struct DeliveryId(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for DeliveryId {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let delivery = request
            .headers()
            .get_one(X_GITHUB_DELIVERY)
            .map(ToOwned::to_owned);

        Outcome::Success(DeliveryId(delivery))
    }
}
