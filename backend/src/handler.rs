use crate::{client::Sender, room::SharedRoom, ws};
use warp::{http::StatusCode, Rejection, Reply};

type Result<T> = std::result::Result<T, Rejection>;

pub async fn ws_handler(ws: warp::ws::Ws, room: SharedRoom<Sender>) -> Result<impl Reply> {
    Ok(ws.on_upgrade(move |socket| ws::client_connection(socket, room)))
}

pub async fn health_handler() -> Result<impl Reply> {
    Ok(StatusCode::OK)
}
