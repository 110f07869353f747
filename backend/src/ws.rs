use crate::client::{ConnectionId, Sender};
use crate::room::{send_response, SharedRoom};
use common::messages::{Handshake, Response};
use common::PlayerNum;
use futures::{FutureExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};
use warp::ws::{Message, WebSocket};

pub async fn client_connection(ws: WebSocket, room: SharedRoom<Sender>) {
    let (client_ws_sender, mut client_ws_rcv) = ws.split();
    let (client_sender, client_rcv) = mpsc::unbounded_channel();

    let client_rcv = UnboundedReceiverStream::new(client_rcv);
    tokio::task::spawn(client_rcv.forward(client_ws_sender).map(|result| {
        if let Err(e) = result {
            error!("error sending websocket msg: {}", e);
        }
    }));

    let sender = Sender(client_sender);
    let id = ConnectionId::new();
    info!("{} connected", id);

    // Nothing but a handshake is accepted until a seat is bound
    let player_num = loop {
        let message = match next_text(id, &mut client_ws_rcv).await {
            Some(message) => message,
            None => {
                info!("{} left before taking a seat", id);
                return;
            }
        };
        if let Some(player_num) = greet(id, &message, &sender, &room).await {
            break player_num;
        }
    };

    while let Some(message) = next_text(id, &mut client_ws_rcv).await {
        client_msg(id, &message, &sender, &room).await;
    }

    let mut room = room.write().await;
    match room.disconnect(id) {
        Some(player_num) => info!(
            "player {} ({}) disconnected, opponent connected: {}",
            player_num,
            id,
            room.is_connected(player_num.other())
        ),
        None => info!(
            "{} disconnected after seat {} was rebound elsewhere",
            id, player_num
        ),
    }
}

// Next text frame from the client, skipping keepalives and binary frames.
// None once the socket is closed or errors.
async fn next_text<S>(id: ConnectionId, client_ws_rcv: &mut S) -> Option<String>
where
    S: Stream<Item = Result<Message, warp::Error>> + Unpin,
{
    while let Some(result) = client_ws_rcv.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                error!("error receiving ws message for id: {}): {}", id, e);
                return None;
            }
        };
        if msg.is_close() {
            return None;
        }
        let message = match msg.to_str() {
            Ok(v) => v.trim(),
            Err(_) => continue,
        };
        if message == "ping" {
            continue;
        }
        return Some(message.to_string());
    }
    None
}

#[tracing::instrument(skip(sender, room))]
async fn greet(
    id: ConnectionId,
    message: &str,
    sender: &Sender,
    room: &SharedRoom<Sender>,
) -> Option<PlayerNum> {
    let handshake = match Handshake::parse(message) {
        Ok(handshake) => handshake,
        Err(err) => {
            warn!("bad handshake from {}: {}", id, err);
            send_response(sender, &Response::TryAgain(err.to_string()));
            return None;
        }
    };

    // Welcome and snapshots go out before the lock is released, so no other
    // task's frames can slip in between them
    let mut room = room.write().await;
    match room.accept(handshake, id, sender.clone()) {
        Ok(welcome) => {
            let player_num = welcome.you_are;
            info!(
                "{} is player {}, game phase {:?}",
                id,
                player_num,
                room.game_state().phase()
            );
            send_response(sender, &Response::HelloOkay(welcome));
            room.broadcast().deliver();
            Some(player_num)
        }
        Err(err) => {
            warn!("handshake from {} refused: {}", id, err);
            send_response(sender, &Response::TryAgain(err.to_string()));
            None
        }
    }
}

#[tracing::instrument(skip(sender, room))]
async fn client_msg(id: ConnectionId, message: &str, sender: &Sender, room: &SharedRoom<Sender>) {
    info!("received message from {}: {}", id, message);
    // Frames are queued on the connection channels under the lock; the
    // forwarder tasks do the socket writes
    let result = room.write().await.apply(id, message);
    match result {
        Ok(sent) => debug!("queued {} frames", sent),
        Err(err) => {
            warn!("rejected message from {}: {}", id, err);
            send_response(sender, &Response::InvalidAction(err.to_string()));
        }
    }
}
