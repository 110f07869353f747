use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::Message;

#[derive(Error, Debug)]
#[error("Error sending message")]
pub struct SendError;

/// Identifies one physical connection, as opposed to the seat it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        ConnectionId(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_simple())
    }
}

#[derive(Debug, Clone)]
pub struct Sender(pub mpsc::UnboundedSender<Result<Message, warp::Error>>);

pub trait SendMsg {
    fn send(&self, msg: &str) -> Result<(), SendError>;
}

impl SendMsg for Sender {
    fn send(&self, msg: &str) -> Result<(), SendError> {
        self.0.send(Ok(Message::text(msg))).map_err(|_| SendError)
    }
}
