use crate::error::GameError;
use crate::game::{Difficulty, NightAction, Theme};
use crate::session::{arm_phase_timer, RoomHandle, RoomManager};
use futures_util::{select, FutureExt, SinkExt, StreamExt, TryStreamExt};
use rand::RngCore;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

#[derive(Error, Debug)]
enum WsError {
    #[error("violation of the application-layer protocol")]
    ProtocolError,
    #[error("{0}")]
    GameError(#[from] GameError),
}

/// A connected client: nothing until it joins a room, then a seat plus a
/// stream of view updates for that seat.
struct Client<'a> {
    manager: &'a RoomManager,
    joined: Option<Joined>,
}

struct Joined {
    room: RoomHandle,
    room_id: String,
    player_id: usize,
    rx: watch::Receiver<Value>,
}

pub async fn accept_connection(stream: TcpStream, manager: &'static RoomManager) {
    log::info!("Accepted new connection");

    let Ok(stream) = tokio_tungstenite::accept_async(stream).await else {
        log::error!("Error occured during websocket handshake");
        return;
    };
    let (mut write, read) = stream.split();
    let mut read = read.fuse();

    let mut client = Client { manager, joined: None };

    loop {
        select! {
            msg = read.try_next() => {
                let Ok(Some(Message::Text(msg))) = msg else {
                    break;
                };
                let Ok(msg) = serde_json::from_str::<Value>(&msg) else {
                    log::error!("Invalid JSON received: {}", &msg);
                    break;
                };
                let reply = match parse_request(&msg) {
                    Ok(req) => match process_request(req, &mut client) {
                        Ok(reply) => reply,
                        Err(err) => Some(json!({
                            "type": "error",
                            "message": err.to_string()
                        })),
                    },
                    Err(err) => Some(json!({
                        "type": "error",
                        "message": err.to_string()
                    })),
                };
                if let Some(reply) = reply {
                    write.send(Message::Text(reply.to_string())).await.ok();
                }
            },
            state = next_state(&mut client.joined).fuse() => {
                if write.send(Message::Text(state.to_string())).await.is_err() {
                    log::error!("Could not send websockets message");
                    break;
                }
            }
        }
    }

    // Discard the seat's buffered input on disconnect.
    if let Some(joined) = &client.joined {
        if let Ok(mut room) = joined.room.lock() {
            room.leave(joined.player_id);
        }
        log::info!("Connection closed: seat {} in room {}", joined.player_id, joined.room_id);
    } else {
        log::info!("Connection closed");
    }
}

/// Waits for the next view update for this client's seat. Clients that
/// have not joined a room never resolve.
async fn next_state(joined: &mut Option<Joined>) -> Value {
    match joined {
        Some(j) => {
            if j.rx.changed().await.is_ok() {
                j.rx.borrow().clone()
            } else {
                futures_util::future::pending().await
            }
        }
        None => futures_util::future::pending().await,
    }
}

/// A message sent by a game client to the server.
enum Request {
    CreateRoom,
    Join { room_id: String, name: String },
    Start { theme: Theme, difficulty: Difficulty },
    NightAction { action: Option<NightAction> },
    Vote { target_id: Option<usize>, last_words: Option<String> },
    ResolveNight,
    ResolveVote,
    Chat { text: String },
    Restart,
}

/// Parses a websockets message from the client.
fn parse_request(req: &Value) -> Result<Request, WsError> {
    match req["type"].as_str().unwrap_or("") {
        "create_room" => Ok(Request::CreateRoom),
        "join" => {
            let room_id = req["roomId"]
                .as_str()
                .ok_or(WsError::ProtocolError)?
                .to_ascii_uppercase();
            let name = req["name"].as_str().unwrap_or("Player").chars().take(32).collect();
            Ok(Request::Join { room_id, name })
        }
        "start" => {
            let theme = Theme::from_id(req["theme"].as_str().unwrap_or(""));
            let difficulty = Difficulty::from_id(req["difficulty"].as_str().unwrap_or(""));
            Ok(Request::Start { theme, difficulty })
        }
        "night_action" => {
            let action = serde_json::from_value(req["action"].clone()).ok();
            Ok(Request::NightAction { action })
        }
        "vote" => {
            let target_id = req["targetId"].as_u64().map(|id| id as usize);
            let last_words = req["lastWords"].as_str().map(|s| s.to_string());
            Ok(Request::Vote { target_id, last_words })
        }
        "resolve_night" => Ok(Request::ResolveNight),
        "resolve_vote" => Ok(Request::ResolveVote),
        "chat" => {
            let text = req["text"].as_str().ok_or(WsError::ProtocolError)?.to_string();
            Ok(Request::Chat { text })
        }
        "restart" => Ok(Request::Restart),
        _ => Err(WsError::ProtocolError),
    }
}

/// Processes a request from the client.
fn process_request(req: Request, client: &mut Client) -> Result<Option<Value>, WsError> {
    match req {
        Request::CreateRoom => {
            let (room_id, _) = client.manager.create_room();
            Ok(Some(json!({
                "type": "room_created",
                "roomId": room_id
            })))
        }
        Request::Join { room_id, name } => {
            let room = client.manager.find_room(&room_id)?;
            let (player_id, rx) = {
                let mut locked = room.lock().map_err(|_| GameError::RoomNotFound)?;
                locked.join(&name)?
            };
            let host = {
                let locked = room.lock().map_err(|_| GameError::RoomNotFound)?;
                locked.is_host(player_id)
            };
            client.joined = Some(Joined { room, room_id: room_id.clone(), player_id, rx });
            Ok(Some(json!({
                "type": "joined",
                "roomId": room_id,
                "playerId": player_id,
                "host": host
            })))
        }
        Request::Start { theme, difficulty } => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            let seed = rand::thread_rng().next_u64();
            {
                let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
                room.start(joined.player_id, theme, difficulty, seed)?;
            }
            arm_phase_timer(joined.room.clone());
            Ok(Some(json!({ "type": "started" })))
        }
        Request::NightAction { action } => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
            room.buffer_night_action(joined.player_id, action)?;
            Ok(Some(json!({ "type": "acked", "action": "night_action" })))
        }
        Request::Vote { target_id, last_words } => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
            room.buffer_vote(joined.player_id, target_id, last_words)?;
            Ok(Some(json!({ "type": "acked", "action": "vote" })))
        }
        Request::ResolveNight => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            {
                let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
                room.resolve_night_now(Some(joined.player_id))?;
            }
            arm_phase_timer(joined.room.clone());
            Ok(None)
        }
        Request::ResolveVote => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            {
                let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
                room.resolve_vote_now(Some(joined.player_id))?;
            }
            arm_phase_timer(joined.room.clone());
            Ok(None)
        }
        Request::Chat { text } => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
            room.chat(joined.player_id, &text)?;
            Ok(None)
        }
        Request::Restart => {
            let joined = client.joined.as_ref().ok_or(GameError::RoomNotFound)?;
            let mut room = joined.room.lock().map_err(|_| GameError::RoomNotFound)?;
            room.restart(joined.player_id)?;
            Ok(None)
        }
    }
}
