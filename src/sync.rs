//! Multiplayer synchronization: the wire contract with the relay server and
//! the client-side view of a room.
//!
//! The engine owns only the race-relevant reactions; room membership and
//! matchmaking live in the relay. Messages are JSON with camelCase event
//! names matching the relay's contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::stats::RaceStats;

pub type PlayerId = String;

/// A participant's last-known caret position. Overwritten on every inbound
/// update; no history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caret {
    pub word_idx: usize,
    pub caret_idx: i32,
}

impl Caret {
    /// The caret before anything has been typed.
    pub const INITIAL: Caret = Caret {
        word_idx: 0,
        caret_idx: -1,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub player_name: String,
}

/// Race configuration handed out by the relay when a room is created/joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub words: Vec<String>,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub players: Vec<Player>,
    pub config: RoomConfig,
}

/// Typed channel error. Surfaced to the caller; never fatal to the engine,
/// which keeps operating locally when the channel is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// A finish entry in the shared ranking. `seq` is the relay-assigned
/// monotonic finish sequence number; clients insert by it so every client
/// converges on the same order regardless of delivery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishRecord {
    pub player_id: PlayerId,
    pub seq: u64,
    pub stats: RaceStats,
}

/// Messages the client sends to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientMsg {
    CreateRoom {
        player_name: String,
    },
    JoinRoom {
        room_id: String,
        player_name: String,
    },
    StartGame {
        room_id: String,
    },
    StopGame {
        room_id: String,
    },
    UpdateCaret {
        room_id: String,
        word_idx: usize,
        caret_idx: i32,
    },
    PlayerFinished {
        room_id: String,
        stats: RaceStats,
    },
}

/// Messages the relay sends to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerMsg {
    RoomCreated(Room),
    RoomJoined(Room),
    PlayersUpdated(Vec<Player>),
    CaretUpdated {
        player_id: PlayerId,
        caret: Caret,
    },
    LeaderboardUpdated {
        player_id: PlayerId,
        seq: u64,
        stats: RaceStats,
    },
    GameStarted,
    GameStopped,
    GameFinished,
    ErrorEvent(GameError),
}

/// What the race engine should do in reaction to an inbound message. The
/// room view never mutates the race directly; it hands the caller a command.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Re-seed the engine with the room's word list and duration.
    Seed {
        words: Vec<String>,
        duration_secs: u64,
    },
    /// A new race started: reset RaceProgress.
    StartRace,
    /// Stop the session clock and surface final stats.
    StopRace,
}

/// Client-side view of a multiplayer room, built purely from inbound
/// messages. Owns the remote carets and the shared finish ranking.
#[derive(Debug, Clone)]
pub struct RoomView {
    pub self_id: PlayerId,
    pub room_id: Option<String>,
    pub is_host: bool,
    pub players: Vec<Player>,
    pub carets: HashMap<PlayerId, Caret>,
    pub leaderboard: Vec<FinishRecord>,
    pub last_error: Option<GameError>,
    pub game_started: bool,
}

impl RoomView {
    pub fn new(self_id: impl Into<PlayerId>) -> Self {
        Self {
            self_id: self_id.into(),
            room_id: None,
            is_host: false,
            players: Vec::new(),
            carets: HashMap::new(),
            leaderboard: Vec::new(),
            last_error: None,
            game_started: false,
        }
    }

    /// Apply one inbound message, returning the engine reaction if any.
    pub fn apply(&mut self, msg: ServerMsg) -> Option<EngineCommand> {
        match msg {
            ServerMsg::RoomCreated(room) => {
                self.is_host = true;
                Some(self.enter_room(room))
            }
            ServerMsg::RoomJoined(room) => {
                self.last_error = None;
                Some(self.enter_room(room))
            }
            ServerMsg::PlayersUpdated(players) => {
                // Reconcile the caret set to current membership
                self.carets
                    .retain(|id, _| players.iter().any(|p| &p.id == id));
                self.players = players;
                None
            }
            ServerMsg::CaretUpdated { player_id, caret } => {
                // Last message wins; no merge logic
                self.carets.insert(player_id, caret);
                None
            }
            ServerMsg::LeaderboardUpdated {
                player_id,
                seq,
                stats,
            } => {
                let record = FinishRecord {
                    player_id,
                    seq,
                    stats,
                };
                let at = self
                    .leaderboard
                    .partition_point(|existing| existing.seq <= seq);
                self.leaderboard.insert(at, record);
                None
            }
            ServerMsg::GameStarted => {
                self.game_started = true;
                self.leaderboard.clear();
                self.carets.clear();
                Some(EngineCommand::StartRace)
            }
            ServerMsg::GameStopped | ServerMsg::GameFinished => {
                self.game_started = false;
                Some(EngineCommand::StopRace)
            }
            ServerMsg::ErrorEvent(err) => {
                self.last_error = Some(err);
                None
            }
        }
    }

    fn enter_room(&mut self, room: Room) -> EngineCommand {
        self.room_id = Some(room.room_id);
        self.players = room.players;
        EngineCommand::Seed {
            words: room.config.words,
            duration_secs: room.config.duration_secs,
        }
    }

    /// 0-based rank of a participant in the finish ranking. Computed freshly
    /// from the owned sequence; never cached.
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.leaderboard.iter().position(|r| r.player_id == id)
    }

    pub fn self_rank(&self) -> Option<usize> {
        self.rank_of(&self.self_id)
    }

    pub fn opponents(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(move |p| p.id != self.self_id)
    }
}

/// Outbound caret tracker: turns local caret movement into at most one
/// caret-update message per change, suppressing the no-op initial state.
#[derive(Debug, Clone, Default)]
pub struct CaretEmitter {
    last_sent: Option<Caret>,
}

impl CaretEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a caret movement. Returns the caret to emit, or `None` when
    /// the update should be suppressed (unchanged, or still in the initial
    /// state with nothing ever sent).
    pub fn update(&mut self, word_idx: usize, caret_idx: i32) -> Option<Caret> {
        let caret = Caret {
            word_idx,
            caret_idx,
        };
        if self.last_sent.is_none() && caret == Caret::INITIAL {
            return None;
        }
        if self.last_sent == Some(caret) {
            return None;
        }
        self.last_sent = Some(caret);
        Some(caret)
    }

    /// A race reset broadcasts the initial caret once so opponents see the
    /// participant jump back to the start.
    pub fn reset(&mut self) -> Caret {
        self.last_sent = Some(Caret::INITIAL);
        Caret::INITIAL
    }
}
