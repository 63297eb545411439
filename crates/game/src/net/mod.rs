mod client;
mod controller;
mod frame;
mod protocol;
mod relay;

pub use client::{ClientConfig, ClientEvent, NetworkClient};
pub use controller::{NetworkController, encode_play, schedule_remote};
pub use frame::{FrameError, read_frame, read_message, write_frame, write_message};
pub use protocol::{
    ACTION_EMOTE, ACTION_PLAY_CARD, DEFAULT_PORT, Disconnect, EmoteData, ErrorData, GameAction,
    Heartbeat, MAX_FRAME_SIZE, MatchFound, Message, MessageType, PlayCardData, ProtocolError,
    QueueJoin, QueueLeave,
};
pub use relay::{
    DisconnectReason, RelayEvent, RelayServer, RelayStats, ServerConfig, SessionSummary,
};
