pub mod checksum;
mod config;
mod flow;
pub mod frame;
mod receiver;
mod sender;
mod transport;
mod window;

pub use config::{Config, BASE_PORT, BURST_SIZE, MAX_FLOWS};
pub use flow::{flow_of, port_of, FlowId};
pub use frame::{decode, encode, DecodeError, Flags, Inbound, Segment};
pub use receiver::{Receiver, ReceiverStats};
pub use sender::{Sender, SenderStats, TxWindows};
pub use transport::{mac_of, parse_mac, FrameIo, Tap};
pub use window::{AcceptOutcome, AckOutcome, RxWindow, TxWindow};
