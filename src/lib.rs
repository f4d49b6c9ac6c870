mod client;

pub mod audio;
pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod initiator;
pub mod instructions;
pub mod transport;

pub use pronunciation_coach_types as types;
pub use pronunciation_coach_utils as utils;

pub use client::{connect, parse_server_event, Client};
pub use config::Config;
pub use driver::{run, run_with, Critique, SessionError, SessionOutcome};
pub use transport::{Inbound, Transport};
