//! Terminal chat-room client.
//!
//! Asks for a name and a room number, follows the room's server-sent-event
//! stream and posts typed messages to it. The name, the room and the received
//! messages are kept in a [`cache::SessionStore`], which can be backed by a
//! file so a restarted client resumes where it left off.

pub mod cache;
pub mod config;
pub mod dto;
pub mod error;
pub mod formatter;
pub mod identity;
pub mod room;
pub mod runner;
pub mod session;
pub mod transport;
pub mod ui;
