//! Map-screen coordinator for the Points Cimes app.
//!
//! Platform code owns the map engine and the OS dialogs; this crate owns the state in
//! between. Wrap the engine in a [`events::MapView`], hand it to a [`session::MapSession`]
//! and run it with [`driver::run_session`].

pub mod api;
pub mod camera;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod loader;
pub mod location;
pub mod notice;
pub mod permission;
pub mod selector;
pub mod session;
pub mod submission;
pub mod viewport;
pub mod visibility;

pub use driver::{channels, run_session, Command, SessionHandle, SessionIo};
pub use error::CoreError;
pub use session::{MapSession, SessionSnapshot};
