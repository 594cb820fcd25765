//! Application multiplexer: routes each user to one of several downstream
//! applications through a numbered menu.
//!
//! Per user the router keeps a small state machine:
//! 1. `start`: any message is answered with the menu
//! 2. `select`: a valid number attaches the user to that entry's endpoint
//! 3. `selected`: messages are forwarded until the reset keyword is sent
//! 4. `bad_input`: an invalid choice was made; "1" shows the menu again
//!
//! [`ApplicationMultiplexer`] runs one message at a time against the session
//! store and gateway. [`Dispatcher`] serializes messages per user while
//! letting different users proceed in parallel.

pub mod dispatcher;
pub mod error;
pub mod input;
pub mod machine;
pub mod menu;

pub use {
    dispatcher::Dispatcher,
    error::{Error, HandlerFault, Result},
    machine::{ApplicationMultiplexer, Transition},
    menu::render_menu,
};
