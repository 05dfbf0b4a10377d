/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Bank account example built on the sequencer.
//!
//! Deposits and withdrawals are each spun off onto their own thread but must
//! apply in the order they were requested. A withdrawal first authenticates
//! (slowly, off the turn), then checks and updates the balance while holding
//! its ticket.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod store;

pub use auth::{Authenticator, DelayAuthenticator};
pub use config::AccountConfig;
pub use self::core::Account;
pub use error::AccountError;
pub use store::{BalanceStore, SharedResource};
