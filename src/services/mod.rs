pub mod auth;
pub mod codec;
pub mod email;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod users;

pub use auth::{AuthService, AuthSession, IssuedToken, TokenPair};
pub use codec::{Claims, TokenCodec, TokenDecodeError};
pub use email::{LogNotifier, Notification, Notifier, RecordingNotifier, SmtpNotifier};
pub use error::AuthError;
pub use ledger::TokenLedger;
pub use users::UserService;
