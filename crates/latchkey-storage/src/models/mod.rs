pub mod card;
pub mod credential;
pub mod validity;

pub use card::CardEntry;
pub use credential::Credential;
pub use validity::{ValidityWindow, WindowStatus};
