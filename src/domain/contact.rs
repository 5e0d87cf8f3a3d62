use serde::{Deserialize, Serialize};

use super::{UserEmail, Username};

/// A named mailbox, as the email API expects senders and recipients.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Contact {
    pub name: Username,
    pub email: UserEmail,
}
