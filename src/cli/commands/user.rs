use serde::Serialize;
use tabled::Tabled;

use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::render;
use crate::db::Storage;

#[derive(Debug, Serialize)]
pub(crate) struct UserEntry {
    pub(crate) username: String,
}

#[derive(Tabled)]
pub(crate) struct UserDisplay {
    #[tabled(rename = "Username")]
    pub(crate) username: String,
}

impl From<&UserEntry> for UserDisplay {
    fn from(user: &UserEntry) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}

/// Create a user with an already-hashed password
pub async fn add_user<S: Storage>(storage: &S, username: &str, password: &str) -> CliResult<String> {
    storage.add_user(username, password).await?;
    Ok(format!("Added user {}", username))
}

/// List all usernames
pub async fn list_users<S: Storage>(storage: &S, format: &str) -> CliResult<String> {
    let users: Vec<UserEntry> = storage
        .get_users()
        .await?
        .into_iter()
        .map(|username| UserEntry { username })
        .collect();

    render::<_, UserDisplay>(&users, format, "No users found.")
}

/// Remove a user
pub async fn remove_user<S: Storage>(storage: &S, username: &str) -> CliResult<String> {
    storage.remove_user(username).await?;
    Ok(format!("Removed user {}", username))
}

/// Replace a user's stored password
pub async fn set_password<S: Storage>(
    storage: &S,
    username: &str,
    password: &str,
) -> CliResult<String> {
    if storage.get_password(username).await?.is_none() {
        return Err(CliError::NotFound {
            entity_type: "User".to_string(),
            id: username.to_string(),
        });
    }
    storage.set_password(username, password).await?;
    Ok(format!("Updated password for {}", username))
}
