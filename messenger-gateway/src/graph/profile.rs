//! User profile and page-scoped id lookups.

use serde::Deserialize;

use super::GraphClient;
use crate::error::GraphError;

const PROFILE_FIELDS: &str = "first_name,last_name,profile_pic";

/// Public profile of a user.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, rename = "profile_pic")]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountLinking {
    /// Page-scoped id of the user
    #[serde(default)]
    recipient: String,
}

impl GraphClient {
    /// Fetch name and picture of the user with page-scoped id `user_id`.
    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, GraphError> {
        let path = format!("/v3.1/{}", user_id);
        self.get(&path, &[("fields", PROFILE_FIELDS)]).await
    }

    /// Resolve the page-scoped id of a user during account linking.
    ///
    /// `account_linking_token` must be the unexpired token passed to the
    /// linking URL.
    pub async fn get_psid(&self, account_linking_token: &str) -> Result<String, GraphError> {
        let linking: AccountLinking = self
            .get(
                "/v2.6/me",
                &[
                    ("fields", "recipient"),
                    ("account_linking_token", account_linking_token),
                ],
            )
            .await?;
        Ok(linking.recipient)
    }
}
