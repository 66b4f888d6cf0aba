// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Settings for programs that drive the client, such as the live tests.
//!
//! Settings come from a JSON file shaped like
//!
//! ```json
//! {
//!     "Cognito": { "UserPoolId": "us-east-1_AbCdEf", "AppClientId": "1example23456789" },
//!     "Aws": { "Credentials": { "Profile": "sso-admin" }, "Region": "us-east-1" }
//! }
//! ```
//!
//! Any value can be overridden, or supplied, through the environment, which
//! keeps secrets such as pool IDs out of checked-in files.

use std::path::Path;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Names the settings file to load in [`Settings::from_env`].
pub const SETTINGS_FILE_VAR: &str = "SSO_USER_ADMIN_SETTINGS";

const USER_POOL_ID_VAR: &str = "SSO_COGNITO_USER_POOL_ID";
const APP_CLIENT_ID_VAR: &str = "SSO_COGNITO_APP_CLIENT_ID";
const PROFILE_VAR: &str = "SSO_AWS_PROFILE";
const REGION_VAR: &str = "SSO_AWS_REGION";

const DEFAULT_REGION: &str = "us-east-1";

/// Identifies the user pool and the operator credentials to manage it with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// The user pool to manage.
    pub user_pool_id: String,
    /// The app client that authentication flows run through.
    pub app_client_id: String,
    /// The operator's credentials profile.
    pub profile: String,
    /// The region the pool lives in.
    pub region: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsFile {
    #[serde(default)]
    cognito: CognitoSection,
    #[serde(default)]
    aws: AwsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CognitoSection {
    user_pool_id: Option<String>,
    app_client_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AwsSection {
    #[serde(default)]
    credentials: CredentialsSection,
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialsSection {
    profile: Option<String>,
}

impl Settings {
    /// Loads settings from the JSON file at `path`, applying environment
    /// overrides.
    pub fn load(path: &Path) -> Result<Settings, anyhow::Error> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Settings::parse(&contents, |name| std::env::var(name).ok())
            .with_context(|| format!("loading settings file {}", path.display()))
    }

    /// Loads settings from the file named by [`SETTINGS_FILE_VAR`], or
    /// returns `None` if that variable is unset.
    pub fn from_env() -> Result<Option<Settings>, anyhow::Error> {
        match std::env::var_os(SETTINGS_FILE_VAR) {
            Some(path) => Settings::load(Path::new(&path)).map(Some),
            None => Ok(None),
        }
    }

    fn parse(
        contents: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, anyhow::Error> {
        let file: SettingsFile = serde_json::from_str(contents).context("decoding settings")?;

        let setting = |var: &str, value: Option<String>, key: &str| match env(var).or(value) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => bail!("missing setting {key} (or {var} in the environment)"),
        };
        Ok(Settings {
            user_pool_id: setting(
                USER_POOL_ID_VAR,
                file.cognito.user_pool_id,
                "Cognito:UserPoolId",
            )?,
            app_client_id: setting(
                APP_CLIENT_ID_VAR,
                file.cognito.app_client_id,
                "Cognito:AppClientId",
            )?,
            profile: setting(
                PROFILE_VAR,
                file.aws.credentials.profile,
                "Aws:Credentials:Profile",
            )?,
            region: env(REGION_VAR)
                .or(file.aws.region)
                .unwrap_or_else(|| DEFAULT_REGION.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    const FILE: &str = r#"{
        "Cognito": { "UserPoolId": "us-east-1_file", "AppClientId": "file-client" },
        "Aws": { "Credentials": { "Profile": "file-profile" } }
    }"#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_parse_file() {
        let settings = Settings::parse(FILE, env(&[])).unwrap();
        assert_eq!(
            settings,
            Settings {
                user_pool_id: "us-east-1_file".into(),
                app_client_id: "file-client".into(),
                profile: "file-profile".into(),
                region: "us-east-1".into(),
            }
        );
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::parse(
            FILE,
            env(&[
                ("SSO_COGNITO_USER_POOL_ID", "eu-west-1_env"),
                ("SSO_AWS_REGION", "eu-west-1"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.user_pool_id, "eu-west-1_env");
        assert_eq!(settings.region, "eu-west-1");
        assert_eq!(settings.app_client_id, "file-client");
    }

    #[test]
    fn test_missing_settings() {
        let err = Settings::parse("{}", env(&[])).unwrap_err();
        assert!(err.to_string().contains("Cognito:UserPoolId"), "{err}");

        let settings = Settings::parse(
            "{}",
            env(&[
                ("SSO_COGNITO_USER_POOL_ID", "pool"),
                ("SSO_COGNITO_APP_CLIENT_ID", "client"),
                ("SSO_AWS_PROFILE", "profile"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.profile, "profile");

        assert!(Settings::parse("not json", env(&[])).is_err());
    }
}
