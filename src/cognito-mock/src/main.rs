// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Serves a mock Cognito user pool admin API.

use anyhow::Context;
use sso_cognito_mock::{CognitoMockServer, MockConfig, PoolConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, clap::Parser)]
#[clap(about = "Cognito user pool admin API mock server", long_about = None)]
struct Args {
    /// Listen address for the server; supports DNS names.
    #[clap(
        long,
        env = "SSO_COGNITO_MOCK_LISTEN_ADDR",
        value_name = "HOST:PORT",
        default_value = "127.0.0.1:9229"
    )]
    listen_addr: String,
    /// User pools to serve.
    /// JSON of the form: `[{"id": "...", "client_ids": ["..."], "groups": ["..."]}]`
    #[clap(long, env = "SSO_COGNITO_MOCK_POOLS")]
    pools: String,
    /// Issuer prefix for generated JWTs.
    #[clap(long, env = "SSO_COGNITO_MOCK_ISSUER")]
    issuer: Option<String>,
    /// HMAC secret for signing generated JWTs.
    #[clap(long, env = "SSO_COGNITO_MOCK_TOKEN_SECRET")]
    token_secret: Option<String>,
    /// Lifetime of generated JWTs.
    #[clap(long, default_value = "3600")]
    expires_in_secs: i64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Args = clap::Parser::parse();
    if let Err(err) = run(args).await {
        eprintln!("sso-cognito-mock: fatal: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), anyhow::Error> {
    let addr = tokio::net::lookup_host(&args.listen_addr)
        .await
        .with_context(|| format!("resolving {}", args.listen_addr))?
        .next()
        .with_context(|| format!("{} did not resolve to any addresses", args.listen_addr))?;
    let pools: Vec<PoolConfig> =
        serde_json::from_str(&args.pools).context("decoding --pools")?;

    let mut config = MockConfig {
        expires_in_secs: args.expires_in_secs,
        ..Default::default()
    };
    if let Some(issuer) = args.issuer {
        config.issuer = issuer;
    }
    if let Some(token_secret) = args.token_secret {
        config.token_secret = token_secret;
    }

    let server = CognitoMockServer::start(Some(&addr), pools, config).await?;

    println!("sso-cognito-mock listening...");
    println!(" HTTP address: {}", server.base_url);

    server.handle.await??;
    anyhow::bail!("serving tasks unexpectedly exited");
}
