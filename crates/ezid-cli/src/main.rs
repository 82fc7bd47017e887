//! # EZID CLI
//!
//! Command-line access to the EZID identifier service, plus offline ANVL
//! encoding and decoding.

use anyhow::{bail, Context, Result};
use ezid_anvl::{decode, encode, Metadata};
use ezid_client::{ClientConfig, Credentials, EzidClient, FieldResolver, ProfileTables};
use std::env;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "encode" => {
            let metadata = parse_fields(&args[2..])?;
            print!("{}", encode(&metadata));
        }
        "decode" => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            let metadata = decode(&input).context("Failed to decode ANVL")?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        "mint" | "create" | "get" | "set" | "delete" => {
            let Some(target) = args.get(2) else {
                eprintln!("Usage: ezid {} <identifier|shoulder> [name=value...]", args[1]);
                std::process::exit(1);
            };
            let metadata = parse_fields(&args[3..])?;
            run_remote(&args[1], target, &metadata).await?;
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Log in, run one operation, and log out.
async fn run_remote(command: &str, target: &str, metadata: &Metadata) -> Result<()> {
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let credentials = Credentials::from_env().context("Missing credentials")?;
    let mut client = EzidClient::new(config).context("Failed to create client")?;

    client
        .login_with(&credentials)
        .await
        .context("Login failed")?;

    let outcome = match command {
        "mint" => client
            .mint_identifier(target, metadata)
            .await
            .map(|id| println!("{id}")),
        "create" => client
            .create_identifier(target, metadata)
            .await
            .map(|id| println!("{id}")),
        "get" => client.get_metadata(target).await.map(|md| print!("{}", encode(&md))),
        "set" => client.set_metadata(target, metadata).await,
        "delete" => client.delete_identifier(target).await,
        other => bail!("unknown command {other}"),
    };

    if let Err(e) = client.logout().await {
        tracing::warn!(error = %e, "Logout failed");
    }

    outcome.with_context(|| format!("{command} {target} failed"))
}

/// Parse `name=value` arguments, resolving symbolic profile names.
fn parse_fields(args: &[String]) -> Result<Metadata> {
    let tables = ProfileTables;
    let mut metadata = Metadata::new();
    for arg in args {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("expected name=value, got {arg:?}");
        };
        let name = tables.resolve(name).unwrap_or(name);
        metadata.insert(name, value);
    }
    Ok(metadata)
}

fn print_help() {
    println!(
        r#"EZID CLI

USAGE:
    ezid <COMMAND> [ARGS]

COMMANDS:
    encode [name=value...]              Print fields as ANVL
    decode                              Read ANVL from stdin, print JSON
    mint <shoulder> [name=value...]     Mint an identifier under a shoulder
    create <identifier> [name=value...] Register an identifier
    get <identifier>                    Print an identifier's metadata as ANVL
    set <identifier> name=value...      Update the given fields
    delete <identifier>                 Delete a reserved identifier
    help                                Show this help message

Names may be wire names (datacite.title) or profile symbols (TITLE, dc.TITLE).

ENVIRONMENT:
    EZID_USERNAME, EZID_PASSWORD        Account credentials
    EZID_BASE_URL                       Service URL (default https://ezid.cdlib.org)
    EZID_TIMEOUT_SECS                   Request timeout
    RUST_LOG                            Log filter (default info)

EXAMPLES:
    ezid mint doi:10.5072/FK2 TITLE="My dataset" _target=http://example.org/
    ezid get ark:/99999/fk4abc
    echo "title: Test: resource" | ezid decode
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_resolve_symbols() {
        let args = vec![
            "TITLE=Hello".to_string(),
            "_target=http://x/?a=b".to_string(),
            "custom.key=v".to_string(),
        ];
        let metadata = parse_fields(&args).unwrap();
        assert_eq!(metadata.get("datacite.title"), Some("Hello"));
        assert_eq!(metadata.get("_target"), Some("http://x/?a=b"));
        assert_eq!(metadata.get("custom.key"), Some("v"));
    }

    #[test]
    fn fields_require_equals() {
        assert!(parse_fields(&["oops".to_string()]).is_err());
    }
}
