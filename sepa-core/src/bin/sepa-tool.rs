//! SEPA operator tool
//!
//! Thin command-line front end over `sepa_core::api`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sepa_core::{api, Config, MessageType};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sepa-tool",
    about = "Build SEPA payment messages and check IBANs and BICs",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    debug: bool,

    /// TOML configuration file (environment variables otherwise)
    #[arg(long, global = true, env = "SEPA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an IBAN's format and checksum
    CheckIban {
        /// IBAN in electronic format
        iban: String,
    },
    /// Look up the bank registered for a BIC
    BankName {
        /// 8 or 11 character BIC
        bic: String,
    },
    /// Derive an IBAN from national identifiers
    Convert {
        /// ISO country code
        country: String,
        /// Account identifier
        account: String,
        /// Bank identifier (bank code, sort code, ...)
        bank: String,
    },
    /// Build a message and print its XML
    Build {
        /// Message type: ddi or cti
        #[arg(long = "type", value_name = "TYPE")]
        message_type: MessageType,
        /// Account holder name
        #[arg(long)]
        name: String,
        /// Account IBAN
        #[arg(long)]
        iban: String,
        /// Agent BIC
        #[arg(long)]
        bic: String,
        /// Extension field, repeatable
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
}

#[derive(Serialize)]
struct IbanCheck<'a> {
    iban: &'a str,
    valid: bool,
}

#[derive(Serialize)]
struct Conversion {
    iban: String,
    status: String,
    status_code: i64,
}

fn parse_field(arg: &str) -> std::result::Result<(String, String), String> {
    arg.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::from_env().context("loading config from environment")?,
    };

    match cli.command {
        Commands::CheckIban { iban } => {
            let valid = api::check_iban(&iban);
            print_json(&IbanCheck { iban: &iban, valid })?;
            if !valid {
                std::process::exit(1);
            }
        }
        Commands::BankName { bic } => {
            api::initialize(&config)?;
            let bank = api::bic_get_bank(&bic)?;
            print_json(bank)?;
        }
        Commands::Convert {
            country,
            account,
            bank,
        } => {
            let conversion = api::iban_convert(&country, &account, &bank)?;
            print_json(&Conversion {
                status: conversion.status.to_string(),
                status_code: conversion.status.code(),
                iban: conversion.iban,
            })?;
        }
        Commands::Build {
            message_type,
            name,
            iban,
            bic,
            fields,
        } => {
            api::initialize(&config)?;
            let mut message = api::create_message(message_type)?;
            api::set_name(&mut message, &name)?;
            api::set_iban(&mut message, &iban)?;
            api::set_bic(&mut message, &bic)?;
            api::add(&mut message, &fields)?;

            let xml = api::to_xml(&mut message)?;
            println!("{}", xml);
        }
    }

    Ok(())
}
