//! WayRank CLI
//!
//! Operator tooling: simulate a page session against a live ranking
//! endpoint, send votes, probe the diagnostic endpoint, and export the
//! TypeScript bindings the extension build consumes.

mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use ts_rs::TS;

use wr_core::protocol::{
    ApiError, CapabilityListing, HelloWorldResponse, RankingEntry, RankingRequest, VoteRequest,
    VoteResponse,
};

use session::{run_session, SessionOptions};

#[derive(Parser)]
#[command(name = "wr-cli")]
#[command(about = "WayRank session simulator and service tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a page session against a ranking endpoint
    Session {
        /// Page snapshot JSON file (array of posts with attribute fields)
        #[arg(short, long)]
        snapshot: String,

        /// Ranking API base URL
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        /// Metric weight as name=value (repeatable)
        #[arg(short, long = "weight", value_parser = parse_weight)]
        weights: Vec<(String, u16)>,

        /// Run a second pass to demonstrate the unchanged-set skip
        #[arg(long)]
        repeat: bool,

        /// Keep promoted posts visible
        #[arg(long)]
        keep_promoted: bool,
    },

    /// Send a vote for a content id
    Vote {
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,

        /// Composite content id (author-viewcontext-id)
        #[arg(short, long)]
        content_id: String,

        #[arg(short, long, value_enum, default_value_t = Direction::Up)]
        direction: Direction,
    },

    /// Probe the diagnostic echo endpoint
    Hello {
        #[arg(short, long, default_value = "http://127.0.0.1:8080")]
        endpoint: String,
    },

    /// Export TypeScript bindings for the wire protocol
    GenTypes {
        /// Output directory
        #[arg(short, long, default_value = "bindings")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

fn parse_weight(raw: &str) -> Result<(String, u16), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{}'", raw))?;
    if name.is_empty() {
        return Err("Metric name must not be empty".to_string());
    }
    let weight: u16 = value
        .parse()
        .map_err(|_| format!("Invalid weight '{}'", value))?;
    Ok((name.to_string(), weight))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Session {
            snapshot,
            endpoint,
            weights,
            repeat,
            keep_promoted,
        } => run_session(SessionOptions {
            snapshot,
            endpoint,
            weights,
            repeat,
            remove_promoted: !keep_promoted,
        }),
        Commands::Vote {
            endpoint,
            content_id,
            direction,
        } => cmd_vote(&endpoint, &content_id, direction),
        Commands::Hello { endpoint } => cmd_hello(&endpoint),
        Commands::GenTypes { output } => cmd_gen_types(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_vote(endpoint: &str, content_id: &str, direction: Direction) -> Result<(), String> {
    let route = match direction {
        Direction::Up => "upVote",
        Direction::Down => "downVote",
    };
    let body = VoteRequest {
        content_id: content_id.to_string(),
    };

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    let response: VoteResponse = runtime.block_on(async {
        let response = reqwest::Client::new()
            .post(format!("{}/{}", endpoint.trim_end_matches('/'), route))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Vote rejected: HTTP {}", response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| format!("Invalid response: {}", e))
    })?;

    println!("{} for '{}'", response.message, response.content_id);
    println!("  Timestamp: {}", response.timestamp);
    Ok(())
}

fn cmd_hello(endpoint: &str) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    let response: HelloWorldResponse = runtime.block_on(async {
        let response = reqwest::Client::new()
            .post(format!("{}/helloworld", endpoint.trim_end_matches('/')))
            .json(&serde_json::json!({ "probe": "wr-cli" }))
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("Probe failed: HTTP {}", response.status()));
        }
        response
            .json()
            .await
            .map_err(|e| format!("Invalid response: {}", e))
    })?;

    println!("Marker:    {}", response.test);
    println!("Echo:      {}", response.postedcontent);
    println!("Timestamp: {}", response.timestamp);
    Ok(())
}

fn cmd_gen_types(output: &PathBuf) -> Result<(), String> {
    std::fs::create_dir_all(output)
        .map_err(|e| format!("Failed to create '{}': {}", output.display(), e))?;

    RankingRequest::export_all_to(output)
        .and_then(|_| RankingEntry::export_all_to(output))
        .and_then(|_| VoteRequest::export_all_to(output))
        .and_then(|_| VoteResponse::export_all_to(output))
        .and_then(|_| HelloWorldResponse::export_all_to(output))
        .and_then(|_| CapabilityListing::export_all_to(output))
        .and_then(|_| ApiError::export_all_to(output))
        .map_err(|e| format!("Failed to export bindings: {}", e))?;

    println!("Exported protocol bindings to '{}'", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("IQ=10").unwrap(), ("IQ".to_string(), 10));
        assert!(parse_weight("IQ").is_err());
        assert!(parse_weight("=10").is_err());
        assert!(parse_weight("IQ=many").is_err());
    }
}
