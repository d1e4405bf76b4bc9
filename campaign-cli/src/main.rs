//! campaign-cli: command-line frontend for the Campaign Impact Hub
//!
//! Brief analysis, safety checks and UTM links run locally; campaign
//! generation, chat and status go through a running `campaign-server`.
//!
//! # Subcommands
//! - `analyze <brief.json> [--lang es|en] [--json]`
//! - `check <file> [--sector S] [--proof] [--json]`
//! - `utm <base> --source S --medium M --campaign C [--content X] [--term T]`
//! - `generate <brief.json> [--lang es|en] [--json]`
//! - `chat <message> [--thread ID]`
//! - `status`

use std::path::Path;
use std::time::Duration;

use campaign_core::api::{ChatRequest, ChatResponse, GenerateRequest};
use campaign_core::models::{CampaignBriefData, CampaignVersion, Language, SafetyReport};
use campaign_core::{analyze_brief, build_utm_url, check_content_safety, BriefAnalysis, UtmParams};
use clap::{Parser, Subcommand};
use serde::Serialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "campaign-cli", version, about = "Campaign Impact Hub command-line frontend")]
struct Cli {
    /// Campaign Hub server URL (overrides CAMPAIGN_HUB_URL env var)
    #[arg(long, env = "CAMPAIGN_HUB_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Score a brief and list its gaps (local)
    Analyze {
        /// Path to a brief JSON file
        brief: String,

        #[arg(long, default_value = "es")]
        lang: Language,

        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check copy for risky claims (local)
    Check {
        /// Text file with the copy to check
        file: String,

        /// Sector enabling sector-specific legal rules (e.g. salud, financiero)
        #[arg(long)]
        sector: Option<String>,

        /// The copy is backed by evidence; superlatives become low severity
        #[arg(long)]
        proof: bool,

        #[arg(long)]
        json: bool,
    },

    /// Build a UTM-tagged URL (local)
    Utm {
        base: String,

        #[arg(long)]
        source: String,

        #[arg(long)]
        medium: String,

        #[arg(long)]
        campaign: String,

        #[arg(long)]
        content: Option<String>,

        #[arg(long)]
        term: Option<String>,
    },

    /// Generate a campaign from a brief (server)
    Generate {
        brief: String,

        #[arg(long, default_value = "es")]
        lang: Language,

        #[arg(long)]
        json: bool,
    },

    /// Send one chat message to the orchestrator agent (server)
    Chat {
        message: String,

        /// Continue an existing thread
        #[arg(long)]
        thread: Option<String>,
    },

    /// Show Campaign Hub server status
    Status,
}

// ============================================================================
// Local commands
// ============================================================================

pub fn load_brief(path: &Path) -> anyhow::Result<CampaignBriefData> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Human-readable analysis report.
pub fn render_analysis(analysis: &BriefAnalysis, lang: Language) -> String {
    let mut out = format!(
        "{}: {}/100 ({})\n{}\n",
        lang.pick("Puntuación", "Score"),
        analysis.score,
        analysis.grade.label(lang),
        analysis.status_text,
    );

    let sections = [
        (lang.pick("Falta", "Missing"), &analysis.missing),
        (lang.pick("Recomendaciones", "Recommendations"), &analysis.recommendations),
        (lang.pick("Riesgos", "Risks"), &analysis.risks),
    ];
    for (title, items) in sections {
        if items.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}:\n", title));
        for item in items {
            out.push_str(&format!("  - {}\n", item));
        }
    }

    if !analysis.critical_questions.is_empty() {
        out.push_str(&format!("\n{}:\n", lang.pick("Preguntas clave", "Key questions")));
        for q in &analysis.critical_questions {
            let marker = if q.required { "*" } else { " " };
            out.push_str(&format!(" {} [{}] {}\n", marker, q.id, q.question));
        }
    }

    out
}

pub fn render_safety(report: &SafetyReport) -> String {
    let mut out = format!(
        "Score: {}/100  (high {}, medium {}, low {})\n{}\n",
        report.score, report.high_severity, report.medium_severity, report.low_severity, report.summary
    );
    for issue in &report.issues {
        out.push_str(&format!(
            "\n[{:?}] {}\n  en:        {}\n  sugerido:  {}\n",
            issue.severity, issue.issue, issue.original, issue.suggestion
        ));
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn do_analyze(path: &str, lang: Language, json: bool) -> anyhow::Result<()> {
    let brief = load_brief(Path::new(path))?;
    let analysis = analyze_brief(&brief, lang);
    if json {
        return print_json(&analysis);
    }
    print!("{}", render_analysis(&analysis, lang));
    Ok(())
}

fn do_check(path: &str, sector: Option<&str>, proof: bool, json: bool) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let report = check_content_safety(&content, sector, proof);
    if json {
        return print_json(&report);
    }
    print!("{}", render_safety(&report));
    Ok(())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client(timeout_secs: u64) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// POST `body` to `server/path`; exits with the server's error on non-2xx.
fn post_json<B: Serialize>(server: &str, path: &str, body: &B, timeout_secs: u64) -> anyhow::Result<serde_json::Value> {
    let url = format!("{}{}", server, path);
    let resp = match client(timeout_secs)?.post(&url).json(body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("campaign-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        eprintln!("campaign-cli: server returned {}: {}", status, error_message(&body));
        if let Some(rec) = body["recommendation"].as_str() {
            eprintln!("campaign-cli: {}", rec);
        }
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

/// Pull the human message out of a server error body.
pub fn error_message(body: &serde_json::Value) -> String {
    match &body["error"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => body.to_string(),
        other => other.to_string(),
    }
}

fn do_generate(server: &str, path: &str, lang: Language, json: bool) -> anyhow::Result<()> {
    let brief = load_brief(Path::new(path))?;
    let body = post_json(server, "/api/campaign/generate", &GenerateRequest { brief, language: lang }, 180)?;
    if json {
        return print_json(&body);
    }

    let version: CampaignVersion = serde_json::from_value(body)?;
    println!("{}", version.changelog);
    println!("Version: {}\n", version.id);
    if !version.outputs.strategy.is_empty() {
        println!("{}", version.outputs.strategy);
    }
    Ok(())
}

fn do_chat(server: &str, message: String, thread: Option<String>) -> anyhow::Result<()> {
    let req = ChatRequest {
        message: Some(message),
        thread_id: thread,
    };
    let resp: ChatResponse = serde_json::from_value(post_json(server, "/api/chat", &req, 180)?)?;

    println!("{}", resp.answer.as_deref().unwrap_or("(sin respuesta)"));
    eprintln!("thread: {}", resp.thread_id);
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let url = format!("{}/health", server);

    match client(10)?.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Campaign Hub:  {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:       {}", body["version"].as_str().unwrap_or("?"));
            println!("Foundry mode:  {}", body["foundry_mode"].as_str().unwrap_or("?"));
            println!("API key:       {}", body["api_key_configured"].as_bool().unwrap_or(false));
            println!("Generator:     {}", body["generator"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("campaign-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("campaign-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Analyze { brief, lang, json } => do_analyze(&brief, lang, json),
        Commands::Check { file, sector, proof, json } => do_check(&file, sector.as_deref(), proof, json),
        Commands::Utm {
            base,
            source,
            medium,
            campaign,
            content,
            term,
        } => {
            let params = UtmParams {
                source,
                medium,
                campaign,
                content,
                term,
            };
            build_utm_url(&base, &params)
                .map(|url| println!("{}", url))
                .map_err(anyhow::Error::from)
        }
        Commands::Generate { brief, lang, json } => do_generate(&server, &brief, lang, json),
        Commands::Chat { message, thread } => do_chat(&server, message, thread),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("campaign-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
