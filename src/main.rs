use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};

use discharge_agent::agent::{AgentInput, AgentOrchestrator};
use discharge_agent::config::{AgentConfig, RemoteConfig, SmtpConfig};
use discharge_agent::email::SmtpDispatcher;
use discharge_agent::llm::create_provider;
use discharge_agent::summary::SummaryGenerator;

const USAGE: &str = "\
Usage:
  discharge-agent summarize <notes-file>
  discharge-agent ask <command> [--summary-ko <file>] [--summary-en <file>] [--session <id>]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((mode, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let remote = RemoteConfig::from_env()?;
    let llm = create_provider(&remote)?;

    eprintln!("🏥 Discharge Agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Model server: {}",
        remote.base_url.as_deref().unwrap_or("(not configured)")
    );

    match mode.as_str() {
        "summarize" => {
            let [notes_path] = rest else {
                bail!("summarize takes exactly one notes file\n{USAGE}");
            };
            let notes = read_text(Path::new(notes_path))?;
            let summary = SummaryGenerator::new(llm).generate(&notes).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "ask" => {
            let input = parse_ask(rest)?;
            let config = AgentConfig::from_env()?;
            let smtp = SmtpConfig::from_env()?;
            eprintln!("   Output: {}", config.output_dir().display());
            eprintln!(
                "   Email: {}",
                if smtp.has_credentials() {
                    "enabled"
                } else {
                    "disabled (SMTP_USER / SMTP_PASSWORD not set)"
                }
            );

            let agent = AgentOrchestrator::new(llm, Arc::new(SmtpDispatcher::new(smtp)), config);
            let result = agent.run(input).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        other => bail!("unknown mode '{other}'\n{USAGE}"),
    }

    Ok(())
}

fn parse_ask(args: &[String]) -> anyhow::Result<AgentInput> {
    let mut command: Option<String> = None;
    let mut input = AgentInput::default();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--summary-ko" | "--summary-en" | "--session" => {
                let value = iter
                    .next()
                    .with_context(|| format!("{arg} needs a value"))?;
                match arg.as_str() {
                    "--summary-ko" => input.summary_ko = read_text(Path::new(value))?,
                    "--summary-en" => input.summary_en = read_text(Path::new(value))?,
                    _ => input.session_id = Some(value.clone()),
                }
            }
            flag if flag.starts_with("--") => bail!("unknown option '{flag}'\n{USAGE}"),
            text => {
                if command.replace(text.to_string()).is_some() {
                    bail!("ask takes a single command argument\n{USAGE}");
                }
            }
        }
    }

    input.command = command.with_context(|| format!("missing command\n{USAGE}"))?;
    Ok(input)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
