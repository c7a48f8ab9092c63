use std::process::ExitCode;

use aso_crawler::crawler::ChromeStoreSource;
use aso_crawler::{AnalyzeError, Analyzer, AnalyzerConfig};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

/// App-store competitor and keyword research.
#[derive(Parser, Debug)]
#[command(name = "aso-crawler", version, about, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the top competitors for a keyword and score related keywords
    Analyze {
        /// Search keyword
        keyword: String,
        /// Store country code (defaults to ASO_DEFAULT_COUNTRY)
        country: Option<String>,
        /// Number of competitors to inspect, clamped to ASO_MAX_LIMIT
        limit: Option<usize>,
    },
    /// Fetch store autocomplete suggestions for a query
    Suggest {
        /// Partial query
        query: String,
    },
}

fn report(err: &AnalyzeError) -> ExitCode {
    tracing::error!(kind = err.kind().as_str(), detail = err.detail(), "request failed");
    match serde_json::to_string_pretty(&err.to_body()) {
        Ok(body) => eprintln!("{}", body),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::fmt::init();

    let config = AnalyzerConfig::from_env();
    let source = ChromeStoreSource::new(config.store.clone())?;
    let analyzer = Analyzer::new(source, config);

    match cli.command {
        Command::Analyze {
            keyword,
            country,
            limit,
        } => {
            let limit = analyzer.config().effective_limit(limit);
            let country = country.unwrap_or_default();
            match analyzer.analyze(&keyword, &country, limit).await {
                Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
                Err(e) => return Ok(report(&e)),
            }
        }
        Command::Suggest { query } => match analyzer.suggest(&query).await {
            Ok(suggestions) => println!("{}", serde_json::to_string_pretty(&suggestions)?),
            Err(e) => return Ok(report(&e)),
        },
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_takes_optional_country_and_limit() {
        let cli = Cli::try_parse_from(["aso-crawler", "analyze", "notes", "de", "5"]).unwrap();
        match cli.command {
            Command::Analyze {
                keyword,
                country,
                limit,
            } => {
                assert_eq!(keyword, "notes");
                assert_eq!(country.as_deref(), Some("de"));
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["aso-crawler", "analyze", "notes"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Analyze {
                country: None,
                limit: None,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_limit_is_rejected() {
        assert!(Cli::try_parse_from(["aso-crawler", "analyze", "notes", "us", "abc"]).is_err());
    }

    #[test]
    fn suggest_requires_query() {
        assert!(Cli::try_parse_from(["aso-crawler", "suggest"]).is_err());
        let cli = Cli::try_parse_from(["aso-crawler", "suggest", "hab"]).unwrap();
        assert!(matches!(cli.command, Command::Suggest { ref query } if query == "hab"));
    }

    #[test]
    fn missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["aso-crawler"]).is_err());
        assert!(Cli::try_parse_from(["aso-crawler", "rank", "notes"]).is_err());
    }
}
