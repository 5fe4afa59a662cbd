use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use callback_proxy::protocol::{X_REPLY_ID, X_REPLY_STATUS};

#[derive(Parser)]
#[command(name = "callback-cli")]
#[command(about = "Operator CLI for the callback proxy", long_about = None)]
struct Cli {
    /// Admin API base URL.
    #[arg(short, long, default_value = "http://127.0.0.1:1081")]
    url: String,

    /// Admin API key.
    #[arg(short, long, default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status
    Status,
    /// Show pending reply ids and delivery counters
    Pending,
    /// Send a completion call for a deferred exchange
    Complete {
        /// Proxy URL to post the completion to
        #[arg(long, default_value = "http://127.0.0.1:1080")]
        proxy: String,
        /// Reply id to complete
        #[arg(long)]
        id: String,
        /// Reply-id header the proxy is configured with
        #[arg(long, default_value = X_REPLY_ID)]
        reply_header: String,
        /// Status code the waiting client receives
        #[arg(long, default_value_t = 200)]
        status: u16,
        /// Response body
        #[arg(long, default_value = "")]
        body: String,
        /// Extra response header, `name:value`
        #[arg(long = "header")]
        headers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut admin_headers = HeaderMap::new();
    admin_headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    match cli.command {
        Commands::Status => {
            let res = client
                .get(format!("{}/admin/status", cli.url))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Pending => {
            let res = client
                .get(format!("{}/admin/pending", cli.url))
                .headers(admin_headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Complete {
            proxy,
            id,
            reply_header,
            status,
            body,
            headers,
        } => {
            let completion = completion_call_headers(&reply_header, &id, status, &headers)?;
            let res = client.post(&proxy).headers(completion).body(body).send().await?;
            if res.status().is_success() {
                println!("Completion for {} acknowledged", id);
            } else {
                eprintln!("Error: proxy returned status {}", res.status());
            }
        }
    }

    Ok(())
}

/// Headers of a completion call for `id`, plus any extra `name:value` pairs.
fn completion_call_headers(
    reply_header: &str,
    id: &str,
    status: u16,
    extra: &[String],
) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut completion = HeaderMap::new();
    completion.insert(
        HeaderName::from_bytes(reply_header.as_bytes())?,
        HeaderValue::from_str(id)?,
    );
    completion.insert(X_REPLY_STATUS, HeaderValue::from(status));
    for raw in extra {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header {:?} is not name:value", raw))?;
        completion.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(completion)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_defaults_to_standard_reply_header() {
        let cli = Cli::try_parse_from(["callback-cli", "complete", "--id", "A1"]).unwrap();
        let Commands::Complete { reply_header, .. } = cli.command else {
            panic!("expected complete");
        };
        assert_eq!(reply_header, X_REPLY_ID);
    }

    #[test]
    fn completion_uses_configured_reply_header() {
        let cli = Cli::try_parse_from([
            "callback-cli",
            "complete",
            "--id",
            "ALT",
            "--reply-header",
            "X-R-Reply",
            "--status",
            "201",
            "--header",
            "x-result: done",
        ])
        .unwrap();
        let Commands::Complete {
            id,
            reply_header,
            status,
            headers,
            ..
        } = cli.command
        else {
            panic!("expected complete");
        };

        let built = completion_call_headers(&reply_header, &id, status, &headers).unwrap();
        assert_eq!(built["x-r-reply"], "ALT");
        assert!(built.get(X_REPLY_ID).is_none());
        assert_eq!(built[X_REPLY_STATUS], "201");
        assert_eq!(built["x-result"], "done");
    }

    #[test]
    fn malformed_extra_header_is_rejected() {
        let extra = vec!["no-colon".to_string()];
        assert!(completion_call_headers(X_REPLY_ID, "A1", 200, &extra).is_err());
    }
}
