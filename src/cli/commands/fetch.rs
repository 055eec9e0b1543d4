//! Fetch command - answer a request the way the worker would

use super::open_worker;
use crate::cache::{Method, Request};
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{ShellCacheError, ShellCacheResult};
use console::style;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShellCacheResult<()> {
    let method: Method = args.method.parse().map_err(ShellCacheError::User)?;
    let request = args.headers.into_iter().fold(
        resolve_target(&args.target, &config.app.origin)?.with_method(method),
        |request, (name, value)| request.with_header(name, value),
    );
    let (manager, _) = open_worker(config).await?;

    let served = manager.respond_to_fetch(&request).await?;
    let summary = format!(
        "{} {} {} ({} bytes, {})",
        request.method,
        request.url,
        served.response.status,
        served.response.body.len(),
        served.source
    );

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, &served.response.body)
                .await
                .map_err(|e| ShellCacheError::io(format!("writing {}", path.display()), e))?;
            println!("{} {}", style("[OK]").green(), summary);
            println!("  saved to {}", path.display());
        }
        None => {
            // Body goes to stdout untouched so it can be piped
            eprintln!("{}", style(summary).dim());
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&served.response.body)
                .await
                .map_err(|e| ShellCacheError::io("writing response body", e))?;
            stdout
                .flush()
                .await
                .map_err(|e| ShellCacheError::io("writing response body", e))?;
        }
    }

    Ok(())
}

/// Absolute URLs are taken as-is; anything else is a path on the app origin
fn resolve_target(target: &str, origin: &str) -> ShellCacheResult<Request> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Request::parse(target);
    }

    let origin = Url::parse(origin).map_err(|e| ShellCacheError::InvalidUrl {
        url: origin.to_string(),
        reason: e.to_string(),
    })?;
    Request::for_path(&origin, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_absolute_url() {
        let req = resolve_target("https://example.com/app/", "http://localhost:5173").unwrap();
        assert_eq!(req.url.as_str(), "https://example.com/app/");
    }

    #[test]
    fn resolve_path_against_origin() {
        let req = resolve_target("/shekhawats-pwa/manifest.json", "http://localhost:5173").unwrap();
        assert_eq!(
            req.url.as_str(),
            "http://localhost:5173/shekhawats-pwa/manifest.json"
        );
    }

    #[test]
    fn resolve_rejects_bad_origin() {
        assert!(matches!(
            resolve_target("/index.html", "localhost"),
            Err(ShellCacheError::InvalidUrl { .. })
        ));
    }
}
