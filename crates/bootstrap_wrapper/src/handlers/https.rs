use std::time::Duration;

use reqwest::blocking::Client;

/// Endpoint fetched by `HttpsWorksAsync`.
pub const HTTPS_CHECK_URL: &str = "https://aws.amazon.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound HTTPS GET returning the final status code.
pub trait HttpsClient: Send + Sync + 'static {
    fn get_status(&self, url: &str) -> Result<u16, String>;
}

/// Blocking `reqwest` client with rustls roots.
///
/// Each request runs on its own scoped thread so the blocking client never
/// lives inside the invocation's async context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestHttps;

impl HttpsClient for ReqwestHttps {
    fn get_status(&self, url: &str) -> Result<u16, String> {
        std::thread::scope(|scope| {
            scope
                .spawn(|| -> Result<u16, String> {
                    let client = Client::builder()
                        .timeout(REQUEST_TIMEOUT)
                        .build()
                        .map_err(|err| format!("failed to build HTTPS client: {err}"))?;
                    let response = client.get(url).send().map_err(|err| err.to_string())?;
                    Ok(response.status().as_u16())
                })
                .join()
                .unwrap_or_else(|_| Err("HTTPS request thread panicked".to_string()))
        })
    }
}

/// Maps an HTTPS outcome to the handler body, `SUCCESS` for 2xx and 3xx.
pub fn check_https(client: &dyn HttpsClient, url: &str) -> Result<(), String> {
    let status = client
        .get_status(url)
        .map_err(|err| format!("HTTPS request to {url} failed: {err}"))?;
    if (200..400).contains(&status) {
        Ok(())
    } else {
        Err(format!("HTTPS request to {url} returned status {status}"))
    }
}
