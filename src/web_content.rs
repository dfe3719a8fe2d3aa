use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{ensure, Result};
use futures::future::BoxFuture;
use reqwest::{
    header::{HeaderMap, RETRY_AFTER, USER_AGENT},
    Client, StatusCode,
};
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::WebContentConfig, domain::FetchedPage};

pub const HTTP_ERROR: &str = "_HTTP_ERROR_";

const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Prefer the local page cache, going to the network only on a miss.
    Offline,
    Online,
}

/// Anything that can hand the cascade a page's HTML. Failures come back as
/// `FetchedPage::failed` with an `HTTP_ERROR` diagnostic, never as errors.
pub trait HtmlSource: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str, mode: FetchMode) -> BoxFuture<'a, FetchedPage>;
}

pub struct WebPageFetcher {
    client: Client,
    config: WebContentConfig,
    pages_dir: PathBuf,
}

impl WebPageFetcher {
    pub fn new(client: Client, config: WebContentConfig, pages_dir: PathBuf) -> Result<Self> {
        ensure!(
            !config.user_agents.is_empty(),
            "at least one user agent must be configured for page fetching"
        );
        Ok(Self {
            client,
            config,
            pages_dir,
        })
    }

    pub fn cache_path(&self, raw_url: &str) -> PathBuf {
        self.pages_dir
            .join(cache_file_name(raw_url, self.config.cache_name_length))
    }

    async fn get_html(&self, raw_url: &str, mode: FetchMode) -> FetchedPage {
        let cache_path = self.cache_path(raw_url);
        let url = expand_url(raw_url);

        if mode == FetchMode::Offline {
            match tokio::fs::read(&cache_path).await {
                Ok(bytes) => {
                    debug!(target: "fetch", path = %cache_path.display(), "page cache hit");
                    let html = String::from_utf8_lossy(&bytes).into_owned();
                    let ok = !html.starts_with(HTTP_ERROR);
                    return FetchedPage { content: html, ok };
                }
                Err(_) => {
                    info!(
                        target: "fetch",
                        path = %cache_path.display(),
                        "page not cached; trying live URL"
                    );
                }
            }
        }

        let mut page = self.read_url(&url).await;
        if !page.ok {
            let bleached = bleach_url(&url);
            if bleached != url {
                info!(target: "fetch", url = %url, retry = %bleached, "retrying without query crud");
                page = self.read_url(bleached).await;
            }
        }
        if page.ok {
            if let Err(err) = store_html(&cache_path, &page.content).await {
                warn!(
                    target: "fetch",
                    error = %err,
                    path = %cache_path.display(),
                    "failed to cache page"
                );
            }
        }
        page
    }

    async fn read_url(&self, raw_url: &str) -> FetchedPage {
        let url = match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                warn!(target: "fetch", url = %raw_url, "refusing to fetch invalid URL");
                return FetchedPage::failed(format!("{HTTP_ERROR}: invalid URL {raw_url}"));
            }
        };

        let attempts = self.config.user_agents.len();
        let mut last_failure = None;
        for (attempt, agent) in self.config.user_agents.iter().enumerate() {
            let response = match self
                .client
                .get(url.clone())
                .header(USER_AGENT, agent.as_str())
                .timeout(self.config.fetch_timeout)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    info!(target: "fetch", error = %err, url = %url, "connection error");
                    last_failure = Some(format!("connection error: {err}"));
                    break;
                }
            };

            let status = response.status();
            if status == StatusCode::OK {
                match response.text().await {
                    Ok(body) => return FetchedPage::ok(body.to_lowercase()),
                    Err(err) => {
                        last_failure = Some(format!("unreadable body: {err}"));
                        break;
                    }
                }
            }

            let requested = if status == StatusCode::TOO_MANY_REQUESTS {
                retry_after(response.headers()).unwrap_or(DEFAULT_RETRY_WAIT)
            } else {
                DEFAULT_RETRY_WAIT
            };
            let wait = requested.min(self.config.max_retry_wait);
            let body = response.text().await.unwrap_or_default();
            last_failure = Some(format!("{}: {}", status.as_u16(), body.to_lowercase()));

            if attempt + 1 < attempts {
                let agent_prefix: String = agent.chars().take(20).collect();
                warn!(
                    target: "fetch",
                    url = %url,
                    status = status.as_u16(),
                    agent = %agent_prefix,
                    wait_ms = wait.as_millis() as u64,
                    "agent failed; retrying"
                );
                sleep(wait).await;
            }
        }

        let detail = last_failure.unwrap_or_else(|| "connection error: no response".to_string());
        let detail_prefix: String = detail.chars().take(200).collect();
        warn!(
            target: "fetch",
            url = %url,
            detail = %detail_prefix,
            "page fetch failed"
        );
        FetchedPage::failed(format!("{HTTP_ERROR}: {detail}"))
    }
}

impl HtmlSource for WebPageFetcher {
    fn fetch<'a>(&'a self, url: &'a str, mode: FetchMode) -> BoxFuture<'a, FetchedPage> {
        Box::pin(self.get_html(url, mode))
    }
}

async fn store_html(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, html).await
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

pub fn expand_url(url: &str) -> String {
    if url.starts_with("http") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Cache file name for a URL: scheme dropped, clipped to `length` chars,
/// slashes replaced by `|`.
pub fn cache_file_name(url: &str, length: usize) -> String {
    let stripped = match (url.starts_with("http"), url.find("//")) {
        (true, Some(index)) => &url[index + 2..],
        _ => url,
    };
    let clipped: String = stripped.chars().take(length).collect();
    format!("{}.html", clipped.replace('/', "|"))
}

/// Drops trailing query crud (`?...` or `&...`) from a URL that fails to
/// load as given.
pub fn bleach_url(url: &str) -> &str {
    match [url.find('&'), url.find('?')]
        .into_iter()
        .flatten()
        .filter(|index| *index > 0)
        .min()
    {
        Some(index) => &url[..index],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        time::{timeout, Instant},
    };

    use super::*;

    #[derive(Debug, Clone)]
    struct SeenRequest {
        target: String,
        agent: String,
    }

    /// Local HTTP/1.1 server answering with `replies` in order and repeating
    /// the last one. An empty reply hangs up without answering.
    struct CannedServer {
        base: String,
        seen: Arc<Mutex<Vec<SeenRequest>>>,
    }

    impl CannedServer {
        async fn start(replies: Vec<String>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let seen = Arc::new(Mutex::new(Vec::new()));
            let log = seen.clone();
            tokio::spawn(async move {
                let mut served = 0;
                while let Ok((mut stream, _)) = listener.accept().await {
                    let head = read_head(&mut stream).await;
                    log.lock().push(parse_head(&head));
                    let reply = &replies[served.min(replies.len() - 1)];
                    served += 1;
                    if !reply.is_empty() {
                        let _ = stream.write_all(reply.as_bytes()).await;
                    }
                    let _ = stream.shutdown().await;
                }
            });
            Self { base, seen }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        fn targets(&self) -> Vec<String> {
            self.seen.lock().iter().map(|r| r.target.clone()).collect()
        }

        fn agents(&self) -> Vec<String> {
            self.seen.lock().iter().map(|r| r.agent.clone()).collect()
        }
    }

    async fn read_head(stream: &mut TcpStream) -> String {
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => head.extend_from_slice(&chunk[..n]),
            }
        }
        String::from_utf8_lossy(&head).into_owned()
    }

    fn parse_head(head: &str) -> SeenRequest {
        let target = head.split_whitespace().nth(1).unwrap_or_default().to_string();
        let agent = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("user-agent")
                    .then(|| value.trim().to_string())
            })
            .unwrap_or_default();
        SeenRequest { target, agent }
    }

    fn reply(status: &str, headers: &[&str], body: &str) -> String {
        let mut out = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for header in headers {
            out.push_str(header);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.push_str(body);
        out
    }

    fn live_fetcher(dir: &Path, agents: &[&str], max_retry_wait: Duration) -> WebPageFetcher {
        let config = WebContentConfig {
            fetch_timeout: Duration::from_secs(2),
            user_agents: agents.iter().map(|a| a.to_string()).collect(),
            max_retry_wait,
            cache_name_length: 25,
        };
        let client = Client::builder().no_proxy().build().unwrap();
        WebPageFetcher::new(client, config, dir.to_path_buf()).unwrap()
    }

    fn test_config() -> WebContentConfig {
        WebContentConfig {
            fetch_timeout: Duration::from_millis(500),
            user_agents: vec!["test-agent".to_string()],
            max_retry_wait: Duration::from_millis(10),
            cache_name_length: 25,
        }
    }

    #[test]
    fn bleach_strips_query_crud() {
        assert_eq!(
            bleach_url("government.ru/news/2666/&sa=U&ved=0ahUKEwjbnY"),
            "government.ru/news/2666/"
        );
        assert_eq!(
            bleach_url("http://www.adsisland.com/?view=selectcity&targetview=post"),
            "http://www.adsisland.com/"
        );
        assert_eq!(bleach_url("http://www.adsisland.com/"), "http://www.adsisland.com/");
        assert_eq!(bleach_url(""), "");
    }

    #[test]
    fn expand_adds_missing_scheme() {
        assert_eq!(expand_url("example.com/a"), "http://example.com/a");
        assert_eq!(expand_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn cache_names_are_flat_and_clipped() {
        assert_eq!(
            cache_file_name("http://example.com/forum/thread/12345", 25),
            "example.com|forum|thread|.html"
        );
        assert_eq!(cache_file_name("example.com/a", 25), "example.com|a.html");
    }

    #[tokio::test]
    async fn offline_mode_reads_cached_page() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher =
            WebPageFetcher::new(Client::new(), test_config(), dir.path().to_path_buf()).unwrap();
        let url = "http://cached.example.com/page";
        std::fs::write(fetcher.cache_path(url), "<html>cached</html>").unwrap();

        let page = fetcher.fetch(url, FetchMode::Offline).await;
        assert_eq!(page, FetchedPage::ok("<html>cached</html>"));
    }

    #[tokio::test]
    async fn cached_error_pages_stay_failed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher =
            WebPageFetcher::new(Client::new(), test_config(), dir.path().to_path_buf()).unwrap();
        let url = "http://broken.example.com/";
        std::fs::write(fetcher.cache_path(url), format!("{HTTP_ERROR}: 503")).unwrap();

        let page = fetcher.fetch(url, FetchMode::Offline).await;
        assert!(!page.ok);
    }

    #[tokio::test]
    async fn invalid_urls_return_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher =
            WebPageFetcher::new(Client::new(), test_config(), dir.path().to_path_buf()).unwrap();

        let page = fetcher.fetch("not a url", FetchMode::Online).await;
        assert!(!page.ok);
        assert!(page.content.starts_with(HTTP_ERROR));
        assert!(!fetcher.cache_path("not a url").exists());
    }

    #[tokio::test]
    async fn rate_limited_agent_is_rotated_and_success_cached() {
        let server = CannedServer::start(vec![
            reply("429 Too Many Requests", &["Retry-After: 3600"], "slow down"),
            reply("200 OK", &[], "<P>Hello</P>"),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = live_fetcher(dir.path(), &["agent-one", "agent-two"], Duration::from_millis(10));
        let url = server.url("/page");

        let page = timeout(Duration::from_secs(5), fetcher.fetch(&url, FetchMode::Offline))
            .await
            .unwrap();
        assert_eq!(page, FetchedPage::ok("<p>hello</p>"));
        assert_eq!(server.agents(), vec!["agent-one", "agent-two"]);
        assert_eq!(
            std::fs::read_to_string(fetcher.cache_path(&url)).unwrap(),
            "<p>hello</p>"
        );

        let again = fetcher.fetch(&url, FetchMode::Offline).await;
        assert_eq!(again, page);
        assert_eq!(server.targets().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_agents_return_sentinel_and_skip_cache() {
        let server =
            CannedServer::start(vec![reply("500 Internal Server Error", &[], "Boom")]).await;
        let dir = tempfile::tempdir().unwrap();
        let wait = Duration::from_millis(300);
        let fetcher = live_fetcher(dir.path(), &["agent-one", "agent-two"], wait);
        let url = server.url("/page");

        let started = Instant::now();
        let page = fetcher.fetch(&url, FetchMode::Online).await;
        let elapsed = started.elapsed();

        assert!(!page.ok);
        assert!(page.content.starts_with(HTTP_ERROR));
        assert!(page.content.contains("500: boom"), "{}", page.content);
        assert_eq!(server.targets().len(), 2);
        assert!(elapsed >= wait, "waited {elapsed:?}");
        assert!(elapsed < wait * 2, "waited {elapsed:?}");
        assert!(!fetcher.cache_path(&url).exists());
    }

    #[tokio::test]
    async fn failing_query_url_is_retried_bleached() {
        let server = CannedServer::start(vec![
            reply("404 Not Found", &[], "gone"),
            reply("200 OK", &[], "<p>List</p>"),
        ])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = live_fetcher(dir.path(), &["solo"], Duration::from_millis(10));
        let url = server.url("/list?view=city&page=2");

        let page = fetcher.fetch(&url, FetchMode::Online).await;
        assert_eq!(page, FetchedPage::ok("<p>list</p>"));
        assert_eq!(server.targets(), vec!["/list?view=city&page=2", "/list"]);
        assert!(fetcher.cache_path(&url).exists());
    }

    #[tokio::test]
    async fn transport_error_stops_agent_rotation() {
        let server = CannedServer::start(vec![String::new()]).await;
        let dir = tempfile::tempdir().unwrap();
        let fetcher = live_fetcher(
            dir.path(),
            &["agent-one", "agent-two", "agent-three"],
            Duration::from_millis(10),
        );
        let url = server.url("/page");

        let page = fetcher.fetch(&url, FetchMode::Online).await;
        assert!(!page.ok);
        assert!(page.content.contains("connection error"), "{}", page.content);
        assert_eq!(server.targets().len(), 1);
        assert!(!fetcher.cache_path(&url).exists());
    }

    #[test]
    fn rejects_empty_agent_list() {
        let mut config = test_config();
        config.user_agents.clear();
        assert!(WebPageFetcher::new(Client::new(), config, PathBuf::from("pages")).is_err());
    }
}
