//! Remote routing-file retrieval.
//!
//! An `http(s)://` input is downloaded to a local file before ingestion.
//! Google Drive share links are rewritten to their direct-download form
//! first. A download that is empty, or that turns out to be an HTML page
//! (Drive serves one for private files and quota errors), is rejected
//! rather than handed to the ingestor.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use routecycle_core::config::FetchConfig;
use routecycle_core::error::ErrorCode;
use tempfile::TempPath;
use tracing::{debug, info, instrument};

const DRIVE_HOST: &str = "drive.google.com";

/// How many leading bytes are inspected for an HTML marker.
const SNIFF_LEN: usize = 512;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to write download to {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("downloaded file {} is empty", path.display())]
    Empty { path: PathBuf },

    #[error("downloaded file {} is an HTML page, not routing data", path.display())]
    HtmlPage { path: PathBuf },
}

impl FetchError {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Request { .. } | Self::Status { .. } | Self::Io { .. } => ErrorCode::FetchFailed,
            Self::Empty { .. } => ErrorCode::FetchEmpty,
            Self::HtmlPage { .. } => ErrorCode::FetchHtmlPage,
        }
    }
}

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// True when `input` should be downloaded instead of opened.
pub fn is_remote(input: &str) -> bool {
    let lower = input.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Extract the file id from a Google Drive share link.
///
/// Recognizes `/file/d/<id>/...` and `/open?id=<id>` links.
fn drive_file_id(url: &str) -> Option<&str> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?
        .strip_prefix(DRIVE_HOST)?;

    if let Some(after) = rest.strip_prefix("/file/d/") {
        let id = after.split(['/', '?', '#']).next()?;
        return (!id.is_empty()).then_some(id);
    }

    if let Some(query) = rest.strip_prefix("/open?") {
        return query
            .split('&')
            .find_map(|pair| pair.strip_prefix("id="))
            .filter(|id| !id.is_empty());
    }

    None
}

/// Rewrite a Google Drive share link to its direct-download endpoint.
///
/// Any other URL is returned unchanged.
pub fn rewrite_share_url(url: &str) -> Cow<'_, str> {
    match drive_file_id(url) {
        Some(id) => Cow::Owned(format!(
            "https://{DRIVE_HOST}/uc?export=download&id={id}"
        )),
        None => Cow::Borrowed(url),
    }
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// Stderr progress line, redrawn only when the shown value changes.
struct Progress {
    enabled: bool,
    total: Option<u64>,
    last_shown: Option<u64>,
}

impl Progress {
    const fn new(enabled: bool, total: Option<u64>) -> Self {
        Self {
            enabled,
            total,
            last_shown: None,
        }
    }

    fn update(&mut self, done: u64) {
        if !self.enabled {
            return;
        }
        match self.total.filter(|&t| t > 0) {
            Some(total) => {
                let percent = done.saturating_mul(100) / total;
                if self.last_shown != Some(percent) {
                    self.last_shown = Some(percent);
                    eprint!("\rdownloading: {percent:>3}% ({done}/{total} bytes)");
                }
            }
            None => {
                let kib = done / 1024;
                if self.last_shown != Some(kib) {
                    self.last_shown = Some(kib);
                    eprint!("\rdownloading: {done} bytes");
                }
            }
        }
    }

    fn finish(&self) {
        if self.enabled && self.last_shown.is_some() {
            eprintln!();
        }
    }
}

/// Copy `reader` to `writer` in `chunk_size` pieces, reporting each chunk.
fn copy_chunked<R: Read, W: Write>(
    mut reader: R,
    mut writer: W,
    chunk_size: usize,
    mut on_chunk: impl FnMut(u64),
) -> io::Result<u64> {
    let mut buf = vec![0_u8; chunk_size.max(1)];
    let mut copied = 0_u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        writer.write_all(&buf[..n])?;
        copied += n as u64;
        on_chunk(copied);
    }

    writer.flush()?;
    Ok(copied)
}

/// Download `url` into `dest`, returning the byte count.
///
/// # Errors
///
/// Returns [`FetchError`] on transport failure, a non-success status, or a
/// local write failure.
#[instrument(skip(config), fields(dest = %dest.display()))]
pub fn download(url: &str, dest: &Path, config: &FetchConfig) -> Result<u64, FetchError> {
    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("routecycle/", env!("CARGO_PKG_VERSION")))
        .build();

    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(status, _) => FetchError::Status {
            url: url.to_string(),
            status,
        },
        other => FetchError::Request {
            url: url.to_string(),
            source: Box::new(other),
        },
    })?;

    let total = response
        .header("Content-Length")
        .and_then(|v| v.trim().parse::<u64>().ok());
    debug!(?total, "download started");

    let io_err = |source| FetchError::Io {
        path: dest.to_path_buf(),
        source,
    };
    let file = File::create(dest).map_err(io_err)?;

    let mut progress = Progress::new(config.progress, total);
    let copied = copy_chunked(
        response.into_reader(),
        BufWriter::new(file),
        config.chunk_size,
        |done| progress.update(done),
    );
    progress.finish();
    let copied = copied.map_err(io_err)?;

    info!(bytes = copied, "download complete");
    Ok(copied)
}

/// Reject empty downloads and HTML pages posing as routing data.
///
/// # Errors
///
/// Returns [`FetchError::Empty`], [`FetchError::HtmlPage`], or
/// [`FetchError::Io`] if the file cannot be read.
pub fn validate_download(path: &Path) -> Result<(), FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .map_err(io_err)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(io_err)?;

    if head.is_empty() {
        return Err(FetchError::Empty {
            path: path.to_path_buf(),
        });
    }
    if looks_like_html(&head) {
        return Err(FetchError::HtmlPage {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn looks_like_html(head: &[u8]) -> bool {
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    let head = head[start..].to_ascii_lowercase();
    head.starts_with(b"<!doctype html") || head.starts_with(b"<html")
}

// ---------------------------------------------------------------------------
// Input resolution
// ---------------------------------------------------------------------------

/// A local file ready for ingestion.
///
/// Temporary downloads are deleted when this is dropped.
#[derive(Debug)]
pub struct InputSource {
    path: PathBuf,
    _temp: Option<TempPath>,
}

impl InputSource {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Turn the CLI input into a local path, downloading remote inputs.
///
/// Remote inputs land in `keep` when given, otherwise in a temporary file.
///
/// # Errors
///
/// Returns [`FetchError`] if the download or its validation fails.
pub fn resolve_input(
    input: &str,
    keep: Option<&Path>,
    config: &FetchConfig,
) -> Result<InputSource, FetchError> {
    if !is_remote(input) {
        return Ok(InputSource {
            path: PathBuf::from(input),
            _temp: None,
        });
    }

    let url = rewrite_share_url(input.trim());
    if url != input.trim() {
        debug!(%url, "rewrote share link to direct download");
    }

    let (path, temp) = if let Some(keep) = keep {
        (keep.to_path_buf(), None)
    } else {
        let temp = tempfile::Builder::new()
            .prefix("routecycle-")
            .suffix(".psv")
            .tempfile()
            .map_err(|source| FetchError::Io {
                path: std::env::temp_dir(),
                source,
            })?
            .into_temp_path();
        (temp.to_path_buf(), Some(temp))
    };

    download(&url, &path, config)?;
    validate_download(&path)?;

    Ok(InputSource { path, _temp: temp })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Cursor};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one HTTP response on a loopback port.
    fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut line = String::new();
            while reader.read_line(&mut line).is_ok_and(|n| n > 0) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let head = format!(
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(body);
        });
        format!("http://{addr}/routes.psv")
    }

    fn quiet() -> FetchConfig {
        FetchConfig {
            progress: false,
            ..FetchConfig::default()
        }
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://example.com/routes.psv"));
        assert!(is_remote("HTTP://example.com/routes.psv"));
        assert!(!is_remote("routes.psv"));
        assert!(!is_remote("/tmp/http/routes.psv"));
    }

    #[test]
    fn drive_file_links_are_rewritten() {
        assert_eq!(
            rewrite_share_url("https://drive.google.com/file/d/1AbC_x-9/view?usp=sharing"),
            "https://drive.google.com/uc?export=download&id=1AbC_x-9"
        );
        assert_eq!(
            rewrite_share_url("https://drive.google.com/file/d/XYZ"),
            "https://drive.google.com/uc?export=download&id=XYZ"
        );
    }

    #[test]
    fn drive_open_links_are_rewritten() {
        assert_eq!(
            rewrite_share_url("https://drive.google.com/open?usp=x&id=QQ7"),
            "https://drive.google.com/uc?export=download&id=QQ7"
        );
    }

    #[test]
    fn other_urls_are_untouched() {
        for url in [
            "https://example.com/file/d/abc/view",
            "https://drive.google.com/uc?export=download&id=abc",
            "https://drive.google.com/file/d/",
        ] {
            assert!(matches!(rewrite_share_url(url), Cow::Borrowed(u) if u == url));
        }
    }

    #[test]
    fn html_detection() {
        assert!(looks_like_html(b"<!DOCTYPE html><html>"));
        assert!(looks_like_html(b"\n  <html lang=\"en\">"));
        assert!(looks_like_html(b"\xEF\xBB\xBF<!doctype HTML>"));
        assert!(!looks_like_html(b"A|B|C1|S1\n"));
        assert!(!looks_like_html(b"<b>|x|C1|S1\n"));
    }

    #[test]
    fn validate_rejects_empty_and_html_files() {
        let dir = tempfile::tempdir().expect("temp dir");

        let empty = dir.path().join("empty.psv");
        std::fs::write(&empty, b"").expect("write");
        assert!(matches!(
            validate_download(&empty),
            Err(FetchError::Empty { .. })
        ));

        let html = dir.path().join("page.psv");
        std::fs::write(&html, b"<!DOCTYPE html>\n<title>Sign in</title>").expect("write");
        let err = validate_download(&html).expect_err("html must fail");
        assert_eq!(err.code(), ErrorCode::FetchHtmlPage);

        let data = dir.path().join("data.psv");
        std::fs::write(&data, b"A|B|C1|S1\n").expect("write");
        assert!(validate_download(&data).is_ok());
    }

    #[test]
    fn chunked_copy_reports_running_totals() {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        let copied = copy_chunked(Cursor::new(vec![7_u8; 10]), &mut out, 4, |n| seen.push(n))
            .expect("copy");

        assert_eq!(copied, 10);
        assert_eq!(out.len(), 10);
        assert_eq!(seen, vec![4, 8, 10]);
    }

    #[test]
    fn local_input_is_passed_through() {
        let source = resolve_input("routes.psv", None, &quiet()).expect("resolve");
        assert_eq!(source.path(), Path::new("routes.psv"));
    }

    #[test]
    fn downloads_into_kept_file() {
        let url = serve_once("200 OK", b"A|B|C1|S1\nB|A|C1|S1\n");
        let dir = tempfile::tempdir().expect("temp dir");
        let keep = dir.path().join("kept.psv");

        let source = resolve_input(&url, Some(&keep), &quiet()).expect("download");

        assert_eq!(source.path(), keep.as_path());
        assert_eq!(
            std::fs::read_to_string(&keep).expect("read"),
            "A|B|C1|S1\nB|A|C1|S1\n"
        );
    }

    #[test]
    fn temporary_download_is_removed_on_drop() {
        let url = serve_once("200 OK", b"A|A|C1|S1\n");
        let source = resolve_input(&url, None, &quiet()).expect("download");
        let path = source.path().to_path_buf();
        assert!(path.exists());
        drop(source);
        assert!(!path.exists());
    }

    #[test]
    fn http_error_status_is_reported() {
        let url = serve_once("404 Not Found", b"missing");
        let err = resolve_input(&url, None, &quiet()).expect_err("must fail");
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(err.code(), ErrorCode::FetchFailed);
    }

    #[test]
    fn html_body_is_rejected() {
        let url = serve_once("200 OK", b"<html><body>quota exceeded</body></html>");
        let err = resolve_input(&url, None, &quiet()).expect_err("must fail");
        assert!(matches!(err, FetchError::HtmlPage { .. }));
    }
}
