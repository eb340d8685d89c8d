//! Artifact download with atomic placement
//!
//! Streams the response body to a hidden temp file in the destination
//! directory, then renames into place. The final path either holds a
//! complete artifact or nothing; an interrupted transfer never leaves a
//! half-written binary where the launcher would find it.

use crate::error::{Error, Result};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Download `url` to `dest`, optionally marking the result executable
///
/// Transport and local write failures both surface as download errors.
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    executable: bool,
) -> Result<()> {
    let response = client.get(url).send().await.map_err(|e| {
        Error::download(url, format!("request failed: {e}"), !e.is_builder())
    })?;

    let status = response.status();
    if !status.is_success() {
        let retryable = status.is_server_error() || status.as_u16() == 429;
        return Err(Error::download(
            url,
            format!("server returned {status}"),
            retryable,
        ));
    }

    let temp_path = part_path(dest);
    // Remove the temp file on any failure exit; defused once the rename
    // has landed.
    let temp_guard = scopeguard::guard(temp_path.clone(), |path| {
        let _ = std::fs::remove_file(path);
    });

    write_body(response, url, &temp_path).await?;

    fs::rename(&temp_path, dest).await.map_err(|e| {
        Error::download(
            url,
            format!("could not move artifact into {}: {e}", dest.display()),
            false,
        )
    })?;
    let _ = scopeguard::ScopeGuard::into_inner(temp_guard);

    if executable {
        set_executable(dest).await?;
    }

    debug!("downloaded {url} to {}", dest.display());
    Ok(())
}

/// Temp file beside `dest` so the final rename never crosses filesystems
fn part_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.part", name, std::process::id()))
}

async fn write_body(response: reqwest::Response, url: &str, temp_path: &Path) -> Result<()> {
    let mut file = fs::File::create(temp_path).await.map_err(|e| {
        Error::download(
            url,
            format!("could not create {}: {e}", temp_path.display()),
            false,
        )
    })?;

    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| Error::download(url, format!("transfer interrupted: {e}"), true))?;
        file.write_all(&chunk).await.map_err(|e| {
            Error::download(
                url,
                format!("could not write {}: {e}", temp_path.display()),
                false,
            )
        })?;
    }

    // Flush to disk before the rename makes the artifact visible.
    file.sync_all().await.map_err(|e| {
        Error::download(
            url,
            format!("could not flush {}: {e}", temp_path.display()),
            false,
        )
    })?;
    Ok(())
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)
        .await
        .map_err(|e| Error::filesystem(path, e))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .await
        .map_err(|e| Error::filesystem(path, e))
}

#[cfg(not(unix))]
async fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubRoute, StubServer};
    use tempfile::TempDir;

    fn leftover_entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn test_downloads_body_to_destination() {
        let server = StubServer::start(vec![(
            "/v1/parser-linux.bin",
            StubRoute::Ok(b"parser binary contents".to_vec()),
        )]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("parser-linux.bin");

        let client = reqwest::Client::new();
        download(&client, &server.url("/v1/parser-linux.bin"), &dest, false)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"parser binary contents");
        assert_eq!(leftover_entries(dir.path()), vec!["parser-linux.bin"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sets_executable_bit_when_requested() {
        use std::os::unix::fs::PermissionsExt;
        let server = StubServer::start(vec![("/bin", StubRoute::Ok(b"elf".to_vec()))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("runtime-linux.bin");

        let client = reqwest::Client::new();
        download(&client, &server.url("/bin"), &dest, true)
            .await
            .unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_leaves_plain_permissions_when_not_requested() {
        use std::os::unix::fs::PermissionsExt;
        let server = StubServer::start(vec![("/docs", StubRoute::Ok(b"{}".to_vec()))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("docs.json");

        let client = reqwest::Client::new();
        download(&client, &server.url("/docs"), &dest, false)
            .await
            .unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
    }

    #[tokio::test]
    async fn test_http_error_leaves_nothing_behind() {
        let server = StubServer::start(vec![("/gone", StubRoute::Status(404))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("parser-linux.bin");

        let client = reqwest::Client::new();
        let err = download(&client, &server.url("/gone"), &dest, false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { retryable: false, .. }));
        assert!(leftover_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_server_errors_are_retryable() {
        let server = StubServer::start(vec![("/flaky", StubRoute::Status(503))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("artifact");

        let client = reqwest::Client::new();
        let err = download(&client, &server.url("/flaky"), &dest, false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { retryable: true, .. }));
    }

    #[tokio::test]
    async fn test_truncated_transfer_is_cleaned_up() {
        let server = StubServer::start(vec![(
            "/cut",
            StubRoute::Truncated {
                body: b"only half".to_vec(),
                claimed_len: 4096,
            },
        )]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("runtime-linux.bin");

        // The stub keeps the connection open after the short body, so the
        // timeout is what surfaces the truncation.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(800))
            .build()
            .unwrap();
        let err = download(&client, &server.url("/cut"), &dest, false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { retryable: true, .. }));
        // Neither the destination nor any temp file survives the failure.
        assert!(leftover_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_local_write_failure_is_a_download_error() {
        let server = StubServer::start(vec![("/bin", StubRoute::Ok(b"elf".to_vec()))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("no-such-dir").join("runtime-linux.bin");

        let client = reqwest::Client::new();
        let err = download(&client, &server.url("/bin"), &dest, false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Download { retryable: false, .. }));
        assert!(err.to_string().contains("no-such-dir"));
    }

    #[tokio::test]
    async fn test_failed_download_preserves_existing_artifact() {
        let server = StubServer::start(vec![("/gone", StubRoute::Status(404))]);
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("parser-linux.bin");
        std::fs::write(&dest, b"previously installed").unwrap();

        let client = reqwest::Client::new();
        let _ = download(&client, &server.url("/gone"), &dest, false).await;

        assert_eq!(std::fs::read(&dest).unwrap(), b"previously installed");
    }
}
