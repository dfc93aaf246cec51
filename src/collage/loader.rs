//! # 来源加载模块
//!
//! ## 设计思路
//!
//! 把四种来源统一归一为原始图片字节，只在需要 I/O 的分支上挂起：
//! - 字节：原样返回，不做任何 I/O
//! - URL（`http` / `ftp` 前缀）：流式下载，逐块累积
//! - 文件：异步读取整个文件
//! - 画布：同步编码为 PNG
//!
//! ## 实现思路
//!
//! - 批量加载采用 scatter/gather：所有来源同时发起，按输入顺序收集结果，任一失败整体失败。
//! - 传输类错误统一映射为 `SourceUnavailable`，并带上原始地址。
//! - 体积上限在下载过程中和读取文件前检查，超限返回 `ResourceLimit`。
//! - 不做重试与缓存。

use std::path::Path;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures::future::try_join_all;

use super::source::is_remote_location;
use super::{CollageError, Composer, ComposerConfig, ImageSource};

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;

impl Composer {
    /// 并发加载全部来源，结果顺序与输入一致。
    pub(super) async fn resolve_all(
        &self,
        sources: &[ImageSource],
    ) -> Result<Vec<Bytes>, CollageError> {
        let start = Instant::now();
        let resolved = try_join_all(sources.iter().map(|source| self.resolve_source(source))).await?;

        log::debug!(
            "📦 来源加载完成 - 数量: {} 耗时: {}ms",
            resolved.len(),
            start.elapsed().as_millis()
        );

        Ok(resolved)
    }

    pub(super) async fn resolve_optional(
        &self,
        source: Option<&ImageSource>,
    ) -> Result<Option<Bytes>, CollageError> {
        match source {
            Some(source) => self.resolve_source(source).await.map(Some),
            None => Ok(None),
        }
    }

    /// 将单个来源归一为原始字节。
    pub async fn resolve_source(&self, source: &ImageSource) -> Result<Bytes, CollageError> {
        match source {
            ImageSource::Buffer(bytes) => Ok(bytes.clone()),
            ImageSource::Location(location) if is_remote_location(location) => {
                self.download(location).await
            }
            ImageSource::Location(path) => self.read_file(Path::new(path)).await,
            ImageSource::File(path) => self.read_file(path).await,
            ImageSource::Canvas(canvas) => canvas.to_png_bytes().map(Bytes::from),
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes, CollageError> {
        let config = self.config();
        log::info!("🌐 开始下载图片 - URL: {}", redact_url_for_log(url));

        let mut response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CollageError::source_unavailable(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollageError::source_unavailable(
                url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        if let Some(len) = response.content_length() {
            check_size(len, config, url)?;
        }

        let initial_capacity = response
            .content_length()
            .map(|len| len.min(config.max_file_size) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = BytesMut::with_capacity(initial_capacity);

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CollageError::source_unavailable(url, e))?
        {
            check_size((buffer.len() + chunk.len()) as u64, config, url)?;
            buffer.extend_from_slice(&chunk);
        }

        log::debug!("✅ 下载完成 - {} bytes", buffer.len());
        Ok(buffer.freeze())
    }

    async fn read_file(&self, path: &Path) -> Result<Bytes, CollageError> {
        let location = path.display().to_string();
        log::info!("📁 开始读取本地图片 - 路径: {}", location);

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CollageError::source_unavailable(&location, e))?;
        check_size(metadata.len(), self.config(), &location)?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CollageError::source_unavailable(&location, e))?;

        Ok(Bytes::from(bytes))
    }
}

fn check_size(size: u64, config: &ComposerConfig, location: &str) -> Result<(), CollageError> {
    if size > config.max_file_size {
        return Err(CollageError::ResourceLimit(format!(
            "来源过大：{} {:.2} MB（限制：{:.2} MB）",
            location,
            size as f64 / 1024.0 / 1024.0,
            config.max_file_size as f64 / 1024.0 / 1024.0
        )));
    }

    Ok(())
}

/// 日志中去掉 query 与 fragment，避免泄露签名参数。
fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collage::Canvas;
    use image::Rgba;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;

    fn composer() -> Composer {
        Composer::new(ComposerConfig::default()).expect("composer init failed")
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("photo-collage-{}-{}", std::process::id(), name))
    }

    /// 起一个只响应一次的 HTTP 服务。
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
        let addr = listener.local_addr().expect("read local addr failed");

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept failed");
            let mut req_buf = [0u8; 1024];
            let _ = stream.read(&mut req_buf);

            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            stream.write_all(head.as_bytes()).expect("write headers failed");
            stream.write_all(&body).expect("write body failed");
            stream.flush().expect("flush failed");
        });

        (format!("http://127.0.0.1:{}/photo.png", addr.port()), handle)
    }

    #[tokio::test]
    async fn buffer_source_is_returned_as_is() {
        let bytes = Bytes::from_static(b"\x89PNG raw");
        let resolved = composer()
            .resolve_source(&ImageSource::Buffer(bytes.clone()))
            .await
            .unwrap();

        assert_eq!(resolved, bytes);
    }

    #[tokio::test]
    async fn missing_file_is_source_unavailable() {
        let path = temp_path("does-not-exist.png");
        let path = path.to_string_lossy().into_owned();

        let result = composer().resolve_source(&ImageSource::from(path.as_str())).await;

        assert!(matches!(
            result,
            Err(CollageError::SourceUnavailable { ref location, .. }) if *location == path
        ));
    }

    #[tokio::test]
    async fn file_source_reads_whole_file() {
        let path = temp_path("read-whole.bin");
        std::fs::write(&path, b"file-bytes").unwrap();

        let resolved = composer().resolve_source(&ImageSource::from(path.clone())).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(&resolved.unwrap()[..], b"file-bytes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_utf8_file_path_is_read_verbatim() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut name = OsString::from(format!("photo-collage-{}-", std::process::id()));
        name.push(OsString::from_vec(vec![0xff, b'.', b'b', b'i', b'n']));
        let path = std::env::temp_dir().join(name);
        if std::fs::write(&path, b"raw-path-bytes").is_err() {
            // 部分文件系统拒绝非 UTF-8 文件名
            return;
        }

        let resolved = composer().resolve_source(&ImageSource::from(path.clone())).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(&resolved.unwrap()[..], b"raw-path-bytes");
    }

    #[tokio::test]
    async fn oversized_file_hits_resource_limit() {
        let path = temp_path("too-big.bin");
        std::fs::write(&path, vec![0u8; 64]).unwrap();

        let mut config = ComposerConfig::default();
        config.max_file_size = 16;
        let composer = Composer::new(config).unwrap();

        let result = composer.resolve_source(&ImageSource::from(path.clone())).await;
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(CollageError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn canvas_source_is_encoded_as_png() {
        let mut canvas = Canvas::new(2, 2);
        canvas.fill(Rgba([1, 2, 3, 255]));

        let resolved = composer()
            .resolve_source(&ImageSource::Canvas(canvas.clone()))
            .await
            .unwrap();
        let decoded = image::load_from_memory(&resolved).unwrap().to_rgba8();

        assert_eq!(decoded, *canvas.as_rgba());
    }

    #[tokio::test]
    async fn url_source_accumulates_body() {
        let body = b"streamed image body".to_vec();
        let (url, server) = serve_once("200 OK", body.clone());

        let resolved = composer().resolve_source(&ImageSource::from(url)).await;
        server.join().expect("server thread failed");

        assert_eq!(&resolved.unwrap()[..], body.as_slice());
    }

    #[tokio::test]
    async fn url_error_status_is_source_unavailable() {
        let (url, server) = serve_once("404 Not Found", Vec::new());

        let result = composer().resolve_source(&ImageSource::from(url.clone())).await;
        server.join().expect("server thread failed");

        assert!(matches!(
            result,
            Err(CollageError::SourceUnavailable { ref location, .. }) if *location == url
        ));
    }

    #[tokio::test]
    async fn unreachable_url_is_source_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}/gone.png", port);
        let result = composer().resolve_source(&ImageSource::from(url.clone())).await;

        assert!(matches!(
            result,
            Err(CollageError::SourceUnavailable { ref location, .. }) if *location == url
        ));
    }

    #[tokio::test]
    async fn resolve_all_preserves_input_order() {
        let (url, server) = serve_once("200 OK", b"remote".to_vec());
        let sources = vec![
            ImageSource::from(url),
            ImageSource::from(b"first-local".to_vec()),
            ImageSource::from(b"second-local".to_vec()),
        ];

        let resolved = composer().resolve_all(&sources).await.unwrap();
        server.join().expect("server thread failed");

        let as_slices: Vec<&[u8]> = resolved.iter().map(|b| &b[..]).collect();
        let expected: Vec<&[u8]> = vec![&b"remote"[..], &b"first-local"[..], &b"second-local"[..]];
        assert_eq!(as_slices, expected);
    }

    #[tokio::test]
    async fn resolve_all_fails_if_any_source_fails() {
        let missing = temp_path("missing-in-batch.png");
        let sources = vec![ImageSource::from(vec![1u8]), ImageSource::from(missing)];

        let result = composer().resolve_all(&sources).await;

        assert!(matches!(result, Err(CollageError::SourceUnavailable { .. })));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted = redact_url_for_log("https://example.com:8443/path/img.png?token=abc123#hash");

        assert_eq!(redacted, "https://example.com:8443/path/img.png");
    }
}
