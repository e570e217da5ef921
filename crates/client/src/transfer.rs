//! # ファイル転送
//!
//! multipart アップロード（進捗通知付き）と、バイナリのダウンロードを提供する。
//!
//! どちらも通常の JSON リクエストと同じ経路（認証付与・リフレッシュ再送・エラー正規化）を通る。

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream};
use http::{
    Method,
    header::{CONTENT_DISPOSITION, CONTENT_TYPE},
};
use reqwest::multipart::{Form, Part};
use schoolfee_shared::{ApiError, ApiResponse};
use serde::de::DeserializeOwned;

use crate::{
    error::ClientError,
    http::{ApiClient, Payload, RequestConfig},
};

/// multipart のファイルフィールド名
pub const FILE_FIELD: &str = "file";

/// 進捗通知の単位
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// アップロードの進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent:  u64,
    pub total: u64,
}

impl UploadProgress {
    /// 進捗率（0〜100）
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        u8::try_from(self.sent.saturating_mul(100) / self.total).unwrap_or(100)
    }
}

/// 進捗の受け手
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// アップロードするファイル
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name:    String,
    pub bytes:        Bytes,
    pub content_type: Option<String>,
    /// ファイルと一緒に送るテキストフィールド
    pub fields:       Vec<(String, String)>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name:    file_name.into(),
            bytes:        bytes.into(),
            content_type: None,
            fields:       Vec::new(),
        }
    }

    /// ファイルを読み込んで作成する
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self::new(file_name, bytes))
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }
}

/// 再送のたびにフォームを組み立て直すための multipart ボディ
pub(crate) struct MultipartBody<'a> {
    file:     &'a UploadFile,
    progress: Option<ProgressFn>,
}

impl MultipartBody<'_> {
    pub(crate) fn to_form(&self) -> Form {
        let form = self
            .file
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| {
                form.text(name.clone(), value.clone())
            });

        let part = match &self.file.content_type {
            Some(content_type) => self
                .file_part()
                .mime_str(content_type)
                .unwrap_or_else(|_| self.file_part()),
            None => self.file_part(),
        };

        form.part(FILE_FIELD, part)
    }

    fn file_part(&self) -> Part {
        let total = self.file.bytes.len() as u64;
        let body = reqwest::Body::wrap_stream(progress_stream(
            self.file.bytes.clone(),
            self.progress.clone(),
        ));
        Part::stream_with_length(body, total).file_name(self.file.file_name.clone())
    }
}

/// 送信済みのバイト数を通知しながらチャンクを流す
fn progress_stream(
    bytes: Bytes,
    progress: Option<ProgressFn>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + UPLOAD_CHUNK_SIZE).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        if let Some(progress) = &progress {
            progress(UploadProgress { sent, total });
        }
        Ok(chunk)
    })
}

/// ダウンロード結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub bytes:        Bytes,
    /// `Content-Disposition` のファイル名
    pub file_name:    Option<String>,
    pub content_type: Option<String>,
}

impl ApiClient {
    /// multipart（`file` フィールド）でアップロードする
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        file: &UploadFile,
        progress: Option<ProgressFn>,
        config: &RequestConfig,
    ) -> Result<ApiResponse<T>, ClientError> {
        let body = MultipartBody { file, progress };
        let response = self
            .send(Method::POST, path, &Payload::Multipart(&body), config)
            .await?;
        let value = self.read_json(response).await?;
        Ok(ApiResponse::from_body(value).decode()?)
    }

    /// バイナリをダウンロードする
    pub async fn download(&self, path: &str, config: &RequestConfig) -> Result<Download, ClientError> {
        let response = self.send(Method::GET, path, &Payload::Empty, config).await?;

        let headers = response.headers();
        let file_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(content_disposition_file_name);
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.report(ApiError::network(e)))?;

        tracing::debug!(path, size = bytes.len(), file_name = ?file_name, "ダウンロード完了");

        Ok(Download {
            bytes,
            file_name,
            content_type,
        })
    }

    /// ダウンロードして `dir` に保存し、保存先のパスを返す
    ///
    /// ファイル名は `Content-Disposition` から取り、無ければパスの末尾を使う。
    pub async fn download_to(
        &self,
        path: &str,
        config: &RequestConfig,
        dir: &Path,
    ) -> Result<PathBuf, ClientError> {
        let download = self.download(path, config).await?;
        let file_name = download
            .file_name
            .as_deref()
            .and_then(safe_file_name)
            .unwrap_or_else(|| fallback_file_name(path));

        tokio::fs::create_dir_all(dir).await?;
        let target = dir.join(file_name);
        tokio::fs::write(&target, &download.bytes).await?;

        tracing::info!(path = %target.display(), "ファイルを保存");
        Ok(target)
    }
}

/// `Content-Disposition` からファイル名を取り出す（`filename*` を優先する）
pub fn content_disposition_file_name(value: &str) -> Option<String> {
    let params: Vec<(String, &str)> = value
        .split(';')
        .filter_map(|param| param.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim()))
        .collect();

    let extended = params
        .iter()
        .find(|(key, _)| key == "filename*")
        .and_then(|(_, value)| {
            let encoded = value.split_once("''").map_or(*value, |(_, rest)| rest);
            urlencoding::decode(encoded.trim_matches('"'))
                .ok()
                .map(|decoded| decoded.into_owned())
        });

    extended
        .or_else(|| {
            params
                .iter()
                .find(|(key, _)| key == "filename")
                .map(|(_, value)| value.trim_matches('"').to_string())
        })
        .filter(|name| !name.is_empty())
}

/// ディレクトリ部分を取り除いたファイル名
fn safe_file_name(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "..")
        .map(str::to_string)
}

fn fallback_file_name(path: &str) -> String {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .and_then(safe_file_name)
        .unwrap_or_else(|| "download".to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(r#"attachment; filename="receipt-44.pdf""#, Some("receipt-44.pdf"))]
    #[case("attachment; filename=report.csv", Some("report.csv"))]
    #[case(
        r#"attachment; filename="fallback.pdf"; filename*=UTF-8''re%C3%A7u%2044.pdf"#,
        Some("reçu 44.pdf")
    )]
    #[case("inline", None)]
    #[case(r#"attachment; filename="""#, None)]
    fn test_content_dispositionからファイル名を取り出す(
        #[case] header: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(
            content_disposition_file_name(header).as_deref(),
            expected
        );
    }

    #[rstest]
    #[case("../../etc/passwd", Some("passwd"))]
    #[case("receipt.pdf", Some("receipt.pdf"))]
    #[case("..", None)]
    fn test_ファイル名からディレクトリを除く(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(safe_file_name(name).as_deref(), expected);
    }

    #[rstest]
    #[case("/payments/receipt/44", "44")]
    #[case("/reports/export?format=csv", "export")]
    #[case("/", "download")]
    fn test_ファイル名が無ければパスの末尾を使う(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(fallback_file_name(path), expected);
    }

    #[rstest]
    #[case(0, 0, 100)]
    #[case(0, 200, 0)]
    #[case(50, 200, 25)]
    #[case(200, 200, 100)]
    fn test_進捗率(#[case] sent: u64, #[case] total: u64, #[case] expected: u8) {
        assert_eq!(UploadProgress { sent, total }.percent(), expected);
    }

    #[tokio::test]
    async fn test_進捗はチャンクごとに通知され合計で終わる() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let progress: ProgressFn = Arc::new(move |p| recorder.lock().unwrap().push(p));

        let bytes = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks: Vec<_> = progress_stream(bytes, Some(progress)).collect().await;

        assert_eq!(chunks.len(), 3);
        let seen = seen.lock().unwrap().clone();
        let total = (UPLOAD_CHUNK_SIZE * 2 + 10) as u64;
        assert_eq!(
            seen,
            vec![
                UploadProgress {
                    sent: UPLOAD_CHUNK_SIZE as u64,
                    total,
                },
                UploadProgress {
                    sent: (UPLOAD_CHUNK_SIZE * 2) as u64,
                    total,
                },
                UploadProgress { sent: total, total },
            ]
        );
    }
}
