//! # トークンストア
//!
//! アクセストークンとリフレッシュトークンの保管場所を抽象化する。
//!
//! HTTP クライアントはリクエストごとに [`TokenStore::get`] を呼び、
//! リフレッシュ成功時に [`TokenStore::set`]、セッション切れ・ログアウト時に
//! [`TokenStore::clear`] を呼ぶ。
//!
//! | 実装 | 保管場所 |
//! |------|---------|
//! | [`MemoryTokenStore`] | プロセス内メモリ |
//! | [`FileTokenStore`] | JSON ファイル（`authToken` / `refreshToken`） |

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use schoolfee_domain::auth::TokenPair;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// トークンストアのエラー
#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("トークンファイルを読み書きできません: {0}")]
    Io(#[from] std::io::Error),

    #[error("トークンファイルの形式が不正です: {0}")]
    Format(#[from] serde_json::Error),
}

/// トークンの保管場所
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// 保存済みのトークンを取得する（未ログインなら `None`）
    async fn get(&self) -> Result<Option<TokenPair>, TokenStoreError>;

    /// トークンを保存する（既存の値は置き換える）
    async fn set(&self, tokens: TokenPair) -> Result<(), TokenStoreError>;

    /// トークンを破棄する
    async fn clear(&self) -> Result<(), TokenStoreError>;
}

/// プロセス内メモリのトークンストア
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// トークンを保存した状態で作成する
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        Ok(self.tokens.read().await.clone())
    }

    async fn set(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        *self.tokens.write().await = Some(tokens);
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

/// ファイルに保存される形（ブラウザ版の localStorage と同じキー）
#[derive(Serialize, Deserialize)]
struct StoredTokens {
    #[serde(rename = "authToken")]
    auth_token:    String,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// JSON ファイルのトークンストア
///
/// ファイルが無い状態を「未ログイン」として扱う。
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        let _guard = self.lock.read().await;
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredTokens = serde_json::from_slice(&content)?;
        Ok(Some(TokenPair::new(stored.auth_token, stored.refresh_token)))
    }

    async fn set(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        let _guard = self.lock.write().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let stored = StoredTokens {
            auth_token:    tokens.access_token,
            refresh_token: tokens.refresh_token,
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        let _guard = self.lock.write().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
