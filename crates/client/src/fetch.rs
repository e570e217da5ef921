//! # データ取得ハンドル
//!
//! 非同期操作 1 つを駆動し、`data / loading / error / execute` を公開する。
//! 一覧画面などが共通して使う「取得して状態に反映する」契約を表す。
//!
//! ## 適用ポリシー
//!
//! 呼び出しは重複排除もキューイングもしない。同時に走った呼び出しの結果を
//! どう状態に反映するかは [`ApplyPolicy`] で選ぶ:
//!
//! | ポリシー | 反映される結果 |
//! |---------|--------------|
//! | [`ApplyPolicy::LatestInvoked`]（既定） | 最後に呼び出したもの。古い呼び出しは状態もコールバックも触らない |
//! | [`ApplyPolicy::LastSettled`] | 最後に完了したもの。すべての呼び出しが反映とコールバックを行う |
//!
//! どちらのポリシーでも、`execute` は自身の結果を呼び出し元に返す。

use std::{
    future::Future,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use futures_util::{FutureExt, future::BoxFuture};
use schoolfee_shared::ApiError;
use tokio::task::JoinHandle;

use crate::error::ClientError;

/// 結果の反映方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyPolicy {
    /// 最後に呼び出した結果だけを反映する
    #[default]
    LatestInvoked,
    /// 完了した順にすべて反映する（最後に完了したものが残る）
    LastSettled,
}

type SuccessCallback<T> = Arc<dyn Fn(&T) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&ApiError) + Send + Sync>;
type Operation<A, T> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, ClientError>> + Send + Sync>;

/// ハンドルの設定
pub struct FetchOptions<T> {
    /// [`FetchHandle::mount`] で既定の引数による取得を行うか
    pub immediate:  bool,
    pub on_success: Option<SuccessCallback<T>>,
    pub on_error:   Option<ErrorCallback>,
    pub policy:     ApplyPolicy,
}

impl<T> Default for FetchOptions<T> {
    fn default() -> Self {
        Self {
            immediate:  true,
            on_success: None,
            on_error:   None,
            policy:     ApplyPolicy::default(),
        }
    }
}

impl<T> FetchOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn policy(mut self, policy: ApplyPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// ハンドルの状態のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data:    Option<T>,
    pub loading: bool,
    pub error:   Option<ApiError>,
}

struct StateCell<T> {
    data:      Option<T>,
    error:     Option<ApiError>,
    in_flight: usize,
}

struct FetchInner<A, T> {
    operation:  Operation<A, T>,
    options:    FetchOptions<T>,
    state:      Mutex<StateCell<T>>,
    generation: AtomicU64,
    mounted:    AtomicBool,
}

impl<A, T> FetchInner<A, T> {
    fn lock(&self) -> MutexGuard<'_, StateCell<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// データ取得ハンドル
///
/// `clone()` しても同じ状態を共有する。
pub struct FetchHandle<A, T> {
    inner: Arc<FetchInner<A, T>>,
}

impl<A, T> Clone for FetchHandle<A, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// 実行中の呼び出しを数え、完了・キャンセルのどちらでも必ず減らす
///
/// 完了時は [`finish`](Self::finish) でカウントの減算と結果の反映を同じロック内で行う。
struct InFlight<'a, A, T> {
    inner:    &'a FetchInner<A, T>,
    finished: bool,
}

impl<'a, A, T> InFlight<'a, A, T> {
    fn start(inner: &'a FetchInner<A, T>) -> Self {
        let mut state = inner.lock();
        state.in_flight += 1;
        state.error = None;
        Self {
            inner,
            finished: false,
        }
    }

    fn finish<R>(mut self, apply: impl FnOnce(&mut StateCell<T>) -> R) -> R {
        self.finished = true;
        let mut state = self.inner.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        apply(&mut state)
    }
}

impl<A, T> Drop for InFlight<'_, A, T> {
    fn drop(&mut self) {
        if !self.finished {
            let mut state = self.inner.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }
}

impl<A, T> FetchHandle<A, T>
where
    A: Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// 非同期操作からハンドルを作成する
    pub fn new<F, Fut>(operation: F, options: FetchOptions<T>) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(FetchInner {
                operation: Box::new(move |args| operation(args).boxed()),
                options,
                state: Mutex::new(StateCell {
                    data:      None,
                    error:     None,
                    in_flight: 0,
                }),
                generation: AtomicU64::new(0),
                mounted: AtomicBool::new(false),
            }),
        }
    }

    /// 現在の状態
    pub fn snapshot(&self) -> FetchState<T> {
        let state = self.inner.lock();
        FetchState {
            data:    state.data.clone(),
            loading: state.in_flight > 0,
            error:   state.error.clone(),
        }
    }

    pub fn data(&self) -> Option<T> {
        self.inner.lock().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<ApiError> {
        self.inner.lock().error.clone()
    }

    /// 操作を実行し、結果を状態に反映して返す
    pub async fn execute(&self, args: A) -> Result<T, ApiError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let in_flight = InFlight::start(&self.inner);
        let result = (self.inner.operation)(args)
            .await
            .map_err(|e| e.to_api_error());

        let applied = in_flight.finish(|state| {
            let apply = match self.inner.options.policy {
                ApplyPolicy::LastSettled => true,
                ApplyPolicy::LatestInvoked => {
                    self.inner.generation.load(Ordering::SeqCst) == generation
                }
            };
            if apply {
                match &result {
                    Ok(data) => {
                        state.data = Some(data.clone());
                        state.error = None;
                    }
                    Err(error) => state.error = Some(error.clone()),
                }
            }
            apply
        });

        if !applied {
            tracing::debug!(generation, "より新しい呼び出しがあるため結果を破棄");
            return result;
        }

        match &result {
            Ok(data) => {
                if let Some(callback) = &self.inner.options.on_success {
                    callback(data);
                }
            }
            Err(error) => {
                if let Some(callback) = &self.inner.options.on_error {
                    callback(error);
                }
            }
        }

        result
    }

    /// バックグラウンドで実行する（結果は状態とコールバックでのみ受け取る）
    pub fn spawn(&self, args: A) -> JoinHandle<()> {
        let handle = self.clone();
        tokio::spawn(async move {
            let _ = handle.execute(args).await;
        })
    }

    /// `immediate` が有効なら既定の引数で 1 度だけ取得する
    ///
    /// 2 回目以降の呼び出しや `immediate = false` の場合は何もせず `None` を返す。
    pub async fn mount(&self) -> Option<Result<T, ApiError>>
    where
        A: Default,
    {
        if !self.inner.options.immediate || self.inner.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.execute(A::default()).await)
    }
}
