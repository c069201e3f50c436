#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use repo_likes::actors::{ListStateConfig, ListStateController, ListStateHandle};
use repo_likes::error::{RepoLikesError, Result};
use repo_likes::remote::RepositoryApi;
use repo_likes::types::{LikeResponse, RemoteRepository, RepositoryId};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub fn repo(id: &str, likes: u64) -> RemoteRepository {
    RemoteRepository {
        id: RepositoryId::from(id),
        title: format!("project-{}", id),
        url: format!("https://github.com/owner/project-{}", id),
        techs: vec!["Rust".to_string(), "Tokio".to_string()],
        likes,
    }
}

type Store = Arc<Mutex<Vec<RemoteRepository>>>;

/// Local HTTP server speaking the repository service contract
pub struct StubServer {
    pub base_url: String,
    pub store: Store,
}

async fn list_handler(State(store): State<Store>) -> Json<Vec<RemoteRepository>> {
    Json(store.lock().await.clone())
}

async fn like_handler(
    State(store): State<Store>,
    Path(id): Path<String>,
) -> std::result::Result<Json<RemoteRepository>, StatusCode> {
    let mut repos = store.lock().await;
    let repo = repos
        .iter_mut()
        .find(|repo| repo.id.as_str() == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    repo.likes += 1;
    Ok(Json(repo.clone()))
}

/// Serves the contract both at the root and under `/api`
pub async fn spawn_stub_server(repos: Vec<RemoteRepository>) -> anyhow::Result<StubServer> {
    let store: Store = Arc::new(Mutex::new(repos));

    let routes = Router::new()
        .route("/repositories", get(list_handler))
        .route("/repositories/:id/like", post(like_handler));

    let app = Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .with_state(store.clone());

    let base_url = serve(app).await?;
    Ok(StubServer { base_url, store })
}

/// Server answering every request with a 500
pub async fn spawn_failing_server() -> anyhow::Result<String> {
    let app = Router::new().fallback(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable")
    });
    serve(app).await
}

async fn serve(app: Router) -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("Stub server stopped: {}", e);
        }
    });
    Ok(format!("http://{}", addr))
}

/// In-memory repository service with adjustable latency and failures.
///
/// A like is counted when the call starts; the configured delay is applied
/// before the response is returned.
#[derive(Default)]
pub struct FakeApi {
    records: Mutex<Vec<RemoteRepository>>,
    list_delays: Mutex<VecDeque<Duration>>,
    like_delays: Mutex<HashMap<String, Duration>>,
    queued_like_delays: Mutex<VecDeque<Duration>>,
    failing_likes: Mutex<HashSet<String>>,
    fail_list: AtomicBool,
    list_calls: AtomicUsize,
    like_calls: AtomicUsize,
}

impl FakeApi {
    pub fn with_records(records: Vec<RemoteRepository>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub async fn set_records(&self, records: Vec<RemoteRepository>) {
        *self.records.lock().await = records;
    }

    /// Delay for the next list call; calls beyond the queued delays answer at once
    pub async fn push_list_delay(&self, delay: Duration) {
        self.list_delays.lock().await.push_back(delay);
    }

    pub async fn set_like_delay(&self, id: &str, delay: Duration) {
        self.like_delays.lock().await.insert(id.to_string(), delay);
    }

    /// Delay for the next like call on any id; takes precedence over per-id delays
    pub async fn push_like_delay(&self, delay: Duration) {
        self.queued_like_delays.lock().await.push_back(delay);
    }

    pub async fn fail_likes_for(&self, id: &str) {
        self.failing_likes.lock().await.insert(id.to_string());
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn like_calls(&self) -> usize {
        self.like_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryApi for FakeApi {
    async fn list_repositories(&self) -> Result<Vec<RemoteRepository>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().await.clone();
        let delay = self.list_delays.lock().await.pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RepoLikesError::ApiError("list unavailable".to_string()));
        }
        Ok(records)
    }

    async fn like_repository(&self, id: &RepositoryId) -> Result<LikeResponse> {
        self.like_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_likes.lock().await.contains(id.as_str()) {
            return Err(RepoLikesError::ApiError("like rejected".to_string()));
        }

        let likes = {
            let mut records = self.records.lock().await;
            let record = records
                .iter_mut()
                .find(|record| &record.id == id)
                .ok_or_else(|| RepoLikesError::NotFound(format!("repository {}", id)))?;
            record.likes += 1;
            record.likes
        };

        let queued = self.queued_like_delays.lock().await.pop_front();
        let delay = match queued {
            Some(delay) => Some(delay),
            None => self.like_delays.lock().await.get(id.as_str()).copied(),
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(LikeResponse { likes })
    }
}

/// Controller over a fake service, without the automatic startup load
pub async fn spawn_controller(api: &Arc<FakeApi>) -> ListStateHandle {
    let api: Arc<dyn RepositoryApi> = api.clone();
    let config = ListStateConfig {
        load_on_start: false,
        call_timeout: Duration::from_secs(5),
    };
    ListStateController::start(api, config)
        .await
        .expect("Failed to spawn list controller")
}
