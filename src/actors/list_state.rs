use crate::error::{RepoLikesError, Result};
use crate::models::{ControllerStats, Repository, RepositoryList};
use crate::remote::RepositoryApi;
use crate::types::{LikeResponse, RemoteRepository, RepositoryId};
use chrono::Utc;
use ractor::{rpc::CallResult, Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Configuration for the list state controller
#[derive(Debug, Clone)]
pub struct ListStateConfig {
    /// Fetch the list as soon as the controller starts
    pub load_on_start: bool,
    /// How long a caller waits for the controller to answer, remote call included
    pub call_timeout: Duration,
}

impl Default for ListStateConfig {
    fn default() -> Self {
        Self {
            load_on_start: true,
            call_timeout: Duration::from_secs(60),
        }
    }
}

/// Actor owning the repository list for one screen session
pub struct ListStateController;

/// State for the list controller
pub struct ListState {
    api: Arc<dyn RepositoryApi>,
    current: RepositoryList,
    publisher: watch::Sender<RepositoryList>,
    /// Generation handed to the most recently issued load
    issued_generation: u64,
    /// Generation of the load whose result is on screen
    applied_generation: u64,
    stats: ControllerStats,
}

/// Messages the controller can handle
#[derive(Debug)]
pub enum ListStateMessage {
    /// Fetch the list from the service and replace the current one
    Load(Option<RpcReplyPort<Result<RepositoryList>>>),
    /// A list fetch came back
    LoadResolved {
        generation: u64,
        result: Result<Vec<RemoteRepository>>,
        reply: Option<RpcReplyPort<Result<RepositoryList>>>,
    },
    /// Like a repository
    Like {
        id: RepositoryId,
        reply: RpcReplyPort<Result<Repository>>,
    },
    /// A like call came back
    LikeResolved {
        id: RepositoryId,
        result: Result<LikeResponse>,
        reply: RpcReplyPort<Result<Repository>>,
    },
    /// Get statistics about the session
    GetStats(RpcReplyPort<ControllerStats>),
    /// Stop the controller; late responses are dropped
    Shutdown,
}

/// Arguments for starting the controller
pub struct ListStateArgs {
    pub api: Arc<dyn RepositoryApi>,
    pub publisher: watch::Sender<RepositoryList>,
    pub config: ListStateConfig,
}

impl ListStateController {
    /// Spawn a controller and return a handle to it
    pub async fn start(api: Arc<dyn RepositoryApi>, config: ListStateConfig) -> Result<ListStateHandle> {
        let (publisher, updates) = watch::channel(RepositoryList::default());
        let call_timeout = config.call_timeout;

        let args = ListStateArgs {
            api,
            publisher,
            config,
        };

        let (actor, _handle) = Actor::spawn(None, ListStateController, args)
            .await
            .map_err(|e| RepoLikesError::SpawnError(e.to_string()))?;

        info!("List state controller started");
        Ok(ListStateHandle {
            actor,
            updates,
            call_timeout,
        })
    }
}

fn reply_to<T>(reply: RpcReplyPort<T>, value: T) {
    if !reply.is_closed() && reply.send(value).is_err() {
        debug!("Caller went away before the reply was sent");
    }
}

impl ListState {
    fn publish(&mut self, list: RepositoryList) {
        self.stats.repository_count = list.len();
        self.current = list;
        self.publisher.send_replace(self.current.clone());
    }

    fn start_load(&mut self, myself: ActorRef<ListStateMessage>, reply: Option<RpcReplyPort<Result<RepositoryList>>>) {
        self.issued_generation += 1;
        let generation = self.issued_generation;
        let api = self.api.clone();

        debug!(generation, "Fetching repository list");
        tokio::spawn(async move {
            let result = api.list_repositories().await;
            if let Err(e) = myself.send_message(ListStateMessage::LoadResolved { generation, result, reply }) {
                debug!(generation, "Dropping list response, controller is gone: {}", e);
            }
        });
    }

    fn finish_load(
        &mut self,
        generation: u64,
        result: Result<Vec<RemoteRepository>>,
        reply: Option<RpcReplyPort<Result<RepositoryList>>>,
    ) {
        let outcome = match result {
            Ok(_) if generation < self.applied_generation => {
                debug!(
                    generation,
                    applied = self.applied_generation,
                    "Discarding list response superseded by a newer load"
                );
                Ok(self.current.clone())
            }
            Ok(records) => {
                let list = RepositoryList::from_remote(records);
                self.applied_generation = generation;
                self.stats.loads_completed += 1;
                self.stats.last_loaded_at = Some(Utc::now());
                info!(generation, count = list.len(), "Repository list loaded");
                self.publish(list);
                Ok(self.current.clone())
            }
            Err(e) => {
                self.stats.loads_failed += 1;
                error!(generation, "Failed to load repositories: {}", e);
                Err(RepoLikesError::FetchFailure(e.to_string()))
            }
        };

        if let Some(reply) = reply {
            reply_to(reply, outcome);
        }
    }

    fn start_like(&mut self, myself: ActorRef<ListStateMessage>, id: RepositoryId, reply: RpcReplyPort<Result<Repository>>) {
        if !self.current.contains(&id) {
            warn!(%id, "Like requested for a repository that is not in the list");
            reply_to(reply, Err(RepoLikesError::NotFound(format!("repository {}", id))));
            return;
        }

        self.stats.likes_in_flight += 1;
        let api = self.api.clone();

        debug!(%id, in_flight = self.stats.likes_in_flight, "Sending like");
        tokio::spawn(async move {
            let result = api.like_repository(&id).await;
            if let Err(e) = myself.send_message(ListStateMessage::LikeResolved { id, result, reply }) {
                debug!("Dropping like response, controller is gone: {}", e);
            }
        });
    }

    fn finish_like(&mut self, id: RepositoryId, result: Result<LikeResponse>, reply: RpcReplyPort<Result<Repository>>) {
        self.stats.likes_in_flight = self.stats.likes_in_flight.saturating_sub(1);

        let outcome = match result {
            // Resolve the target against the list as it is now
            Ok(response) => match self.current.with_like(&id, response.likes) {
                Ok((list, updated)) => {
                    self.stats.likes_applied += 1;
                    info!(%id, likes = updated.likes, "Repository liked");
                    self.publish(list);
                    Ok(updated)
                }
                Err(e) => {
                    self.stats.likes_discarded += 1;
                    warn!(%id, "Like response arrived after the repository left the list");
                    Err(e)
                }
            },
            Err(e) => {
                self.stats.likes_failed += 1;
                error!(%id, "Failed to like repository: {}", e);
                Err(RepoLikesError::LikeFailure {
                    id: id.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        reply_to(reply, outcome);
    }
}

#[ractor::async_trait]
impl Actor for ListStateController {
    type Msg = ListStateMessage;
    type State = ListState;
    type Arguments = ListStateArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> std::result::Result<Self::State, ActorProcessingErr> {
        info!(load_on_start = args.config.load_on_start, "Starting list state controller");

        if args.config.load_on_start {
            myself
                .send_message(ListStateMessage::Load(None))
                .map_err(|e| ActorProcessingErr::from(format!("Failed to queue initial load: {}", e)))?;
        }

        Ok(ListState {
            api: args.api,
            current: RepositoryList::default(),
            publisher: args.publisher,
            issued_generation: 0,
            applied_generation: 0,
            stats: ControllerStats::default(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        match message {
            ListStateMessage::Load(reply) => state.start_load(myself, reply),
            ListStateMessage::LoadResolved { generation, result, reply } => {
                state.finish_load(generation, result, reply)
            }
            ListStateMessage::Like { id, reply } => state.start_like(myself, id, reply),
            ListStateMessage::LikeResolved { id, result, reply } => state.finish_like(id, result, reply),
            ListStateMessage::GetStats(reply) => reply_to(reply, state.stats.clone()),
            ListStateMessage::Shutdown => {
                info!(in_flight = state.stats.likes_in_flight, "Shutting down list state controller");
                myself.stop(Some("Shutdown requested".to_string()));
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        info!(
            loads = state.stats.loads_completed,
            likes = state.stats.likes_applied,
            "List state controller stopped"
        );
        Ok(())
    }
}

/// Cloneable handle to a running controller
#[derive(Clone)]
pub struct ListStateHandle {
    actor: ActorRef<ListStateMessage>,
    updates: watch::Receiver<RepositoryList>,
    call_timeout: Duration,
}

impl ListStateHandle {
    /// Fetch the list and replace the current one with it
    pub async fn load_repositories(&self) -> Result<RepositoryList> {
        self.call(|reply| ListStateMessage::Load(Some(reply))).await?
    }

    /// Like `id` and return the entry as it stands after the update
    pub async fn like_repository(&self, id: &RepositoryId) -> Result<Repository> {
        let id = id.clone();
        self.call(move |reply| ListStateMessage::Like { id, reply }).await?
    }

    pub async fn stats(&self) -> Result<ControllerStats> {
        self.call(ListStateMessage::GetStats).await
    }

    /// Latest published list
    pub fn snapshot(&self) -> RepositoryList {
        self.updates.borrow().clone()
    }

    /// Receiver notified each time a new list is published
    pub fn subscribe(&self) -> watch::Receiver<RepositoryList> {
        self.updates.clone()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.actor
            .send_message(ListStateMessage::Shutdown)
            .map_err(|e| RepoLikesError::SessionClosed(format!("Failed to shut down controller: {}", e)))
    }

    async fn call<T, F>(&self, build: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> ListStateMessage,
    {
        match self.actor.call(build, Some(self.call_timeout)).await {
            Ok(CallResult::Success(value)) => Ok(value),
            Ok(CallResult::Timeout) => Err(RepoLikesError::Timeout(format!(
                "controller did not answer within {:?}",
                self.call_timeout
            ))),
            Ok(CallResult::SenderError) => Err(RepoLikesError::SessionClosed(
                "controller stopped before answering".to_string(),
            )),
            Err(e) => Err(RepoLikesError::SessionClosed(e.to_string())),
        }
    }
}
