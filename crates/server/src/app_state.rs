use std::path::PathBuf;

use server_api::ApiContext;
use shared::protocol::ServerEvent;
use tokio::sync::broadcast;

use crate::auth::AuthConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) auth: AuthConfig,
    pub(crate) audio_dir: PathBuf,
    pub(crate) events: broadcast::Sender<ServerEvent>,
}
