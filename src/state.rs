use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    appointments::repo::{AppointmentRepo, PgAppointmentRepo},
    auth::password::{Argon2Hasher, Hasher},
    clock::{Clock, SystemClock},
    config::AppConfig,
    files::repo::{FileRepo, PgFileRepo},
    mail::{LogMailer, Mailer},
    storage::{AttachmentStore, S3AttachmentStore},
    users::repo::{PgUserRepo, UserRepo},
};

/// Collaborators shared by every handler, built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepo>,
    pub appointments: Arc<dyn AppointmentRepo>,
    pub files: Arc<dyn FileRepo>,
    pub storage: Arc<dyn AttachmentStore>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
    pub hasher: Arc<dyn Hasher>,
}

impl AppState {
    pub async fn init(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        let storage = Arc::new(S3AttachmentStore::connect(&config).await?) as Arc<dyn AttachmentStore>;

        Ok(Self {
            users: Arc::new(PgUserRepo::new(db.clone())),
            appointments: Arc::new(PgAppointmentRepo::new(db.clone())),
            files: Arc::new(PgFileRepo::new(db)),
            storage,
            mailer: Arc::new(LogMailer),
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2Hasher),
            config,
        })
    }
}
