//! In-memory collaborators and an SQLite-backed [`Taskboard`] for tests.

use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use platform_authn::{AuthMethod, AuthenticatedPrincipal};
use platform_notify::{CalendarEvent, CalendarService, EmailSender, NotifyError};
use platform_storage::{ObjectStorage, StorageError, StoredObject, UploadFile};
use sea_orm::{Database, DbErr};

use crate::{Collaborators, Taskboard, TaskboardSettings, views::UserView};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        lock(&self.sent).clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        lock(&self.sent).iter().map(|mail| mail.subject.clone()).collect()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Smtp("mailer offline".into()));
        }
        lock(&self.sent).push(SentMail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingCalendar {
    events: Mutex<Vec<CalendarEvent>>,
    fail: AtomicBool,
}

impl RecordingCalendar {
    pub fn events(&self) -> Vec<CalendarEvent> {
        lock(&self.events).clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CalendarService for RecordingCalendar {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Calendar("calendar offline".into()));
        }
        let mut events = lock(&self.events);
        events.push(event.clone());
        Ok(format!("https://calendar.test/event/{}", events.len()))
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
}

impl MemoryStorage {
    /// Names currently stored.
    pub fn objects(&self) -> Vec<String> {
        lock(&self.objects).clone()
    }

    /// Names passed to `delete`, in call order.
    pub fn deleted(&self) -> Vec<String> {
        lock(&self.deleted).clone()
    }

    pub fn set_failing_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, file: UploadFile) -> Result<StoredObject, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                name: file.file_name,
                reason: "bucket offline".into(),
            });
        }
        lock(&self.objects).push(file.file_name.clone());
        Ok(StoredObject {
            url: format!("https://storage.test/{}", file.file_name),
            name: file.file_name,
        })
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        lock(&self.objects).retain(|stored| stored != name);
        lock(&self.deleted).push(name.to_string());
        Ok(())
    }

    async fn delete_all(&self) -> Result<usize, StorageError> {
        let mut objects = lock(&self.objects);
        let count = objects.len();
        lock(&self.deleted).extend(objects.drain(..));
        Ok(count)
    }
}

/// A migrated in-memory database wired to recording collaborators.
pub struct Harness {
    pub taskboard: Taskboard,
    pub mailer: Arc<RecordingMailer>,
    pub calendar: Arc<RecordingCalendar>,
    pub storage: Arc<MemoryStorage>,
}

impl Harness {
    pub async fn new() -> Result<Self, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;
        let mailer = Arc::new(RecordingMailer::default());
        let calendar = Arc::new(RecordingCalendar::default());
        let storage = Arc::new(MemoryStorage::default());
        let taskboard = Taskboard::new(
            db,
            Collaborators {
                mailer: mailer.clone(),
                calendar: calendar.clone(),
                storage: storage.clone(),
            },
            TaskboardSettings {
                calendar_sender: "calendar@taskboard.test".into(),
                ..Default::default()
            },
        );
        Ok(Self {
            taskboard,
            mailer,
            calendar,
            storage,
        })
    }

    /// Registers a user and returns the principal a login would produce.
    pub async fn user(&self, email: &str) -> AuthenticatedPrincipal {
        let user = self
            .taskboard
            .signup(email, "correct-horse")
            .await
            .unwrap_or_else(|err| panic!("signup {email}: {err}"));
        principal(&user)
    }
}

pub fn principal(user: &UserView) -> AuthenticatedPrincipal {
    AuthenticatedPrincipal::new(user.id, user.email.clone(), AuthMethod::Password)
}
