// src/services/autosave.rs

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::{sync::watch, task::JoinHandle};
use utoipa::ToSchema;

use crate::{common::error::SaveError, db::RecordStore};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);
// Quanto tempo o estado "saved" fica visível antes de voltar a "idle"
pub const SAVED_BADGE_DURATION: Duration = Duration::from_secs(2);

/// Salvamento customizado (substitui o upsert padrão).
#[async_trait]
pub trait SaveHandler<V>: Send + Sync {
    async fn save(&self, value: &V) -> Result<(), SaveError>;
}

pub type ErrorCallback = Arc<dyn Fn(&SaveError) + Send + Sync>;

pub struct AutoSaveConfig<V> {
    pub delay: Duration,
    pub enabled: bool,
    pub on_save: Option<Arc<dyn SaveHandler<V>>>,
    pub on_error: Option<ErrorCallback>,
}

impl<V> Default for AutoSaveConfig<V> {
    fn default() -> Self {
        Self { delay: DEFAULT_DELAY, enabled: true, on_save: None, on_error: None }
    }
}

impl<V> Clone for AutoSaveConfig<V> {
    fn clone(&self) -> Self {
        Self {
            delay: self.delay,
            enabled: self.enabled,
            on_save: self.on_save.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

/// Registro alvo: tabela + par chave/valor que o identifica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTarget {
    pub table: String,
    pub key_field: String,
    pub key_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SaveSnapshot {
    pub status: SaveStatus,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

// Estado compartilhado entre o coordenador, o timer e os saves em voo
struct Shared<V> {
    target: SaveTarget,
    config: AutoSaveConfig<V>,
    store: Arc<dyn RecordStore>,
    state: watch::Sender<SaveSnapshot>,
    latest_attempt: AtomicU64,
    revert_timer: Mutex<Option<JoinHandle<()>>>,
}

struct Editor<V> {
    last_value: V,
    pending: Option<JoinHandle<()>>,
}

pub struct AutoSave<V> {
    shared: Arc<Shared<V>>,
    editor: Mutex<Editor<V>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<V> AutoSave<V>
where
    V: Clone + PartialEq + Serialize + Send + Sync + 'static,
{
    /// O valor inicial vira a base de comparação e não é salvo.
    pub fn new(initial: V, target: SaveTarget, config: AutoSaveConfig<V>, store: Arc<dyn RecordStore>) -> Self {
        let (state, _) = watch::channel(SaveSnapshot::default());

        Self {
            shared: Arc::new(Shared {
                target,
                config,
                store,
                state,
                latest_attempt: AtomicU64::new(0),
                revert_timer: Mutex::new(None),
            }),
            editor: Mutex::new(Editor { last_value: initial, pending: None }),
        }
    }

    pub fn status(&self) -> SaveSnapshot {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveSnapshot> {
        self.shared.state.subscribe()
    }

    pub fn current_value(&self) -> V {
        lock(&self.editor).last_value.clone()
    }

    /// Registra uma edição. Valor igual ao anterior não faz nada; valor novo
    /// reinicia o debounce.
    pub fn update(&self, value: V) {
        let mut editor = lock(&self.editor);

        if editor.last_value == value {
            return;
        }
        editor.last_value = value.clone();

        if let Some(timer) = editor.pending.take() {
            timer.abort();
        }

        if !self.shared.should_save() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        let delay = shared.config.delay;

        editor.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Depois de disparar, o save segue sozinho: abortar o timer não o interrompe
            tokio::spawn(async move { shared.perform_save(value).await });
        }));
    }

    /// "Salvar agora": ignora o debounce e aguarda o resultado.
    pub async fn force_save(&self) -> SaveSnapshot {
        let value = {
            let mut editor = lock(&self.editor);
            if let Some(timer) = editor.pending.take() {
                timer.abort();
            }
            editor.last_value.clone()
        };

        if self.shared.should_save() {
            Arc::clone(&self.shared).perform_save(value).await;
        }
        self.status()
    }
}

impl<V> Drop for AutoSave<V> {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.editor).pending.take() {
            timer.abort();
        }
        if let Some(timer) = lock(&self.shared.revert_timer).take() {
            timer.abort();
        }
    }
}

impl<V> Shared<V>
where
    V: Clone + PartialEq + Serialize + Send + Sync + 'static,
{
    fn should_save(&self) -> bool {
        self.config.enabled && !self.target.key_value.is_empty()
    }

    async fn perform_save(self: Arc<Self>, value: V) {
        let attempt = self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(timer) = lock(&self.revert_timer).take() {
            timer.abort();
        }
        self.state.send_modify(|s| {
            s.status = SaveStatus::Saving;
            s.error = None;
        });

        let result = match &self.config.on_save {
            Some(handler) => handler.save(&value).await,
            None => self.upsert(&value).await,
        };

        if self.latest_attempt.load(Ordering::SeqCst) != attempt {
            tracing::debug!(
                "Discarding superseded save #{} for {}.{}={}",
                attempt,
                self.target.table,
                self.target.key_field,
                self.target.key_value
            );
            return;
        }

        match result {
            Ok(()) => {
                self.state.send_modify(|s| {
                    s.status = SaveStatus::Saved;
                    s.last_saved_at = Some(Utc::now());
                    s.error = None;
                });
                self.schedule_revert();
            }
            Err(err) => {
                tracing::error!(
                    "Auto-save to {} ({}={}) failed: {}",
                    self.target.table,
                    self.target.key_field,
                    self.target.key_value,
                    err
                );
                self.state.send_modify(|s| {
                    s.status = SaveStatus::Error;
                    s.error = Some(err.to_string());
                });
                if let Some(callback) = &self.config.on_error {
                    callback(&err);
                }
            }
        }
    }

    fn schedule_revert(self: &Arc<Self>) {
        let shared = Arc::clone(self);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(SAVED_BADGE_DURATION).await;
            shared.state.send_if_modified(|s| {
                if s.status == SaveStatus::Saved {
                    s.status = SaveStatus::Idle;
                    true
                } else {
                    false
                }
            });
        });
        *lock(&self.revert_timer) = Some(timer);
    }

    // Upsert por chave: existe -> update, senão insert
    async fn upsert(&self, value: &V) -> Result<(), SaveError> {
        let mut row = match serde_json::to_value(value)? {
            Value::Object(map) => map,
            other => {
                return Err(SaveError::Serialize(format!("expected a JSON object, got {}", json_kind(&other))));
            }
        };

        let SaveTarget { table, key_field, key_value } = &self.target;
        row.insert(key_field.clone(), Value::String(key_value.clone()));

        if self.store.exists(table, key_field, key_value).await? {
            self.store.update(table, key_field, key_value, &row).await?;
        } else {
            self.store.insert(table, &row).await?;
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::record_store::memory::MemoryRecordStore;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn target(key: &str) -> SaveTarget {
        SaveTarget {
            table: "consultation_vitals".into(),
            key_field: "consultation_id".into(),
            key_value: key.into(),
        }
    }

    fn coordinator(store: Arc<MemoryRecordStore>, config: AutoSaveConfig<Value>) -> AutoSave<Value> {
        AutoSave::new(json!({"pulse": 70}), target("c-1"), config, store)
    }

    #[tokio::test(start_paused = true)]
    async fn initial_value_is_not_saved() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        sleep(Duration::from_secs(10)).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(saver.status().status, SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_collapse_into_one_save_of_the_last_value() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        for pulse in [71, 72, 73] {
            saver.update(json!({"pulse": pulse}));
            sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(store.write_count(), 0);

        sleep(Duration::from_millis(1600)).await;
        assert_eq!(store.write_count(), 1);
        let row = store.row("consultation_vitals", "c-1").unwrap();
        assert_eq!(row["pulse"], json!(73));
        assert_eq!(row["consultation_id"], json!("c-1"));

        let snapshot = saver.status();
        assert_eq!(snapshot.status, SaveStatus::Saved);
        assert!(snapshot.last_saved_at.is_some());

        sleep(SAVED_BADGE_DURATION).await;
        assert_eq!(saver.status().status, SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_saving_then_saved() {
        let store = Arc::new(MemoryRecordStore { latency: Some(Duration::from_millis(300)), ..Default::default() });
        let saver = coordinator(store.clone(), AutoSaveConfig::default());
        let mut updates = saver.subscribe();

        saver.update(json!({"pulse": 74}));

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().status, SaveStatus::Saving);

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().status, SaveStatus::Saved);

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().status, SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_value_does_not_schedule_a_save() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        saver.update(json!({"pulse": 70}));
        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn force_save_skips_the_debounce_and_cancels_the_timer() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        saver.update(json!({"pulse": 90}));
        let snapshot = saver.force_save().await;
        assert_eq!(snapshot.status, SaveStatus::Saved);
        assert_eq!(store.write_count(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(saver.status().status, SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn first_save_inserts_then_later_saves_update() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        saver.update(json!({"pulse": 80}));
        saver.force_save().await;
        saver.update(json!({"pulse": 81}));
        saver.force_save().await;

        let kinds: Vec<String> = store.writes.lock().unwrap().iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(kinds, vec!["insert", "update"]);
        assert_eq!(store.row("consultation_vitals", "c-1").unwrap()["pulse"], json!(81));
    }

    #[tokio::test(start_paused = true)]
    async fn store_failure_is_captured_and_reported() {
        let store = Arc::new(MemoryRecordStore { fail_with: Some("connection reset".into()), ..Default::default() });
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let config = AutoSaveConfig {
            on_error: Some(Arc::new(move |_: &SaveError| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..AutoSaveConfig::default()
        };
        let saver = coordinator(store.clone(), config);

        saver.update(json!({"pulse": 99}));
        let snapshot = saver.force_save().await;

        assert_eq!(snapshot.status, SaveStatus::Error);
        assert!(snapshot.error.unwrap().contains("connection reset"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_or_keyless_coordinators_never_write() {
        let store = Arc::new(MemoryRecordStore::default());

        let disabled = coordinator(store.clone(), AutoSaveConfig { enabled: false, ..AutoSaveConfig::default() });
        disabled.update(json!({"pulse": 1}));
        disabled.force_save().await;

        let keyless = AutoSave::new(json!({}), target(""), AutoSaveConfig::default(), store.clone());
        keyless.update(json!({"pulse": 2}));
        keyless.force_save().await;

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(disabled.status().status, SaveStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_coordinator_cancels_the_pending_save() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = coordinator(store.clone(), AutoSaveConfig::default());

        saver.update(json!({"pulse": 60}));
        drop(saver);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn non_object_values_fail_to_serialize_into_a_row() {
        let store = Arc::new(MemoryRecordStore::default());
        let saver = AutoSave::new(json!(null), target("c-9"), AutoSaveConfig::default(), store.clone());

        saver.update(json!([1, 2, 3]));
        let snapshot = saver.force_save().await;
        assert_eq!(snapshot.status, SaveStatus::Error);
        assert!(snapshot.error.unwrap().contains("an array"));
    }

    struct ScriptedHandler {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SaveHandler<String> for ScriptedHandler {
        async fn save(&self, value: &String) -> Result<(), SaveError> {
            self.calls.lock().unwrap().push(value.clone());
            if value == "slow" {
                sleep(Duration::from_secs(5)).await;
                return Err(SaveError::Handler("timed out".into()));
            }
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_completion_is_discarded() {
        let handler = Arc::new(ScriptedHandler { calls: Mutex::new(Vec::new()) });
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();
        let config = AutoSaveConfig {
            on_save: Some(handler.clone() as Arc<dyn SaveHandler<String>>),
            on_error: Some(Arc::new(move |_: &SaveError| {
                seen.fetch_add(1, Ordering::SeqCst);
            })),
            ..AutoSaveConfig::default()
        };
        let store = Arc::new(MemoryRecordStore::default());
        let saver = AutoSave::new(String::new(), target("c-2"), config, store);

        // O save debounced começa e fica preso no handler lento
        saver.update("slow".to_string());
        sleep(DEFAULT_DELAY + Duration::from_millis(10)).await;
        assert_eq!(saver.status().status, SaveStatus::Saving);

        saver.update("fast".to_string());
        assert_eq!(saver.force_save().await.status, SaveStatus::Saved);

        sleep(Duration::from_secs(6)).await;
        assert_eq!(*handler.calls.lock().unwrap(), vec!["slow", "fast"]);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
        assert_ne!(saver.status().status, SaveStatus::Error);
    }
}
