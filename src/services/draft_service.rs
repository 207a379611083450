// src/services/draft_service.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
    time::Duration,
};

use serde_json::{Map, Value};
use tokio::{task::JoinHandle, time::Instant};

use crate::{
    common::error::AppError,
    db::RecordStore,
    models::draft::{ConsultationSection, DraftState, DRAFT_KEY_FIELD},
    services::autosave::{AutoSave, AutoSaveConfig, SaveStatus, SaveTarget},
};

// Rascunho sem edição por esse tempo conta como formulário fechado
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

type DraftKey = (ConsultationSection, String);
type DraftMap = HashMap<DraftKey, OpenDraft>;

struct OpenDraft {
    saver: Arc<AutoSave<Value>>,
    last_touched: Instant,
}

/// Um auto-save por (seção, consulta), vivo enquanto o formulário estiver aberto.
#[derive(Clone)]
pub struct DraftRegistry {
    store: Arc<dyn RecordStore>,
    config: AutoSaveConfig<Value>,
    idle_ttl: Duration,
    drafts: Arc<Mutex<DraftMap>>,
}

fn lock_drafts(drafts: &Mutex<DraftMap>) -> MutexGuard<'_, DraftMap> {
    drafts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Remove os rascunhos parados há mais de `ttl`. Um save em voo segura o
// rascunho até terminar.
fn evict_idle(drafts: &Mutex<DraftMap>, ttl: Duration, now: Instant) -> usize {
    let mut drafts = lock_drafts(drafts);
    let before = drafts.len();

    drafts.retain(|(section, id), draft| {
        let status = draft.saver.status().status;
        let keep = status == SaveStatus::Saving || now.duration_since(draft.last_touched) < ttl;
        if !keep {
            if status == SaveStatus::Error {
                tracing::warn!("Dropping idle {:?} draft for consultation {} with unsaved changes", section, id);
            } else {
                tracing::debug!("Closing idle {:?} draft for consultation {}", section, id);
            }
        }
        keep
    });

    before - drafts.len()
}

impl DraftRegistry {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, AutoSaveConfig::default())
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: AutoSaveConfig<Value>) -> Self {
        Self { store, config, idle_ttl: DEFAULT_IDLE_TTL, drafts: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Varredura periódica dos rascunhos abandonados. Termina sozinha quando
    /// o registro deixa de existir.
    pub fn spawn_idle_sweeper(&self) -> JoinHandle<()> {
        let drafts: Weak<Mutex<DraftMap>> = Arc::downgrade(&self.drafts);
        let ttl = self.idle_ttl;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval((ttl / 2).max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                let Some(drafts) = drafts.upgrade() else { break };
                let evicted = evict_idle(&drafts, ttl, Instant::now());
                if evicted > 0 {
                    tracing::info!("Closed {} idle draft(s)", evicted);
                }
            }
        })
    }

    fn drafts(&self) -> MutexGuard<'_, DraftMap> {
        lock_drafts(&self.drafts)
    }

    fn get(&self, section: ConsultationSection, consultation_id: &str) -> Option<Arc<AutoSave<Value>>> {
        self.drafts().get(&(section, consultation_id.to_string())).map(|d| Arc::clone(&d.saver))
    }

    fn touch(&self, section: ConsultationSection, consultation_id: &str) {
        if let Some(draft) = self.drafts().get_mut(&(section, consultation_id.to_string())) {
            draft.last_touched = Instant::now();
        }
    }

    fn state_of(section: ConsultationSection, consultation_id: &str, draft: &AutoSave<Value>) -> DraftState {
        DraftState {
            section,
            consultation_id: consultation_id.to_string(),
            value: draft.current_value(),
            snapshot: draft.status(),
        }
    }

    /// Recebe o valor atual do formulário; o save acontece após o debounce.
    pub fn feed(
        &self,
        section: ConsultationSection,
        consultation_id: &str,
        value: Value,
    ) -> Result<DraftState, AppError> {
        if consultation_id.trim().is_empty() {
            return Err(AppError::InvalidInput("Consultation id is required.".into()));
        }
        if !value.is_object() {
            return Err(AppError::InvalidInput("Draft body must be a JSON object.".into()));
        }

        let now = Instant::now();
        evict_idle(&self.drafts, self.idle_ttl, now);

        let draft = {
            let mut drafts = self.drafts();
            let entry = drafts.entry((section, consultation_id.to_string())).or_insert_with(|| {
                tracing::debug!("Opening {:?} draft for consultation {}", section, consultation_id);
                // Base vazia: o primeiro valor recebido já conta como edição
                OpenDraft {
                    saver: Arc::new(AutoSave::new(
                        Value::Object(Map::new()),
                        SaveTarget {
                            table: section.table().to_string(),
                            key_field: DRAFT_KEY_FIELD.to_string(),
                            key_value: consultation_id.to_string(),
                        },
                        self.config.clone(),
                        Arc::clone(&self.store),
                    )),
                    last_touched: now,
                }
            });
            entry.last_touched = now;
            Arc::clone(&entry.saver)
        };

        draft.update(value);
        Ok(Self::state_of(section, consultation_id, &draft))
    }

    pub fn snapshot(&self, section: ConsultationSection, consultation_id: &str) -> Option<DraftState> {
        self.get(section, consultation_id)
            .map(|draft| Self::state_of(section, consultation_id, &draft))
    }

    /// "Salvar agora" para um rascunho aberto.
    pub async fn save_now(&self, section: ConsultationSection, consultation_id: &str) -> Option<DraftState> {
        let draft = self.get(section, consultation_id)?;
        self.touch(section, consultation_id);
        draft.force_save().await;
        Some(Self::state_of(section, consultation_id, &draft))
    }

    /// Fecha o rascunho; um save pendente é cancelado.
    pub fn discard(&self, section: ConsultationSection, consultation_id: &str) -> bool {
        self.drafts().remove(&(section, consultation_id.to_string())).is_some()
    }

    pub fn open_drafts(&self) -> usize {
        self.drafts().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::record_store::memory::MemoryRecordStore, services::autosave::SaveStatus};
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::sleep;

    fn registry() -> (DraftRegistry, Arc<MemoryRecordStore>) {
        let store = Arc::new(MemoryRecordStore::default());
        (DraftRegistry::new(store.clone()), store)
    }

    #[tokio::test(start_paused = true)]
    async fn fed_values_are_saved_into_the_section_table() {
        let (drafts, store) = registry();

        let state = drafts.feed(ConsultationSection::Vitals, "c-10", json!({"pulse": 72})).unwrap();
        assert_eq!(state.snapshot.status, SaveStatus::Idle);

        sleep(Duration::from_millis(2100)).await;

        let row = store.row("consultation_vitals", "c-10").unwrap();
        assert_eq!(row["pulse"], json!(72));
        assert_eq!(row["consultation_id"], json!("c-10"));

        let state = drafts.snapshot(ConsultationSection::Vitals, "c-10").unwrap();
        assert_eq!(state.snapshot.status, SaveStatus::Saved);
        assert_eq!(state.value, json!({"pulse": 72}));
    }

    #[tokio::test(start_paused = true)]
    async fn sections_of_one_consultation_are_independent() {
        let (drafts, store) = registry();

        drafts.feed(ConsultationSection::Diagnosis, "c-11", json!({"primary": "J06.9"})).unwrap();
        drafts.feed(ConsultationSection::TreatmentPlan, "c-11", json!({"advice": "rest"})).unwrap();
        assert_eq!(drafts.open_drafts(), 2);

        let saved = drafts.save_now(ConsultationSection::Diagnosis, "c-11").await.unwrap();
        assert_eq!(saved.snapshot.status, SaveStatus::Saved);
        assert!(store.row("consultation_diagnoses", "c-11").is_some());
        assert!(store.row("consultation_treatment_plans", "c-11").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn discarding_cancels_the_pending_save() {
        let (drafts, store) = registry();

        drafts.feed(ConsultationSection::History, "c-12", json!({"notes": "x"})).unwrap();
        assert!(drafts.discard(ConsultationSection::History, "c-12"));
        assert!(!drafts.discard(ConsultationSection::History, "c-12"));

        sleep(Duration::from_secs(5)).await;
        assert_eq!(store.write_count(), 0);
        assert!(drafts.snapshot(ConsultationSection::History, "c-12").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_drafts_are_closed_after_the_idle_ttl() {
        let store = Arc::new(MemoryRecordStore::default());
        let drafts = DraftRegistry::new(store.clone()).with_idle_ttl(Duration::from_secs(60));
        let _sweeper = drafts.spawn_idle_sweeper();

        drafts.feed(ConsultationSection::Vitals, "c-20", json!({"pulse": 80})).unwrap();
        sleep(Duration::from_secs(40)).await;
        drafts.feed(ConsultationSection::Vitals, "c-21", json!({"pulse": 66})).unwrap();
        assert_eq!(drafts.open_drafts(), 2);

        sleep(Duration::from_secs(45)).await;

        // c-20 parado há 85s sai; c-21 (45s) continua aberto
        assert_eq!(drafts.open_drafts(), 1);
        assert!(drafts.snapshot(ConsultationSection::Vitals, "c-20").is_none());
        assert!(drafts.snapshot(ConsultationSection::Vitals, "c-21").is_some());

        // O que já tinha sido salvo continua no banco
        assert_eq!(store.row("consultation_vitals", "c-20").unwrap()["pulse"], json!(80));

        sleep(Duration::from_secs(60)).await;
        assert_eq!(drafts.open_drafts(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn feeding_keeps_a_draft_open() {
        let (drafts, _) = registry();
        let drafts = drafts.with_idle_ttl(Duration::from_secs(60));

        for pulse in 70..75 {
            drafts.feed(ConsultationSection::Vitals, "c-22", json!({"pulse": pulse})).unwrap();
            sleep(Duration::from_secs(50)).await;
        }

        // Um feed novo poda o que venceu, mas este rascunho segue ativo
        drafts.feed(ConsultationSection::History, "c-23", json!({"notes": "ok"})).unwrap();
        assert!(drafts.snapshot(ConsultationSection::Vitals, "c-22").is_some());
    }

    #[tokio::test]
    async fn rejects_non_object_bodies_and_blank_ids() {
        let (drafts, _) = registry();

        assert!(matches!(
            drafts.feed(ConsultationSection::Vitals, "c-13", json!([1])),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            drafts.feed(ConsultationSection::Vitals, " ", json!({})),
            Err(AppError::InvalidInput(_))
        ));
        assert!(drafts.save_now(ConsultationSection::Vitals, "missing").await.is_none());
    }
}
