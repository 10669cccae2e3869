#![allow(dead_code)]
// Shared test fixtures — a scriptable CharacterSource with completion gates.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use rm_catalog_engine::source::traits::{
    Character, CharacterPage, CharacterSource, Criteria, PageInfo,
};

pub fn character(id: &str, name: &str) -> Character {
    Character {
        id: id.to_string(),
        name: name.to_string(),
        image: format!("https://example.com/{id}.jpeg"),
        status: None,
        species: None,
        gender: None,
        origin: None,
    }
}

pub fn page(results: Vec<Character>, next: Option<u32>) -> CharacterPage {
    CharacterPage {
        info: PageInfo {
            count: results.len() as u32,
            pages: 1,
            next,
            prev: None,
        },
        results,
    }
}

pub fn ids(entries: &[Character]) -> Vec<String> {
    entries.iter().map(|c| c.id.clone()).collect()
}

/// A scripted response: either a payload or an error message.
#[derive(Clone)]
pub enum Scripted<T> {
    Ok(T),
    Err(String),
}

impl<T> Scripted<T> {
    fn into_result(self) -> Result<T> {
        match self {
            Scripted::Ok(value) => Ok(value),
            Scripted::Err(msg) => Err(anyhow!(msg)),
        }
    }
}

struct PageScript {
    response: Scripted<CharacterPage>,
    gate: Option<Arc<Notify>>,
}

#[derive(Clone)]
struct IdScript {
    response: Scripted<Option<Character>>,
    gate: Option<Arc<Notify>>,
}

/// Test source: page fetches consume scripts in dispatch order, by-id
/// lookups are scripted per identifier. A gated script does not complete
/// until its `Notify` fires, which lets tests fix completion order.
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<VecDeque<PageScript>>,
    by_id: Mutex<HashMap<String, IdScript>>,
    page_calls: Mutex<Vec<(Criteria, u32)>>,
    id_calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, response: Scripted<CharacterPage>) {
        self.pages.lock().push_back(PageScript {
            response,
            gate: None,
        });
    }

    pub fn push_gated_page(&self, response: Scripted<CharacterPage>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.pages.lock().push_back(PageScript {
            response,
            gate: Some(gate.clone()),
        });
        gate
    }

    pub fn script_id(&self, id: &str, response: Scripted<Option<Character>>) {
        self.by_id.lock().insert(
            id.to_string(),
            IdScript {
                response,
                gate: None,
            },
        );
    }

    pub fn script_gated_id(&self, id: &str, response: Scripted<Option<Character>>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.by_id.lock().insert(
            id.to_string(),
            IdScript {
                response,
                gate: Some(gate.clone()),
            },
        );
        gate
    }

    /// Every `(criteria, page)` pair issued so far, in dispatch order.
    pub fn page_calls(&self) -> Vec<(Criteria, u32)> {
        self.page_calls.lock().clone()
    }

    pub fn id_call_count(&self) -> usize {
        self.id_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CharacterSource for ScriptedSource {
    async fn fetch_page(&self, criteria: &Criteria, page: u32) -> Result<CharacterPage> {
        self.page_calls.lock().push((criteria.clone(), page));
        let script = self
            .pages
            .lock()
            .pop_front()
            .expect("fetch_page called with no script queued");
        if let Some(gate) = script.gate {
            gate.notified().await;
        }
        script.response.into_result()
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Character>> {
        self.id_calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .by_id
            .lock()
            .get(id)
            .cloned()
            .unwrap_or_else(|| panic!("fetch_by_id called with unscripted id {id}"));
        if let Some(gate) = script.gate {
            gate.notified().await;
        }
        script.response.into_result()
    }
}
