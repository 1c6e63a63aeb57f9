//! Personal bookmark manager for self-made web apps
mod form;
mod screen;
pub(crate) use self::screen::WebAppsApp;
use crate::calendar::DateMarks;
use crate::datekey::DateKey;
use crate::storage::{load_json, save_json, KeyValueStore, Loaded, StorageError, APPS_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use time::macros::date;
use uuid::Uuid;

/// URLs longer than this many characters are shortened for display
const URL_DISPLAY_CHARS: usize = 40;

static NO_DESCRIPTION: &str = "No description.";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AppEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) url: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) created_at: DateKey,
    #[serde(default)]
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub(crate) memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) image: Option<String>,
}

impl AppEntry {
    pub(crate) fn display_url(&self) -> Cow<'_, str> {
        match self.url.char_indices().nth(URL_DISPLAY_CHARS) {
            Some((i, _)) => Cow::Owned(format!("{}...", &self.url[..i])),
            None => Cow::Borrowed(&self.url),
        }
    }

    pub(crate) fn display_description(&self) -> &str {
        if self.description.is_empty() {
            NO_DESCRIPTION
        } else {
            &self.description
        }
    }

    /// Case-insensitive substring match against the name or any tag.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    fn apply(&mut self, draft: AppDraft) {
        let AppDraft {
            name,
            url,
            description,
            created_at,
            tags,
            memo,
            image,
        } = draft;
        self.name = name;
        self.url = url;
        self.description = description;
        self.created_at = created_at;
        self.tags = tags;
        self.memo = memo;
        self.image = image;
    }
}

/// The user-editable fields of an [`AppEntry`], already validated
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct AppDraft {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) description: String,
    pub(crate) created_at: DateKey,
    pub(crate) tags: Vec<String>,
    pub(crate) memo: String,
    pub(crate) image: Option<String>,
}

/// All saved apps, newest additions first.  Unlike the medicine log, entries
/// are kept forever.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct AppCatalog {
    apps: Vec<AppEntry>,
    /// Set when the store could not be read; saving is refused so that the
    /// stored apps are not replaced
    unread: bool,
}

impl AppCatalog {
    /// Reads the catalog from `store`.  When nothing has been saved yet, the
    /// catalog is seeded with sample apps and the returned flag is `true` to
    /// tell the caller to save them.  Entries that do not decode are skipped
    /// one by one.  Data that is not a JSON array yields an empty catalog that
    /// is left alone in storage until the user changes something, and a store
    /// that fails to read yields an empty catalog that refuses to be saved.
    pub(crate) fn load<K: KeyValueStore + ?Sized>(store: &K) -> (AppCatalog, bool) {
        match load_json::<Vec<Value>, _>(store, APPS_KEY) {
            Loaded::Present(raw) => {
                let apps = raw
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, v)| match serde_json::from_value::<AppEntry>(v) {
                        Ok(app) => Some(app),
                        Err(e) => {
                            log::warn!("skipping stored app #{i}: {e}");
                            None
                        }
                    })
                    .collect();
                (AppCatalog { apps, unread: false }, false)
            }
            Loaded::Absent => {
                log::info!("no saved apps; seeding sample data");
                let apps = samples();
                (AppCatalog { apps, unread: false }, true)
            }
            Loaded::Malformed => (AppCatalog::default(), false),
            Loaded::Unavailable => (
                AppCatalog {
                    apps: Vec::new(),
                    unread: true,
                },
                false,
            ),
        }
    }

    pub(crate) fn save<K: KeyValueStore + ?Sized>(
        &self,
        store: &mut K,
    ) -> Result<(), StorageError> {
        if self.unread {
            return Err(StorageError::Unread {
                key: APPS_KEY.to_owned(),
            });
        }
        save_json(store, APPS_KEY, &self.apps)
    }

    /// Whether the stored apps could not be read and so will not be saved over
    pub(crate) fn is_unread(&self) -> bool {
        self.unread
    }

    pub(crate) fn apps(&self) -> &[AppEntry] {
        &self.apps
    }

    pub(crate) fn len(&self) -> usize {
        self.apps.len()
    }

    pub(crate) fn get(&self, id: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|a| a.id == id)
    }

    /// Adds a new app at the front of the catalog and returns its ID
    pub(crate) fn create(&mut self, draft: AppDraft) -> String {
        let id = Uuid::new_v4().to_string();
        let AppDraft {
            name,
            url,
            description,
            created_at,
            tags,
            memo,
            image,
        } = draft;
        let entry = AppEntry {
            id: id.clone(),
            name,
            url,
            description,
            created_at,
            tags,
            memo,
            image,
        };
        self.apps.insert(0, entry);
        id
    }

    /// Replaces the editable fields of the app with the given ID, keeping its
    /// ID and position.  Returns `false` if there is no such app.
    pub(crate) fn update(&mut self, id: &str, draft: AppDraft) -> bool {
        match self.apps.iter_mut().find(|a| a.id == id) {
            Some(entry) => {
                entry.apply(draft);
                true
            }
            None => false,
        }
    }

    pub(crate) fn delete(&mut self, id: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|a| a.id != id);
        self.apps.len() < before
    }
}

impl DateMarks for AppCatalog {
    fn has_record(&self, day: DateKey) -> bool {
        self.apps.iter().any(|a| a.created_at == day)
    }
}

/// Returns the apps whose name or tags contain `search` (ignoring case) and,
/// if `date_filter` is set, that were created on that day.  Input order is
/// preserved.
pub(crate) fn filter_apps<'a>(
    apps: &'a [AppEntry],
    search: &str,
    date_filter: Option<DateKey>,
) -> Vec<&'a AppEntry> {
    let needle = search.to_lowercase();
    apps.iter()
        .filter(|a| a.matches(&needle))
        .filter(|a| date_filter.map_or(true, |d| a.created_at == d))
        .collect()
}

fn samples() -> Vec<AppEntry> {
    let Ok(created_at) = DateKey::new(date!(2026 - 01 - 29)) else {
        return Vec::new();
    };
    vec![
        AppEntry {
            id: String::from("uuid1"),
            name: String::from("薬確認アプリ"),
            url: String::from("https://example.com/pillcheck"),
            description: String::from("高齢者向け、薬飲んだか確認アプリ"),
            created_at,
            tags: vec![
                String::from("健康"),
                String::from("簡単"),
                String::from("1ボタン"),
            ],
            memo: String::from(
                "UIはシンプル、ボタン1つのみ。大きなフォントで見やすく設計しました。",
            ),
            image: None,
        },
        AppEntry {
            id: String::from("uuid2"),
            name: String::from("まとめアプリ"),
            url: String::from("https://example.com/myapps"),
            description: String::from("作ったWebアプリをまとめるアプリ"),
            created_at,
            tags: vec![
                String::from("管理"),
                String::from("カード"),
                String::from("個人用"),
            ],
            memo: String::from(
                "ローカル保存、検索・タグ対応。localStorageを使用してブラウザのみで完結させました。",
            ),
            image: None,
        },
    ]
}
